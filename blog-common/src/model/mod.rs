pub mod comment;
pub mod post;
pub mod tag;
pub mod user;

use crate::model::{post::InvalidSlugError, user::InvalidUsernameError};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, marker::PhantomData};
use thiserror::Error;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum ModelValidationError {
    #[error(transparent)]
    Slug(#[from] InvalidSlugError),
    #[error(transparent)]
    Username(#[from] InvalidUsernameError),
    #[error(transparent)]
    Count(#[from] NegativeCountError),
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("A derived count was negative: {0}")]
pub struct NegativeCountError(pub i64);

/// Converts a count as returned by `COUNT(*)` into the unsigned form the model carries.
pub fn count_from_db(count: i64) -> Result<u64, NegativeCountError> {
    u64::try_from(count).map_err(|_| NegativeCountError(count))
}

#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Id<Marker>(u64, #[serde(skip)] PhantomData<Marker>);

impl<Marker> Id<Marker> {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id, PhantomData)
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl<Marker> Display for Id<Marker> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<Marker> From<u64> for Id<Marker> {
    fn from(value: u64) -> Self {
        Id::new(value)
    }
}

impl<Marker> From<Id<Marker>> for u64 {
    fn from(value: Id<Marker>) -> Self {
        value.get()
    }
}
