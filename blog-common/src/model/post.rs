use crate::model::{Id, tag::Tag, user::User};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use std::fmt::Display;
use thiserror::Error;
use time::OffsetDateTime;

pub const SLUG_MAX_LEN: usize = 200;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

/// A post with its author and tags attached and its derived counts filled in.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub title: String,
    pub text: String,
    pub slug: Slug,
    pub author: User,
    pub published_at: OffsetDateTime,
    /// Path of the uploaded image relative to the media root.
    pub image: Option<String>,
    /// Ordered by title.
    pub tags: Vec<Tag>,
    pub likes_amount: u64,
    pub comments_amount: u64,
}

impl Post {
    #[must_use]
    pub fn first_tag(&self) -> Option<&Tag> {
        self.tags.first()
    }
}

/// URL-safe, unique identifier of a post.
///
/// Only ASCII letters, digits, `-` and `_`, at most [`SLUG_MAX_LEN`] characters.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct Slug(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The slug is invalid: {0:?}")]
pub struct InvalidSlugError(String);

impl Slug {
    pub fn new(slug: String) -> Result<Self, InvalidSlugError> {
        let valid_chars = slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if !slug.is_empty() && slug.len() <= SLUG_MAX_LEN && valid_chars {
            Ok(Slug(slug))
        } else {
            Err(InvalidSlugError(slug))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for Slug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<'de> Deserialize<'de> for Slug {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        Slug::new(inner).map_err(|err| Error::invalid_value(Unexpected::Str(&err.0), &"Slug"))
    }
}

#[cfg(test)]
mod tests {
    use crate::model::post::{SLUG_MAX_LEN, Slug};

    #[test]
    fn legal_slugs() {
        let legal = ["hello", "hello-world", "post_2024", "A-b_C-9"];
        let illegal = ["", "with space", "привет", "slash/inside", "dot.ted", "q?x=1"];

        for slug in legal {
            assert!(Slug::new(slug.to_owned()).is_ok(), "{slug:?} should be legal");
        }
        for slug in illegal {
            assert!(Slug::new(slug.to_owned()).is_err(), "{slug:?} should be illegal");
        }

        assert!(Slug::new("a".repeat(SLUG_MAX_LEN)).is_ok());
        assert!(Slug::new("a".repeat(SLUG_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn deserialize_validates() {
        let slug: Slug = serde_json::from_str("\"hello-world\"").unwrap();
        assert_eq!(slug.get(), "hello-world");

        assert!(serde_json::from_str::<Slug>("\"not a slug\"").is_err());
    }
}
