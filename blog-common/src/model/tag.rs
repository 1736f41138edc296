use crate::model::Id;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct TagMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Tag {
    pub id: Id<TagMarker>,
    pub title: String,
    /// Number of posts currently carrying this tag.
    pub posts_with_tag: u64,
}
