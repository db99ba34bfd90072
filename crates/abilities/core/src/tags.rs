//! Hierarchical gameplay tags.
//!
//! Tags are dot-separated labels (`Ability.Fire.Fireball`). A tag *matches*
//! a query when it equals the query or is one of its descendants, so an
//! agent holding `State.Stunned.Hard` answers yes to `State.Stunned`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A single hierarchical label.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Tag(String);

impl Tag {
    pub const SEPARATOR: char = '.';

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An empty tag never matches anything and is treated as "no tag".
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
    }

    /// Returns true if `self` equals `query` or is a descendant of it.
    pub fn matches(&self, query: &Tag) -> bool {
        if !self.is_valid() || !query.is_valid() {
            return false;
        }
        match self.0.strip_prefix(query.as_str()) {
            Some("") => true,
            Some(rest) => rest.starts_with(Self::SEPARATOR),
            None => false,
        }
    }

    /// Direct parent of this tag, if any.
    pub fn parent(&self) -> Option<Tag> {
        self.0
            .rsplit_once(Self::SEPARATOR)
            .map(|(parent, _)| Tag::new(parent))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Tag {
    fn from(value: &str) -> Self {
        Tag::new(value)
    }
}

/// An ordered set of tags with hierarchical queries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TagContainer {
    tags: BTreeSet<Tag>,
}

impl TagContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: Tag) -> bool {
        tag.is_valid() && self.tags.insert(tag)
    }

    pub fn remove(&mut self, tag: &Tag) -> bool {
        self.tags.remove(tag)
    }

    /// Appends every tag of `other` (set union).
    pub fn append(&mut self, other: &TagContainer) {
        self.tags.extend(other.tags.iter().cloned());
    }

    /// Builder-style insert.
    pub fn with(mut self, tag: impl Into<Tag>) -> Self {
        self.insert(tag.into());
        self
    }

    /// Returns a new container holding the union of both sets.
    pub fn union(&self, other: &TagContainer) -> TagContainer {
        let mut merged = self.clone();
        merged.append(other);
        merged
    }

    /// True if any tag in the container matches `query` hierarchically.
    pub fn has_tag(&self, query: &Tag) -> bool {
        self.tags.iter().any(|tag| tag.matches(query))
    }

    /// True if at least one query tag is matched. Empty query → false.
    pub fn has_any(&self, query: &TagContainer) -> bool {
        query.iter().any(|tag| self.has_tag(tag))
    }

    /// True if every query tag is matched. Empty query → true.
    pub fn has_all(&self, query: &TagContainer) -> bool {
        query.iter().all(|tag| self.has_tag(tag))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl FromIterator<Tag> for TagContainer {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        let mut container = TagContainer::new();
        for tag in iter {
            container.insert(tag);
        }
        container
    }
}

impl<'a> FromIterator<&'a str> for TagContainer {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().map(Tag::new).collect()
    }
}

/// Reference-counted tag set representing the tags an agent currently holds.
///
/// Several live effects may grant the same tag; the tag stays applied until
/// every grant has been withdrawn.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagCountContainer {
    counts: BTreeMap<Tag, u32>,
}

impl TagCountContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, tag: &Tag) {
        if tag.is_valid() {
            *self.counts.entry(tag.clone()).or_insert(0) += 1;
        }
    }

    pub fn add_all(&mut self, tags: &TagContainer) {
        for tag in tags.iter() {
            self.add(tag);
        }
    }

    /// Withdraws one grant of `tag`. Withdrawing an absent tag is a no-op.
    pub fn remove(&mut self, tag: &Tag) {
        if let Some(count) = self.counts.get_mut(tag) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(tag);
            }
        }
    }

    pub fn remove_all(&mut self, tags: &TagContainer) {
        for tag in tags.iter() {
            self.remove(tag);
        }
    }

    pub fn count(&self, tag: &Tag) -> u32 {
        self.counts.get(tag).copied().unwrap_or(0)
    }

    pub fn has_tag(&self, query: &Tag) -> bool {
        self.counts.keys().any(|tag| tag.matches(query))
    }

    pub fn has_any(&self, query: &TagContainer) -> bool {
        query.iter().any(|tag| self.has_tag(tag))
    }

    pub fn has_all(&self, query: &TagContainer) -> bool {
        query.iter().all(|tag| self.has_tag(tag))
    }

    /// Flattened view of every tag currently applied.
    pub fn to_container(&self) -> TagContainer {
        self.counts.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_tags_match_their_parents() {
        let tag = Tag::new("State.Stunned.Hard");
        assert!(tag.matches(&Tag::new("State.Stunned")));
        assert!(tag.matches(&Tag::new("State")));
        assert!(tag.matches(&Tag::new("State.Stunned.Hard")));
        assert!(!tag.matches(&Tag::new("State.Stun")));
        assert!(!Tag::new("State").matches(&tag));
        assert_eq!(tag.parent(), Some(Tag::new("State.Stunned")));
    }

    #[test]
    fn empty_tags_never_match() {
        let empty = Tag::new("");
        assert!(!empty.matches(&empty));
        let mut container = TagContainer::new();
        assert!(!container.insert(empty));
        assert!(container.is_empty());
    }

    #[test]
    fn container_queries_are_hierarchical() {
        let container: TagContainer = ["Ability.Fire.Bolt", "State.Casting"].into_iter().collect();
        assert!(container.has_tag(&Tag::new("Ability.Fire")));
        assert!(container.has_any(&["Ability.Ice", "State"].into_iter().collect()));
        assert!(!container.has_all(&["Ability.Ice", "State"].into_iter().collect()));
        assert!(container.has_all(&TagContainer::new()));
        assert!(!container.has_any(&TagContainer::new()));
    }

    #[test]
    fn counted_tags_survive_until_last_grant_is_withdrawn() {
        let stun = Tag::new("State.Stunned");
        let mut applied = TagCountContainer::new();
        applied.add(&stun);
        applied.add(&stun);
        applied.remove(&stun);
        assert!(applied.has_tag(&stun));
        applied.remove(&stun);
        assert!(!applied.has_tag(&stun));
        applied.remove(&stun);
        assert_eq!(applied.count(&stun), 0);
    }
}
