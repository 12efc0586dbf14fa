//! Post tag model and preference matching.
//!
//! A post carries five free-text tag lists plus an optional skill level.
//! Recommendation works on the *tag union*: every label from every category,
//! trimmed and lower-cased, with blanks dropped. A user's preferences are
//! normalized the same way, and a post qualifies when the two sets share at
//! least one element.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::TAG_CATEGORIES;

/// Categorical labels attached to a post. Free text; no fixed vocabulary.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PostTags {
    #[serde(deserialize_with = "null_as_empty")]
    pub design_disciplines: Vec<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub design_process: Vec<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub tools: Vec<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub learning_goals: Vec<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub competition_involvement: Vec<String>,
    pub skill_level: Option<String>,
}

impl PostTags {
    /// The five list categories paired with their wire names.
    pub fn categories(&self) -> impl Iterator<Item = (&'static str, &[String])> {
        TAG_CATEGORIES.into_iter().zip([
            self.design_disciplines.as_slice(),
            self.design_process.as_slice(),
            self.tools.as_slice(),
            self.learning_goals.as_slice(),
            self.competition_involvement.as_slice(),
        ])
    }

    /// Lower-cased union of every category plus the skill level.
    pub fn union(&self) -> HashSet<String> {
        self.categories()
            .flat_map(|(_, tags)| tags.iter())
            .chain(self.skill_level.iter())
            .filter_map(|t| normalize_tag(t))
            .collect()
    }
}

/// A user's declared preferences, normalized for matching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferenceSet(HashSet<String>);

impl PreferenceSet {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            tags.into_iter()
                .filter_map(|t| normalize_tag(t.as_ref()))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct tags shared with the post.
    pub fn overlap(&self, tags: &PostTags) -> usize {
        tags.union().intersection(&self.0).count()
    }

    /// Any-overlap qualification used by the recommendation matcher.
    pub fn matches(&self, tags: &PostTags) -> bool {
        !self.0.is_empty() && self.overlap(tags) > 0
    }
}

/// Trim and lower-case a tag. Blank tags normalize to `None`.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Clients send `null` for empty lists; treat it like an absent field.
pub fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
