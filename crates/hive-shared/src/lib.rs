//! # hive-shared
//!
//! Types shared by the DesignHive store and server crates: identifier
//! newtypes, workspace-wide constants, and the tag model used by the
//! recommendation matcher.

pub mod constants;
pub mod tags;
pub mod types;

pub use tags::{normalize_tag, PostTags, PreferenceSet};
pub use types::{CommentId, PostId};
