//! Document model types.
//!
//! This module defines the validated, strongly-typed document tree that the
//! renderers consume. Instances are produced by [`crate::schema::validate`]
//! from untrusted JSON; every renderer may assume the invariants documented
//! on these types hold.

mod block;
mod document;
mod inline;
mod tags;

pub use block::{Block, Heading, Image, List, ListItem, ListKind, Paragraph};
pub use document::{Align, Document, Grid, Section, TopLevel, DEFAULT_LANGUAGE};
pub use inline::{Inline, Link, Mark, MarkSet};
pub use tags::{TagData, TagValue, Tags};
