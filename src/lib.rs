// src/lib.rs
//
// Aggregates a user's activity across one or more GitLab instances and
// replays it as empty, backdated commits in a fresh local repository.
// The pipeline runs strictly one direction: client fetch → export cache →
// dedup → normalize → merge → replay.

pub mod cache;
pub mod cli;
pub mod client;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod replay;
pub mod timeline;

pub use error::{Error, Result};
