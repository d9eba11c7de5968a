//! Internal domain modules for the RetroNotes core library.
//!
//! All public types from these modules are re-exported at the crate root
//! with `#[doc(inline)]`; import from there in preference to this module.

pub mod clock;
pub mod config;
pub mod delete;
pub mod error;
pub mod export;
pub mod graph;
pub mod ids;
pub mod links;
pub mod note;
pub mod preferences;
pub mod query;
pub mod revision;
pub mod storage;
pub mod store;
pub mod tags;
pub mod tree;
