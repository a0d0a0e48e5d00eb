//! HAR (HTTP Archive) import.
//!
//! A HAR exported from the browser's network panel is replayed through the
//! request aggregator exactly as live traffic would be, so the same
//! classification and filtering decide what becomes a link.

mod parse;
mod replay;

pub use parse::{load, HarEntry, HarHeader, HarLog, HarRequest, HarResponse};
pub use replay::{observations, replay};
