//! Motion capture file codec for kinefit.
//!
//! Reads and writes the standard hierarchy-plus-frames text format:
//! [`parse_file`]/[`parse_string`] build a fresh [`MotionFile`] (skeleton
//! and pose track together), [`write_file`]/[`write_string`] render one
//! back out. Channel rotation orders are preserved per joint; a header
//! naming an unknown rotation triple is a parse error rather than a
//! silent default.

pub mod error;
pub mod reader;
pub mod writer;

pub use error::BvhError;
pub use reader::{parse_file, parse_string, MotionFile};
pub use writer::{write_file, write_string};
