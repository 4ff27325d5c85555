//! Common utilities for nbdeck.
//!
//! This crate provides shared infrastructure used by all nbdeck components:
//! - **Diagnostics** - deduplicated warnings and verbose status lines on stderr

pub mod warning;
