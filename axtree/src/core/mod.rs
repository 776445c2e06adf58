//! Deterministic, pure logic over accessibility trees.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! trees and return deterministic outputs suitable for tests.

pub mod clean;
pub mod detach;
pub mod error;
pub mod invariants;
pub mod markdown;
pub mod matcher;
pub mod numbering;
pub mod path;
pub mod query;
pub mod time;
pub mod types;
