//! Accessibility-tree model for web agents.
//!
//! Raw browser observations become an arena-backed tree that can be cleaned,
//! queried and rendered as Markdown, while a session records what the agent
//! did. The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (numbering, cleaning, queries,
//!   rendering, detaching). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (observation files, config,
//!   trajectory logs) and the [`io::env::Environment`] seam.
//!
//! [`session`] coordinates both to implement one agent session.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod tree;
