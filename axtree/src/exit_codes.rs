//! Stable exit codes for axtree CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid input, config or tree, or any other failure.
pub const INVALID: i32 = 1;
/// `axtree find` matched nothing.
pub const NOT_FOUND: i32 = 2;
