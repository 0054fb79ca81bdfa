//! Process exit codes. Part of the CLI contract.

pub const SUCCESS: i32 = 0;
/// Sweep finished but some records carry an `[ERROR]` answer.
pub const UNIT_FAILURES: i32 = 1;
/// Bad config, missing or unreadable input, unwritable output.
pub const CONFIG_ERROR: i32 = 2;
/// A metric failed; no metrics file was written.
pub const SCORING_FAILED: i32 = 3;
