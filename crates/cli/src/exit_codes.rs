//! CLI exit codes.
//!
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                            |
//! |------|----------------------------------------------------|
//! | 0    | Success                                            |
//! | 1    | Runtime error (catalog I/O, remote, missing preset) |
//! | 2    | Usage error (bad arguments, unusable bounds)       |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Runtime error - the command was well-formed but could not complete.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing or contradictory options.
/// Matches clap's own exit code for argument errors.
pub const EXIT_USAGE: u8 = 2;
