//! Exit codes for CLI operations

/// General error - unspecified failure, invalid arguments
pub const ERROR: i32 = 1;

/// Decode error - a manifest is not a valid object of its declared kind
pub const DECODE_ERROR: i32 = 2;

/// Conflict error - two resources claimed the same values path
pub const CONFLICT_ERROR: i32 = 3;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 4;
