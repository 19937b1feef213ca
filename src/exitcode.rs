//! Standard exit codes (BSD sysexits.h compatible)

/// Command line usage error (including malformed `key=value` parameters)
pub const USAGE: i32 = 64;

/// Data format error (undecodable response or archive)
pub const DATAERR: i32 = 65;

/// Controller unreachable
pub const UNAVAILABLE: i32 = 69;

/// Can't create output file
pub const CANTCREAT: i32 = 73;

/// Input/output error
pub const IOERR: i32 = 74;

/// Remote error in protocol (controller rejected the call)
pub const PROTOCOL: i32 = 76;

/// Permission denied (login rejected)
pub const NOPERM: i32 = 77;

/// Configuration error
pub const CONFIG: i32 = 78;
