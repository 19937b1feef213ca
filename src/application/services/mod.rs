//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, HttpTransport)
//! but are themselves concrete structs, not traits.

mod export;
mod rpc;
mod session;

pub use export::{unpack_archive, ExportService};
pub use rpc::{request_body_pretty, RawReply, RpcResponse, RpcService};
pub use session::SessionService;
