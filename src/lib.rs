//! avx: command-line client for the Aviatrix controller API
//!
//! Logs in to obtain a session token (CID), issues arbitrary RPC calls, and
//! exports generated Terraform configuration.
//!
//! Layers, innermost first: `domain` (entities, request building),
//! `application` (services), `infrastructure` (HTTP and filesystem
//! boundaries, DI), `cli` (arguments, dispatch, output).

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
