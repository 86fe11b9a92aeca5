//! Client-side tooling for the ballot ledger service: the election roll file
//! format, the HTTP wire types and a typed HTTP client.

pub mod api;
pub mod cli_types;
pub mod client;
pub mod election;
pub mod utils;

pub use api::*;
pub use client::*;
pub use election::*;
