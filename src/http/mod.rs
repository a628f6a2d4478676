//! HTTP transport for the RPC endpoint
//!
//! Every request, whatever its path or verb, is handed to the dispatch gateway.

pub mod handlers;
