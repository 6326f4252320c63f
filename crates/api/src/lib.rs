//! PegVault sandbox API.
//!
//! Exposes a [`PegEngine`](pegvault_engine::PegEngine) backed by in-memory
//! tokens over HTTP. State-changing routes act on behalf of the wallet that
//! signed in with SIWE.

pub mod middleware;
pub mod routes;
pub mod state;
