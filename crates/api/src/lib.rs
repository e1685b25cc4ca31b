//! HTTP proxy in front of the blob and table stores.
//!
//! Clients talk to these routes; only the server holds the store credentials.

pub mod app;
