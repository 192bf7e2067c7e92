//! amoCRM / Kommo REST API v4 client.
//!
//! Typed entity models, read helpers and OAuth/token plumbing around a batched write engine
//! that folds relation edits into minimal payloads, splits writes into size-bounded requests
//! per (path, verb), serializes concurrent updates of the same entity and normalizes the
//! different response envelopes the API returns.

pub mod api;
pub mod auth;
pub mod config;
