//! sard-api: the HTTP layer of the dispatch backend.
//!
//! This crate is thin by design: it extracts the authenticated actor,
//! looks up the resource kind in the registry, and delegates every
//! decision to the engine in `sard-domain`. All it owns is the
//! mapping from domain errors to JSON:API error responses and the
//! route table.

pub mod auth;
pub mod errors;
pub mod http;
