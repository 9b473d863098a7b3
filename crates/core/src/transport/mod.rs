//! Shared HTTP transport for authenticated backend calls.
//!
//! One configured `reqwest` client with a fixed base address, timeout and JSON
//! content type, plus an ordered chain of [`Interceptor`]s that see every
//! outgoing request and every response status.

mod client;
mod error;
mod interceptor;

pub use client::ApiClient;
pub use error::ApiError;
pub use interceptor::{CredentialInjector, Interceptor, SessionGuard};
