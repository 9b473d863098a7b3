//! Persisted client state.
//!
//! The credential is written by the login flow, read by the transport on every
//! request, and cleared (together with every other key) when the backend
//! rejects it.

mod events;
mod file_store;
mod store;

pub use events::{SessionEvent, SessionEvents};
pub use file_store::FileSessionStore;
pub use store::{MemorySessionStore, SessionError, SessionStore};
