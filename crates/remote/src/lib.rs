//! Boundary to the hosted backend
//!
//! This crate provides:
//! - The `RemoteStore` trait (select/insert/update/delete/rpc over JSON rows)
//! - `RestClient`, speaking PostgREST for data and GoTrue for auth
//! - `MemoryStore`, an in-process stand-in with row-level security
//! - Typed error mapping of HTTP and service codes onto `RemoteError`
//! - Session handling and the identity boundary
//! - Bounded exponential-backoff retry for eventual-consistency waits

pub mod auth;
pub mod backoff;
pub mod error;
pub mod memory;
pub mod query;
pub mod rest;
pub mod session;
pub mod store;

pub use auth::AuthProvider;
pub use backoff::{retry_until, RetryError, RetryPolicy};
pub use memory::MemoryStore;
pub use query::{Embed, Query};
pub use rest::{RestClient, RestConfig};
pub use session::{IdentityProvider, Session, SessionHandle};
pub use store::RemoteStore;
