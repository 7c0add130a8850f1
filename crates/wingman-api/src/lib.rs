//! Async client for the Coupang Open API promotion endpoints.
//!
//! Two vendor surfaces live behind one client:
//!
//! - **FMS** (instant coupons) — asynchronous operations: creation and item
//!   application each return a `requestedId` that must be polled to
//!   completion by the caller.
//! - **Marketplace** (download coupons) — synchronous operations: creation
//!   returns a coupon id directly, item application and expiry return
//!   per-item result arrays.
//!
//! Every request is signed with the vendor's CEA HMAC-SHA256 scheme
//! ([`auth::Keypair`]). Transport failures, HTTP-status failures, and
//! body-level error codes are all normalized into [`Error`] — callers never
//! inspect raw responses. This crate carries no coupon business rules;
//! sequencing and validation belong to `wingman-core`.

pub mod auth;
pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use auth::Keypair;
pub use client::{DEFAULT_BASE_URL, OpenApiClient};
pub use error::Error;
pub use transport::TransportConfig;
