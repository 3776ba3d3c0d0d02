//! Request middleware.
//!
//! Request lifecycle concerns shared by every route. Role checks live with
//! the HTTP adapter in `inbound::http::access`.

pub mod trace;

pub use trace::Trace;
