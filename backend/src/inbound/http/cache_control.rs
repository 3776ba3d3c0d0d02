//! Cache-control policies for HTTP handlers.

/// Per-user responses (account, cart, checkout) must never be reused.
pub const PRIVATE_NO_STORE: &str = "private, no-store";

/// Header tuple for per-user responses.
pub const fn private_no_store_header() -> (&'static str, &'static str) {
    ("Cache-Control", PRIVATE_NO_STORE)
}
