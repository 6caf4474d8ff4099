//! Request middleware.
//!
//! [`Trace`] scopes every request to a trace identifier shared by logs,
//! error envelopes, and the `trace-id` response header.

pub mod trace;

pub use trace::Trace;
