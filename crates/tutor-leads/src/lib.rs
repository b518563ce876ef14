//! Lead matching and credit accounting engine for a tuition marketplace.
//!
//! Parents post tuition requirements; tutors spend prepaid lead credits to
//! unlock them. The [`engine`] module owns the matching, metering, and
//! lifecycle machinery behind that exchange: the append-only credit ledger,
//! the activation and consumption gates, requirement and demo-session state
//! machines, and the HTTP router exposing them. Storage and notification are
//! trait seams so the engine stays agnostic of the backing technology.

pub mod config;
pub mod engine;
pub mod error;
pub mod telemetry;
