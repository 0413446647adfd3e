//! clausescope: dual-engine contract clause risk analysis.
//!
//! A clause is scored twice: by a deterministic keyword rule engine and by
//! an AI model. Results can be saved to a record store (local files or a
//! GitHub repository) and browsed on a dashboard.
//!
//! The crate is split into the backend ([`analysis`], [`ai`], [`store`],
//! [`web`]) and the client core ([`client`]), which talks to the backend
//! only through the [`client::Backend`] trait.

pub mod activity;
pub mod ai;
pub mod analysis;
pub mod cli;
pub mod client;
pub mod config;
pub mod protocol;
pub mod store;
pub mod web;
