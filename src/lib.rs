//! fishsort: production-history analytics for the fish-sorting line.
//!
//! The library side holds the analytics pipeline ([`history`]), the backend
//! client and live feed ([`backend`]), layered configuration ([`config`]) and
//! the local dashboard ([`web`]). The `fishsort` binary wires these into
//! subcommands through [`cli`].

pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod logging;
pub mod web;
