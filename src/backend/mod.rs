//! Clients for the sorting-line backend: REST ([`client`]) and the live
//! WebSocket feed ([`live`]).

pub mod client;
pub mod live;

pub use client::{BackendClient, FishType, ProductionMix};
pub use live::{LiveState, LiveUpdate};
