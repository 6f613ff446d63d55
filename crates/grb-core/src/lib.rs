//! Core engine for the group relay bot.
//!
//! This crate is transport-agnostic: the Telegram client lives behind the
//! `MessagingPort` trait implemented in the adapter crate. Everything with
//! state or consistency concerns (the group/admin registry, the
//! pending-action store, fan-out and reply dispatch) lives here so it can
//! be exercised without the network.

pub mod audit;
pub mod config;
pub mod controls;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod pending;
pub mod registry;
pub mod relay;

#[cfg(test)]
mod test_support;

pub use errors::{Error, Result};
