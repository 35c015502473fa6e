//! Bazaar
//!
//! Client-side core of a home-services marketplace: the pricing calculator,
//! the multi-step checkout orchestrator and the chat reconciliation reducer
//! that merges REST and real-time message streams.

pub mod amounts;
pub mod api;
pub mod catalog;
pub mod chat;
pub mod checkout;
pub mod config;
pub mod context;
pub mod fixtures;
pub mod logging;
pub mod prelude;
pub mod pricing;
pub mod summary;

#[cfg(test)]
mod test_support;
