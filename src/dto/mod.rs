//! Wire-facing types: inbound events from the transport and outbound view
//! requests back to it.

/// Inbound events and their one-step decoding.
pub mod event;
/// Outbound view requests and keyboard builders.
pub mod view;
