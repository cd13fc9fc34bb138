//! Event types for the client event loop.

use holonotes_core::Signal;

#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// One line typed at the prompt.
    Input(String),
    /// Signal received from the websocket relay.
    Signal(Box<Signal>),
    RelayConnected,
    RelayDisconnected { reason: String },
    RelayError(String),
}
