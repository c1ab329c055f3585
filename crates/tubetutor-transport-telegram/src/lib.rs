#![deny(missing_docs)]
//! Telegram transport for Tubetutor.
//!
//! Webhook intake, duplicate suppression, chat handlers and the HTTP server.

/// Telegram-specific bot/transport implementation.
pub mod bot;
/// Telegram transport configuration.
pub mod config;
/// Webhook event dispatcher.
pub mod dispatcher;
/// Telegram runtime entrypoint.
pub mod runner;
/// HTTP routes.
pub mod server;
/// Webhook registration with the Bot API.
pub mod webhook;
