#![deny(missing_docs)]
//! Media Relay Bot
//!
//! A Telegram bot that searches music and downloads YouTube media, correlating
//! inline button presses with per-chat result sets.

/// Telegram bot implementation
pub mod bot;
/// Configuration management
pub mod config;
/// Media downloads and link handling
pub mod media;
/// Music search
pub mod search;
/// Per-session result sets and callback tokens
pub mod session;
/// Text and retry helpers
pub mod utils;
