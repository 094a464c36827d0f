/// Command, message and callback handlers
pub mod handlers;
/// Telegram calls with retry
pub mod resilient;
/// Keyboards and reply texts
pub mod views;
