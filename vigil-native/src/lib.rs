//! Helpers for running vigil natively: logging setup and the Telegram alert transport.
mod log;
mod telegram;

pub use log::*;
pub use telegram::*;

// export the core version in use
pub use vigil;
