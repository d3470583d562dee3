pub mod cli;
pub mod client;
pub mod config;
pub mod logging;
pub mod server;
pub mod shutdown;
pub mod sound;
pub mod tray;
