pub mod config;
pub mod diagnostics;
pub mod hardware;
pub mod record;
pub mod signals;
