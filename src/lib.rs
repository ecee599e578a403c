pub mod config;
pub mod display;
pub mod error;
pub mod format;
pub mod logging;
pub mod scheduler;
pub mod system;
pub mod ui;
