pub mod activity;
pub mod actuator;
pub mod autostart;
pub mod calibration;
pub mod clock;
pub mod config;
pub mod control;
pub mod daemon;
pub mod data_storage;
pub mod geometry;
pub mod hotkeys;
pub mod indicator;
pub mod matcher;
pub mod messages;
pub mod notifier;
pub mod session;
#[cfg(feature = "tray")]
pub mod tray;
