//! # autocontinue
//!
//! Watches the screen for the icon an AI coding agent shows when it goes
//! idle, and answers it: click the input field next to the icon, type a
//! continue message, press Enter, put the pointer back.
//!
//! ## Features
//!
//! - **Region-first search**: the last match is searched around before the
//!   whole screen
//! - **Cooldown**: at most one action per configured interval
//! - **Polite mode**: no action while the operator is moving the pointer
//! - **Hotkeys and tray**: pause, resume and quit from anywhere
//! - **Calibration**: measure the click offset by pointing at two spots
//! - **Dry run and single shot** for trying out a configuration
//!
//! ## Usage
//!
//! ```rust,no_run
//! use autocontinue::commands::Cli;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Cli::menu().await
//! }
//! ```

pub mod commands;
pub mod libs;
