//! Command-line surface.
//!
//! There are no subcommands: the flags select a mode (watch, calibrate,
//! background, stop, autostart) and the remaining flags override the
//! configuration file for this run.

pub mod autostart;
pub mod background;
pub mod calibrate;
pub mod run;

use crate::libs::config::ConfigOverrides;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AutostartAction {
    Enable,
    Disable,
    Toggle,
    Status,
}

#[derive(Debug, Parser)]
#[command(author, version, about = "Watches the screen for an idle agent and types a continue message", long_about = None)]
pub struct Cli {
    /// Text to type after clicking
    #[arg(long)]
    pub text: Option<String>,

    /// Seconds to wait between actions
    #[arg(long)]
    pub cooldown: Option<f64>,

    /// Horizontal click offset from the icon center
    #[arg(long, allow_hyphen_values = true)]
    pub offset_x: Option<i32>,

    /// Vertical click offset from the icon center
    #[arg(long, allow_hyphen_values = true)]
    pub offset_y: Option<i32>,

    /// Reference image of the idle cue
    #[arg(long)]
    pub image: Option<String>,

    /// Act even while the pointer is moving
    #[arg(long)]
    pub no_polite: bool,

    /// Show a desktop notification after each action
    #[arg(long)]
    pub notify: bool,

    /// Minimum match score between 0 and 1
    #[arg(long)]
    pub confidence: Option<f32>,

    /// Configuration file to use instead of the default one
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Move the pointer to the target without clicking or typing
    #[arg(long)]
    pub dry_run: bool,

    /// Exit after the first action
    #[arg(long)]
    pub once: bool,

    /// Measure the click offset interactively
    #[arg(long, conflicts_with_all = ["background", "stop", "autostart"])]
    pub calibrate: bool,

    /// Run detached from the terminal
    #[arg(long)]
    pub background: bool,

    /// Stop the instance started with --background
    #[arg(long, conflicts_with_all = ["background", "autostart"])]
    pub stop: bool,

    /// Manage launching on login
    #[arg(long, value_enum)]
    pub autostart: Option<AutostartAction>,

    /// Do not show a tray icon
    #[arg(long)]
    pub no_tray: bool,

    #[arg(long, hide = true)]
    pub daemon_run: bool,
}

impl Cli {
    pub async fn menu() -> Result<()> {
        Self::parse().dispatch().await
    }

    pub async fn dispatch(self) -> Result<()> {
        if self.stop {
            return background::stop();
        }
        if let Some(action) = self.autostart {
            return autostart::cmd(action);
        }
        if self.calibrate {
            return calibrate::cmd(self.config.as_deref());
        }
        if self.background && !self.daemon_run {
            return background::cmd();
        }
        run::cmd(self.run_args()).await
    }

    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            text: self.text.clone(),
            cooldown: self.cooldown,
            offset_x: self.offset_x,
            offset_y: self.offset_y,
            image: self.image.clone(),
            no_polite: self.no_polite,
            notify: self.notify,
            confidence: self.confidence,
        }
    }

    pub fn run_args(&self) -> run::RunArgs {
        run::RunArgs {
            config: self.config.clone(),
            overrides: self.overrides(),
            dry_run: self.dry_run,
            once: self.once,
            tray: !self.no_tray,
            daemon_run: self.daemon_run,
        }
    }
}
