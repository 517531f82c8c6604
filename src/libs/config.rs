//! Configuration for the watcher.
//!
//! The configuration is a flat JSON object persisted in the application data
//! directory (or any path passed with `--config`). Every key is optional: a
//! missing key takes its default and unknown keys are ignored, so older and
//! hand-edited files keep loading.
//!
//! ## Layering
//!
//! 1. [`Config::default`] supplies the built-in values.
//! 2. The config file replaces whatever keys it names.
//! 3. [`ConfigOverrides`], filled from the command line, replaces the rest.
//! 4. [`ActionConfig::new`] freezes the result for one run: it resolves the
//!    reference image path and converts seconds and milliseconds into
//!    [`Duration`]s.
//!
//! ## File Location
//!
//! - **Windows**: `%LOCALAPPDATA%\autocontinue\config.json`
//! - **macOS**: `~/Library/Application Support/autocontinue/config.json`
//! - **Linux**: `~/.local/share/autocontinue/config.json`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use autocontinue::libs::config::{Config, ConfigOverrides};
//!
//! let config = Config::read()?.merged(&ConfigOverrides {
//!     cooldown: Some(30.0),
//!     ..Default::default()
//! });
//! config.save()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::data_storage::DataStorage;
use crate::libs::activity::ActivitySensor;
use crate::libs::actuator::parse_key;
use crate::libs::geometry::Offset;
use crate::libs::messages::Message;
use crate::msg_bail_anyhow;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration file name inside the data directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Text typed into the agent when the idle cue is found.
pub const DEFAULT_TEXT: &str = "Continue with the plan. Develop the rest of the requirements. Make improvements.  \
Make sure everything works.  Write tests. Run the tests. If you have confirmed there is absolutely nothing left to do, \
execute 'sleep 60000' command in the shell (not in the background) and wait for it. Only if you are certain. \
Otherwise, wait for further instructions.";

pub const DEFAULT_IMAGE: &str = "microphone_icon.png";

/// Persisted settings.
///
/// Field names are the JSON keys, so they stay stable across releases.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Literal text typed after the click.
    pub text: String,

    /// Minimum number of seconds between two actions.
    pub cooldown: f64,

    /// Horizontal distance from the icon center to the click target.
    ///
    /// The default points at the input field left of the microphone icon.
    pub offset_x: i32,

    /// Vertical distance from the icon center to the click target.
    pub offset_y: i32,

    /// Reference image of the idle cue.
    ///
    /// Relative paths are tried in the working directory first and then next
    /// to the executable.
    pub image: String,

    /// Act even while the operator is moving the pointer.
    pub no_polite: bool,

    /// Show a desktop notification after each action.
    pub notify: bool,

    /// Minimum match score in `0.0..=1.0`.
    pub confidence: f32,

    /// Match on luma instead of color.
    pub grayscale: bool,

    /// Side of the square searched around the last match, in pixels.
    pub region_size: u32,

    /// Pause between typed characters, in milliseconds.
    pub type_interval_ms: u64,

    /// Pointer displacement in pixels above which the operator counts as active.
    pub activity_threshold: f64,

    /// Time between the two pointer samples of the activity check, in milliseconds.
    pub activity_window_ms: u64,

    /// Key pressed after typing.
    pub confirm_key: String,

    /// Global hotkey that toggles pause.
    pub pause_key: String,

    /// Global hotkey that quits.
    pub quit_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            text: DEFAULT_TEXT.to_string(),
            cooldown: 15.0,
            offset_x: -200,
            offset_y: -50,
            image: DEFAULT_IMAGE.to_string(),
            no_polite: false,
            notify: false,
            confidence: 0.9,
            grayscale: true,
            region_size: 200,
            type_interval_ms: 10,
            activity_threshold: 5.0,
            activity_window_ms: 500,
            confirm_key: "enter".to_string(),
            pause_key: "F8".to_string(),
            quit_key: "F9".to_string(),
        }
    }
}

/// Values given on the command line. `None` keeps the file value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub text: Option<String>,
    pub cooldown: Option<f64>,
    pub offset_x: Option<i32>,
    pub offset_y: Option<i32>,
    pub image: Option<String>,
    pub no_polite: bool,
    pub notify: bool,
    pub confidence: Option<f32>,
}

impl Config {
    /// Reads `config.json` from the data directory, or the defaults when the
    /// file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn read() -> Result<Config> {
        let path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        Self::read_from(&path)
    }

    /// Reads the configuration from an explicit path.
    pub fn read_from(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let config = serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Reads from `path` when given, otherwise from the data directory.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        match path {
            Some(path) => Self::read_from(path),
            None => Self::read(),
        }
    }

    /// Writes pretty-printed JSON into the data directory.
    pub fn save(&self) -> Result<()> {
        let path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(&file, self)?;
        Ok(())
    }

    /// Path the configuration is read from and saved to.
    pub fn location(path: Option<&Path>) -> Result<PathBuf> {
        match path {
            Some(path) => Ok(path.to_path_buf()),
            None => Ok(DataStorage::new().get_path(CONFIG_FILE_NAME)?),
        }
    }

    /// Applies command-line overrides on top of this configuration.
    pub fn merged(mut self, overrides: &ConfigOverrides) -> Config {
        if let Some(text) = &overrides.text {
            self.text = text.clone();
        }
        if let Some(cooldown) = overrides.cooldown {
            self.cooldown = cooldown;
        }
        if let Some(dx) = overrides.offset_x {
            self.offset_x = dx;
        }
        if let Some(dy) = overrides.offset_y {
            self.offset_y = dy;
        }
        if let Some(image) = &overrides.image {
            self.image = image.clone();
        }
        // Flags can only switch a behavior on.
        self.no_polite |= overrides.no_polite;
        self.notify |= overrides.notify;
        if let Some(confidence) = overrides.confidence {
            self.confidence = confidence;
        }
        self
    }

    /// Rejects values the control loop cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.confidence > 0.0 && self.confidence <= 1.0) {
            msg_bail_anyhow!(Message::InvalidConfidence(self.confidence));
        }
        if self.cooldown < 0.0 || Duration::try_from_secs_f64(self.cooldown).is_err() {
            msg_bail_anyhow!(Message::InvalidCooldown(self.cooldown));
        }
        if self.region_size == 0 {
            msg_bail_anyhow!(Message::InvalidRegionSize);
        }
        if parse_key(&self.confirm_key).is_err() {
            msg_bail_anyhow!(Message::InvalidConfirmKey(self.confirm_key.clone()));
        }
        Ok(())
    }

    pub fn offset(&self) -> Offset {
        Offset::new(self.offset_x, self.offset_y)
    }

    pub fn set_offset(&mut self, offset: Offset) {
        self.offset_x = offset.dx;
        self.offset_y = offset.dy;
    }
}

/// Resolves a bundled resource.
///
/// Returns `relative` unchanged when it exists (or is absolute), otherwise the
/// same name next to the running executable if that exists, otherwise
/// `relative` again so the caller reports the path the user gave.
pub fn resolve_resource(relative: &Path) -> PathBuf {
    if relative.is_absolute() || relative.exists() {
        return relative.to_path_buf();
    }
    let beside_exe = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(relative)));
    match beside_exe {
        Some(candidate) if candidate.exists() => candidate,
        _ => relative.to_path_buf(),
    }
}

/// Frozen settings for one run of the control loop.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionConfig {
    pub image: PathBuf,
    pub cooldown: Duration,
    pub offset: Offset,
    pub text: String,
    pub polite: bool,
    pub notify: bool,
    pub dry_run: bool,
    pub single_shot: bool,
    pub confidence: f32,
    pub grayscale: bool,
    pub region_size: u32,
    pub type_interval: Duration,
    pub confirm_key: String,
    pub activity: ActivitySensor,
}

impl ActionConfig {
    pub fn new(config: &Config, dry_run: bool, single_shot: bool) -> Self {
        Self {
            image: resolve_resource(Path::new(&config.image)),
            cooldown: Duration::try_from_secs_f64(config.cooldown.max(0.0)).unwrap_or(Duration::MAX),
            offset: config.offset(),
            text: config.text.clone(),
            polite: !config.no_polite,
            notify: config.notify,
            dry_run,
            single_shot,
            confidence: config.confidence.clamp(0.0, 1.0),
            grayscale: config.grayscale,
            region_size: config.region_size.max(1),
            type_interval: Duration::from_millis(config.type_interval_ms),
            confirm_key: config.confirm_key.clone(),
            activity: ActivitySensor::new(Duration::from_millis(config.activity_window_ms), config.activity_threshold),
        }
    }
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self::new(&Config::default(), false, false)
    }
}
