//! Launch-on-login registration.
//!
//! - **Windows**: a value named after the application under
//!   `HKCU\Software\Microsoft\Windows\CurrentVersion\Run`, written with `reg`.
//!   No administrator rights are needed.
//! - **Linux**: an XDG autostart entry,
//!   `$XDG_CONFIG_HOME/autostart/autocontinue.desktop` (falling back to
//!   `~/.config/autostart`).
//! - Other platforms report [`Message::AutostartNotImplemented`].
//!
//! The registered command starts the watcher detached: `"<exe>" --background`.
//! Enabling twice rewrites the same entry and disabling a missing entry
//! succeeds, so [`toggle`] is safe to call from a menu.

use crate::libs::messages::Message;
use crate::{msg_debug, msg_error_anyhow, msg_info};
use anyhow::Result;
use std::env;

/// Command line registered for login.
pub fn launch_command() -> Result<String> {
    let exe = env::current_exe()?;
    Ok(format!("\"{}\" --background", exe.to_string_lossy()))
}

#[cfg(target_os = "windows")]
mod windows {
    use super::*;
    use crate::libs::data_storage::APP_NAME;
    use std::os::windows::process::CommandExt;
    use std::process::Command;

    const RUN_KEY: &str = r"HKCU\Software\Microsoft\Windows\CurrentVersion\Run";
    const CREATE_NO_WINDOW: u32 = 0x08000000;

    /// `reg` writes in the console code page, which is not always UTF-8.
    pub(crate) fn decode_windows_output(bytes: &[u8]) -> String {
        if let Ok(utf8) = String::from_utf8(bytes.to_vec()) {
            return utf8;
        }
        encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
    }

    pub fn enable() -> Result<()> {
        let command = launch_command()?;
        msg_debug!(format!("Registering {} under {}", command, RUN_KEY));
        let output = Command::new("reg")
            .args(["add", RUN_KEY, "/v", APP_NAME, "/t", "REG_SZ", "/d", &command, "/f"])
            .creation_flags(CREATE_NO_WINDOW)
            .output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(msg_error_anyhow!(Message::AutostartEnableFailed(decode_windows_output(&output.stderr))))
        }
    }

    pub fn disable() -> Result<()> {
        let output = Command::new("reg")
            .args(["delete", RUN_KEY, "/v", APP_NAME, "/f"])
            .creation_flags(CREATE_NO_WINDOW)
            .output()?;
        if output.status.success() {
            return Ok(());
        }
        let error = decode_windows_output(&output.stderr);
        if error.contains("unable to find") || error.contains("cannot find") {
            Ok(())
        } else {
            Err(msg_error_anyhow!(Message::AutostartDisableFailed(error)))
        }
    }

    pub fn is_enabled() -> Result<bool> {
        let output = Command::new("reg")
            .args(["query", RUN_KEY, "/v", APP_NAME])
            .creation_flags(CREATE_NO_WINDOW)
            .output()?;
        Ok(output.status.success())
    }
}

#[cfg(target_os = "linux")]
mod linux {
    use super::*;
    use crate::libs::data_storage::APP_NAME;
    use std::fs;
    use std::path::PathBuf;

    pub fn desktop_entry_path() -> Result<PathBuf> {
        let config_home = match env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => {
                let home = env::var_os("HOME").ok_or_else(|| msg_error_anyhow!(Message::HomeNotSet))?;
                PathBuf::from(home).join(".config")
            }
        };
        Ok(config_home.join("autostart").join(format!("{}.desktop", APP_NAME)))
    }

    pub fn desktop_entry(command: &str) -> String {
        format!(
            "[Desktop Entry]\nType=Application\nName={name}\nComment=Resume idle agents\nExec={command}\nTerminal=false\nX-GNOME-Autostart-enabled=true\n",
            name = APP_NAME,
            command = command
        )
    }

    pub fn enable() -> Result<()> {
        let path = desktop_entry_path()?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        msg_debug!(format!("Writing autostart entry {}", path.display()));
        fs::write(&path, desktop_entry(&launch_command()?))
            .map_err(|e| msg_error_anyhow!(Message::AutostartEnableFailed(e.to_string())))
    }

    pub fn disable() -> Result<()> {
        let path = desktop_entry_path()?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(msg_error_anyhow!(Message::AutostartDisableFailed(e.to_string()))),
        }
    }

    pub fn is_enabled() -> Result<bool> {
        Ok(desktop_entry_path()?.exists())
    }
}

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
mod other {
    use super::*;

    pub fn enable() -> Result<()> {
        Err(msg_error_anyhow!(Message::AutostartNotImplemented))
    }

    pub fn disable() -> Result<()> {
        Err(msg_error_anyhow!(Message::AutostartNotImplemented))
    }

    pub fn is_enabled() -> Result<bool> {
        Ok(false)
    }
}

#[cfg(target_os = "windows")]
use windows as platform;

#[cfg(target_os = "linux")]
use linux as platform;

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
use other as platform;

#[cfg(target_os = "linux")]
pub use linux::{desktop_entry, desktop_entry_path};

pub fn enable() -> Result<()> {
    platform::enable()?;
    msg_info!(Message::AutostartEnabled);
    Ok(())
}

pub fn disable() -> Result<()> {
    if !platform::is_enabled()? {
        msg_info!(Message::AutostartAlreadyDisabled);
        return Ok(());
    }
    platform::disable()?;
    msg_info!(Message::AutostartDisabled);
    Ok(())
}

pub fn is_enabled() -> Result<bool> {
    platform::is_enabled()
}

/// Flips the registration and returns whether it is now enabled.
pub fn toggle() -> Result<bool> {
    if is_enabled()? {
        disable()?;
        Ok(false)
    } else {
        enable()?;
        Ok(true)
    }
}

pub fn status() -> Result<String> {
    match is_enabled()? {
        true => Ok("enabled".to_string()),
        false => Ok("disabled".to_string()),
    }
}
