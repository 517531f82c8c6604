//! Desktop notifications, fire-and-forget.
//!
//! The notification is handed to the platform's own tool (`notify-send`,
//! `osascript`, PowerShell). The caller does not wait for it; a helper
//! thread reaps the child once it exits.

use anyhow::Result;
use std::io;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

pub trait Notifier: Send {
    fn notify(&self, title: &str, message: &str) -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

/// Notifier used when notifications are turned off.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _title: &str, _message: &str) -> Result<()> {
        Ok(())
    }
}

/// Escapes a value for a double-quoted AppleScript or PowerShell string.
#[cfg_attr(target_os = "linux", allow(dead_code))]
fn quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, message: &str) -> Result<()> {
        launch(platform_command(title, message)?)?;
        Ok(())
    }
}

/// Spawns `command` with null stdio and reaps it on a helper thread, so
/// finished children do not linger as zombies.
pub fn launch(mut command: Command) -> io::Result<JoinHandle<io::Result<ExitStatus>>> {
    command.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
    let mut child = command.spawn()?;
    thread::Builder::new()
        .name("notifier-reaper".to_string())
        .spawn(move || child.wait())
}

#[cfg(target_os = "linux")]
fn platform_command(title: &str, message: &str) -> Result<Command> {
    let mut command = Command::new("notify-send");
    command.arg("--app-name").arg(crate::libs::data_storage::APP_NAME).arg(title).arg(message);
    Ok(command)
}

#[cfg(target_os = "macos")]
fn platform_command(title: &str, message: &str) -> Result<Command> {
    let mut command = Command::new("osascript");
    command
        .arg("-e")
        .arg(format!("display notification \"{}\" with title \"{}\"", quote(message), quote(title)));
    Ok(command)
}

#[cfg(target_os = "windows")]
fn platform_command(title: &str, message: &str) -> Result<Command> {
    use std::os::windows::process::CommandExt;
    const CREATE_NO_WINDOW: u32 = 0x08000000;

    let script = format!(
        "Add-Type -AssemblyName System.Windows.Forms; \
         $n = New-Object System.Windows.Forms.NotifyIcon; \
         $n.Icon = [System.Drawing.SystemIcons]::Information; \
         $n.Visible = $true; \
         $n.ShowBalloonTip(5000, \"{}\", \"{}\", 'Info'); \
         Start-Sleep -Seconds 6; $n.Dispose()",
        quote(title),
        quote(message)
    );
    let mut command = Command::new("powershell");
    command.args(["-NoProfile", "-Command", &script]).creation_flags(CREATE_NO_WINDOW);
    Ok(command)
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn platform_command(_title: &str, _message: &str) -> Result<Command> {
    anyhow::bail!("notifications are not supported on this platform")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn launched_children_are_reaped() {
        let reaper = launch(Command::new("true")).unwrap();
        let status = reaper.join().unwrap().unwrap();
        assert!(status.success());
    }

    #[test]
    fn quotes_embedded_quotes_and_backslashes() {
        assert_eq!(quote(r#"say "hi" \o/"#), r#"say \"hi\" \\o/"#);
    }
}
