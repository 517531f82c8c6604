//! Text of every [`Message`].
//!
//! Keeping the wording in one `match` means a message reads the same whether
//! it is printed, logged through `tracing` or wrapped into an error.

use super::types::Message;
use std::fmt;

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            // === STARTUP ===
            Message::WatcherStarting(image) => format!("Watching for {}", image),
            Message::WatcherStartsPaused(pause, quit) => format!("Starting paused. Press {} to resume or pause, {} to quit.", pause, quit),
            Message::DryRunEnabled => "Dry run: the pointer moves to the target but nothing is clicked or typed".to_string(),
            Message::SingleShotEnabled => "Single-shot mode: exiting after the first action".to_string(),
            Message::PoliteModeDisabled => "Polite mode is off: acting even while the pointer is in use".to_string(),
            Message::ConfigLoadedFrom(path) => format!("Configuration: {}", path),
            Message::ReferenceInvalid(reason) => format!("Reference image is not usable: {}", reason),
            Message::InvalidConfidence(value) => format!("Confidence must be in (0, 1], got {}", value),
            Message::InvalidCooldown(value) => format!("Cooldown must be a non-negative number of seconds, got {}", value),
            Message::InvalidRegionSize => "Region size must be at least one pixel".to_string(),
            Message::InvalidConfirmKey(name) => format!("Unknown confirm key '{}'", name),
            Message::InputBackendUnavailable(reason) => format!("Input backend unavailable: {}", reason),
            Message::TrayNotCompiled => "Tray icon support is not compiled in; using the console status line".to_string(),
            Message::TrayFailed(reason) => format!("Tray icon failed: {}", reason),
            Message::ControlLoopPanicked => "The control loop stopped unexpectedly".to_string(),

            // === SESSION ===
            Message::SessionPaused => "Paused".to_string(),
            Message::SessionResumed => "Resumed, scanning for the idle cue".to_string(),
            Message::SessionQuitting => "Shutting down".to_string(),
            Message::SingleShotComplete(target, simulated) => {
                if *simulated {
                    format!("Single shot done (simulated at {})", target)
                } else {
                    format!("Single shot done at {}", target)
                }
            }
            Message::ReceivedShutdownSignal => "Received shutdown signal".to_string(),
            Message::SignalListenFailed(e) => format!("Cannot listen for shutdown signals: {}", e),
            Message::StatusLine(paused) => format!("Status: {}", if *paused { "paused" } else { "active" }),

            // === CONTROL LOOP ===
            Message::ActionPerformed(target) => format!("Resumed the agent at {}", target),
            Message::DryRunAction(target) => format!("Dry run: would click at {}", target),
            Message::ActionNotification(time) => format!("Idle agent detected, continue sent at {}", time),
            Message::UserActiveSkipping => "Pointer in use, waiting for the operator".to_string(),
            Message::SearchFailed(e) => format!("Screen search failed: {}", e),
            Message::ActionFailed(e) => format!("Input injection failed: {}", e),
            Message::CycleFailed(e) => format!("Cycle failed: {}", e),
            Message::NotificationFailed(e) => format!("Notification failed: {}", e),

            // === HOTKEYS ===
            Message::UnknownHotkey(name) => format!("Unknown hotkey '{}'", name),
            Message::HotkeysCollide(name) => format!("Pause and quit cannot both use {}", name),
            Message::HotkeyListenFailed(e) => format!("Hotkey listener failed: {}. Retrying in 1 second...", e),

            // === CALIBRATION ===
            Message::CalibrationIntro => "Calibration: two points are needed, the icon and the spot to click".to_string(),
            Message::CalibrationPointAtIcon => "Hover over the center of the icon, then press Enter".to_string(),
            Message::CalibrationPointAtTarget => "Hover over the spot to click, then press Enter".to_string(),
            Message::CalibrationResult(anchor, target, offset) => {
                format!("Icon at {}, target at {}, offset {}", anchor, target, offset)
            }
            Message::ConfirmSaveOffset => "Save this offset to the configuration?".to_string(),
            Message::OffsetSaved(path) => format!("Offset saved to {}", path),
            Message::OffsetNotSaved => "Offset not saved".to_string(),

            // === AUTOSTART ===
            Message::AutostartEnabled => "Autostart enabled".to_string(),
            Message::AutostartDisabled => "Autostart disabled".to_string(),
            Message::AutostartAlreadyDisabled => "Autostart is already disabled".to_string(),
            Message::AutostartEnableFailed(e) => format!("Failed to enable autostart: {}", e),
            Message::AutostartDisableFailed(e) => format!("Failed to disable autostart: {}", e),
            Message::AutostartToggleFailed(e) => format!("Failed to change autostart: {}", e),
            Message::AutostartStatus(status) => format!("Autostart is {}", status),
            Message::AutostartNotImplemented => "Autostart is not supported on this platform".to_string(),
            Message::HomeNotSet => "HOME is not set".to_string(),

            // === BACKGROUND ===
            Message::BackgroundStarted(pid, log) => format!("Running in the background with PID {} (log: {})", pid, log),
            Message::BackgroundStopped(pid) => format!("Background instance {} stopped", pid),
            Message::BackgroundNotRunning => "No background instance is running".to_string(),
            Message::BackgroundStoppingExisting(pid) => format!("Stopping background instance {}", pid),
            Message::BackgroundFailedToStopExisting(e) => format!("Failed to stop the previous instance: {}", e),
            Message::BackgroundNotSupported => "Background mode is not supported on this platform".to_string(),
            Message::InvalidPidFileContent => "PID file is corrupt".to_string(),
            Message::FailedToGetCurrentExecutable => "Cannot locate the current executable".to_string(),
            Message::FailedToOpenProcess(code) => format!("Failed to open process (error {})", code),
            Message::FailedToTerminateProcess(code) => format!("Failed to terminate process (error {})", code),
            Message::ProcessTerminationNotSupported => "Stopping processes is not supported on this platform".to_string(),
        };
        write!(f, "{}", text)
    }
}
