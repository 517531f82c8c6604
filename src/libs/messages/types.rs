use crate::libs::geometry::{Offset, Point};

/// Every user-facing message. The text lives in `display.rs`.
#[derive(Debug, Clone)]
pub enum Message {
    // === STARTUP ===
    WatcherStarting(String), // reference image
    WatcherStartsPaused(String, String), // pause key, quit key
    DryRunEnabled,
    SingleShotEnabled,
    PoliteModeDisabled,
    ConfigLoadedFrom(String),
    ReferenceInvalid(String),
    InvalidConfidence(f32),
    InvalidCooldown(f64),
    InvalidRegionSize,
    InvalidConfirmKey(String),
    InputBackendUnavailable(String),
    TrayNotCompiled,
    TrayFailed(String),
    ControlLoopPanicked,

    // === SESSION ===
    SessionPaused,
    SessionResumed,
    SessionQuitting,
    SingleShotComplete(Point, bool), // target, simulated
    ReceivedShutdownSignal,
    SignalListenFailed(String),
    StatusLine(bool), // paused

    // === CONTROL LOOP ===
    ActionPerformed(Point),
    DryRunAction(Point),
    ActionNotification(String), // local time
    UserActiveSkipping,
    SearchFailed(String),
    ActionFailed(String),
    CycleFailed(String),
    NotificationFailed(String),

    // === HOTKEYS ===
    UnknownHotkey(String),
    HotkeysCollide(String),
    HotkeyListenFailed(String),

    // === CALIBRATION ===
    CalibrationIntro,
    CalibrationPointAtIcon,
    CalibrationPointAtTarget,
    CalibrationResult(Point, Point, Offset), // anchor, target, offset
    ConfirmSaveOffset,
    OffsetSaved(String),
    OffsetNotSaved,

    // === AUTOSTART ===
    AutostartEnabled,
    AutostartDisabled,
    AutostartAlreadyDisabled,
    AutostartEnableFailed(String),
    AutostartDisableFailed(String),
    AutostartToggleFailed(String),
    AutostartStatus(String),
    AutostartNotImplemented,
    HomeNotSet,

    // === BACKGROUND ===
    BackgroundStarted(u32, String), // pid, log file
    BackgroundStopped(u32),
    BackgroundNotRunning,
    BackgroundStoppingExisting(u32),
    BackgroundFailedToStopExisting(String),
    BackgroundNotSupported,
    InvalidPidFileContent,
    FailedToGetCurrentExecutable,
    FailedToOpenProcess(u32),
    FailedToTerminateProcess(u32),
    ProcessTerminationNotSupported,
}
