//! The watcher itself.
//!
//! Threads and tasks of a run:
//!
//! - the control loop on its own OS thread (input injection and screen
//!   capture block);
//! - the `rdev` hotkey hook on another;
//! - the session controller as an async task (console mode: on the main
//!   task; tray mode: spawned, while `tao` owns the main thread).
//!
//! Shutdown: the controller flips `running`, the control loop notices at its
//! next check and returns, the thread is joined, and the tray (if any) exits
//! last.

use crate::libs::actuator::EnigoActuator;
use crate::libs::clock::SystemClock;
use crate::libs::config::{ActionConfig, Config, ConfigOverrides};
use crate::libs::control::ControlLoop;
use crate::libs::daemon;
use crate::libs::hotkeys::{HotkeySurface, Hotkeys};
use crate::libs::indicator::LogSurface;
use crate::libs::matcher::{validate_reference, ScreenshotMatcher};
use crate::libs::messages::Message;
use crate::libs::notifier::{DesktopNotifier, Notifier, SilentNotifier};
use crate::libs::session::{SessionController, SessionEvent, SessionState};
use crate::{msg_debug, msg_error_anyhow, msg_info, msg_warning};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc::{self, UnboundedSender};

#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub config: Option<PathBuf>,
    pub overrides: ConfigOverrides,
    pub dry_run: bool,
    pub once: bool,
    pub tray: bool,
    pub daemon_run: bool,
}

/// Loads, merges and validates everything the run needs before any thread starts.
pub fn prepare(args: &RunArgs) -> Result<(Config, ActionConfig)> {
    let path = Config::location(args.config.as_deref())?;
    msg_debug!(Message::ConfigLoadedFrom(path.display().to_string()));
    let config = Config::read_from(&path)?.merged(&args.overrides);
    config.validate()?;
    let action = ActionConfig::new(&config, args.dry_run, args.once);
    validate_reference(&action.image).map_err(|e| msg_error_anyhow!(Message::ReferenceInvalid(e.to_string())))?;
    Ok((config, action))
}

pub async fn cmd(args: RunArgs) -> Result<()> {
    let (config, action) = prepare(&args)?;
    let hotkeys = Hotkeys::parse(&config.pause_key, &config.quit_key)?;

    msg_info!(Message::WatcherStarting(action.image.display().to_string()));
    if action.dry_run {
        msg_info!(Message::DryRunEnabled);
    }
    if action.single_shot {
        msg_info!(Message::SingleShotEnabled);
    }
    if !action.polite {
        msg_warning!(Message::PoliteModeDisabled);
    }
    msg_info!(Message::WatcherStartsPaused(config.pause_key.clone(), config.quit_key.clone()));

    let state = Arc::new(SessionState::new());
    let (events, receiver) = mpsc::unbounded_channel();
    let mut controller = SessionController::new(state.clone(), action.single_shot);
    controller.add_surface(Box::new(HotkeySurface::spawn(hotkeys, events.clone())));
    let control_thread = spawn_control_loop(action, state.clone(), events.clone());

    #[cfg(feature = "tray")]
    if args.tray {
        use crate::libs::tray::Tray;
        use crate::msg_error;

        let tray = Tray::new();
        controller.add_surface(Box::new(tray.surface()));
        let handle = tray.handle();
        let daemon_run = args.daemon_run;
        tokio::spawn(async move {
            controller.run(receiver).await;
            if let Err(e) = finish(control_thread, daemon_run).await {
                msg_error!(e);
            }
            handle.exit();
        });
        tray.run(events, state.is_paused());
    }

    #[cfg(not(feature = "tray"))]
    if args.tray {
        msg_debug!(Message::TrayNotCompiled);
    }

    controller.add_surface(Box::new(LogSurface));
    drop(events);
    controller.run(receiver).await;
    finish(control_thread, args.daemon_run).await
}

/// Builds the desktop backends on the loop's own thread and runs it there.
///
/// If a backend cannot be created the session is told to quit.
fn spawn_control_loop(action: ActionConfig, state: Arc<SessionState>, events: UnboundedSender<SessionEvent>) -> JoinHandle<Result<()>> {
    thread::spawn(move || {
        let backends = ScreenshotMatcher::from_path(&action.image)
            .map_err(|e| msg_error_anyhow!(Message::ReferenceInvalid(e.to_string())))
            .and_then(|matcher| {
                EnigoActuator::new()
                    .map(|actuator| (matcher, actuator))
                    .map_err(|e| msg_error_anyhow!(Message::InputBackendUnavailable(e.to_string())))
            });
        let (matcher, actuator) = match backends {
            Ok(backends) => backends,
            Err(e) => {
                let _ = events.send(SessionEvent::Quit);
                return Err(e);
            }
        };
        let notifier: Box<dyn Notifier> = if action.notify {
            Box::new(DesktopNotifier)
        } else {
            Box::new(SilentNotifier)
        };
        ControlLoop::new(action, state, matcher, actuator, SystemClock, notifier)
            .with_events(events)
            .run();
        Ok(())
    })
}

async fn finish(control_thread: JoinHandle<Result<()>>, daemon_run: bool) -> Result<()> {
    let joined = tokio::task::spawn_blocking(move || control_thread.join()).await;
    if daemon_run {
        daemon::release_pid_file();
    }
    match joined? {
        Ok(result) => result,
        Err(_) => Err(msg_error_anyhow!(Message::ControlLoopPanicked)),
    }
}
