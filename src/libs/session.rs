//! Run/pause coordination between the control loop and the event surfaces.
//!
//! ## Ownership
//!
//! - [`SessionState`] is shared behind an `Arc`. Its flags change only through
//!   the narrow transitions below, and the loop reads them once per cycle.
//! - Surfaces (hotkeys, tray menu, signals) never touch the flags. They send a
//!   [`SessionEvent`] into the channel drained by [`SessionController`], which
//!   is the only writer of `paused` and `running`.
//! - `last_action_time` is written by the control loop alone.
//!
//! A pause requested mid-cycle is seen by the loop on its next cycle.

use crate::libs::daemon::shutdown_signal;
use crate::libs::geometry::Point;
use crate::libs::messages::Message;
use crate::{msg_debug, msg_info, msg_warning};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Debug)]
pub struct SessionState {
    running: AtomicBool,
    paused: AtomicBool,
    last_action: Mutex<Option<Instant>>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// A new session is running but paused; scanning starts on an explicit resume.
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            paused: AtomicBool::new(true),
            last_action: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Returns `true` when the session was not already paused.
    pub fn request_pause(&self) -> bool {
        !self.paused.swap(true, Ordering::SeqCst)
    }

    /// Returns `true` when the session was paused.
    pub fn request_resume(&self) -> bool {
        self.paused.swap(false, Ordering::SeqCst)
    }

    /// Flips the pause flag and returns the new value.
    pub fn toggle_pause(&self) -> bool {
        !self.paused.fetch_xor(true, Ordering::SeqCst)
    }

    /// Stops the session for good. Only the first call returns `true`.
    pub fn request_quit(&self) -> bool {
        self.running.swap(false, Ordering::SeqCst)
    }

    pub fn last_action_time(&self) -> Option<Instant> {
        *self.last_action.lock()
    }

    pub fn record_action(&self, at: Instant) {
        *self.last_action.lock() = Some(at);
    }
}

/// Stimuli delivered to the session controller.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    TogglePause,
    Pause,
    Resume,
    Quit,
    /// The control loop clicked and typed (or simulated it) at `target`.
    ActionDispatched { target: Point, simulated: bool },
}

/// Something that reflects or produces session events: the hotkey hook,
/// the tray icon, the console status line.
pub trait SessionSurface: Send {
    fn name(&self) -> &str;

    /// Shows the new pause state (tray icon color, status text).
    fn reflect_pause(&self, _paused: bool) {}

    /// Stops producing events. Called once, on the first quit.
    fn stop(&self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub struct SessionController {
    state: Arc<SessionState>,
    surfaces: Vec<Box<dyn SessionSurface>>,
    single_shot: bool,
}

impl SessionController {
    pub fn new(state: Arc<SessionState>, single_shot: bool) -> Self {
        Self {
            state,
            surfaces: Vec::new(),
            single_shot,
        }
    }

    pub fn add_surface(&mut self, surface: Box<dyn SessionSurface>) {
        surface.reflect_pause(self.state.is_paused());
        self.surfaces.push(surface);
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Applies one event to the session.
    pub fn handle(&mut self, event: SessionEvent) -> Flow {
        msg_debug!(format!("session event: {:?}", event));
        match event {
            SessionEvent::TogglePause => {
                let paused = self.state.toggle_pause();
                self.announce_pause(paused);
            }
            SessionEvent::Pause => {
                if self.state.request_pause() {
                    self.announce_pause(true);
                }
            }
            SessionEvent::Resume => {
                if self.state.request_resume() {
                    self.announce_pause(false);
                }
            }
            SessionEvent::Quit => return self.quit(),
            SessionEvent::ActionDispatched { target, simulated } => {
                if self.single_shot {
                    msg_info!(Message::SingleShotComplete(target, simulated));
                    return self.quit();
                }
            }
        }
        if self.state.is_running() {
            Flow::Continue
        } else {
            Flow::Stop
        }
    }

    /// Ends the session. Surfaces are stopped only on the first call.
    pub fn quit(&mut self) -> Flow {
        if self.state.request_quit() {
            msg_info!(Message::SessionQuitting);
            for surface in &self.surfaces {
                msg_debug!(format!("stopping surface {}", surface.name()));
                surface.stop();
            }
        }
        Flow::Stop
    }

    fn announce_pause(&self, paused: bool) {
        if paused {
            msg_info!(Message::SessionPaused);
        } else {
            msg_info!(Message::SessionResumed);
        }
        for surface in &self.surfaces {
            surface.reflect_pause(paused);
        }
    }

    /// Drains `events` until the session quits, a shutdown signal arrives,
    /// or every sender is gone.
    pub async fn run(mut self, mut events: UnboundedReceiver<SessionEvent>) {
        let signal = shutdown_signal();
        tokio::pin!(signal);
        let mut watch_signals = true;
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        if self.handle(event) == Flow::Stop {
                            break;
                        }
                    }
                    None => {
                        self.quit();
                        break;
                    }
                },
                result = &mut signal, if watch_signals => match result {
                    Ok(()) => {
                        msg_info!(Message::ReceivedShutdownSignal);
                        self.quit();
                        break;
                    }
                    Err(e) => {
                        msg_warning!(Message::SignalListenFailed(e.to_string()));
                        watch_signals = false;
                    }
                },
            }
        }
    }
}
