//! The idle-detection and action-dispatch loop.
//!
//! One call to [`ControlLoop::process_cycle`] makes one decision:
//!
//! ```text
//! paused? ──yes──▶ sleep 1s, Paused (no further rest)
//!    │no
//! cooling down? ──yes──▶ CoolingDown
//!    │no
//! search region around last match ──miss──▶ search full screen ──miss──▶ NotFound
//!    │hit                                        │hit
//!    ▼                                           ▼
//! remember match; operator active? ──yes──▶ UserActive
//!    │no
//! click, type, confirm, restore pointer ──▶ Acted
//! (dry run: move to the target, nudge, restore ──▶ DryRun)
//! ```
//!
//! [`ControlLoop::run`] repeats cycles until the session stops running,
//! resting between cycles and backing off after errors.

use crate::libs::actuator::{InputActuator, InputError};
use crate::libs::clock::Clock;
use crate::libs::config::ActionConfig;
use crate::libs::data_storage::APP_NAME;
use crate::libs::geometry::{Point, Region};
use crate::libs::matcher::{MatchError, ScreenMatcher};
use crate::libs::messages::Message;
use crate::libs::notifier::Notifier;
use crate::libs::session::{SessionEvent, SessionState};
use crate::{msg_error, msg_info, msg_success, msg_warning};
use anyhow::Result;
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Sleep of a paused cycle.
pub const PAUSED_SLEEP: Duration = Duration::from_secs(1);
/// Wait between the click and typing, so the target field can take focus.
pub const CLICK_SETTLE: Duration = Duration::from_millis(200);
/// Rest after a normal cycle.
pub const CYCLE_DELAY: Duration = Duration::from_secs(2);
/// Upper bound of the rest after failed cycles.
pub const MAX_BACKOFF: Duration = Duration::from_secs(5);
/// Horizontal nudge a dry run gives the pointer at the target, so the spot is easy to see.
pub const DRY_RUN_NUDGE: i32 = 10;
/// Slice the rest is cut into so a quit is noticed promptly.
pub const REST_SLICE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Paused,
    CoolingDown,
    NotFound,
    /// The search itself failed; counted as a miss.
    SearchFailed,
    /// The icon was found but the operator is using the pointer.
    UserActive,
    Acted { target: Point },
    DryRun { target: Point },
    /// Injection failed midway; the cooldown was not restarted.
    ActionFailed,
}

impl CycleOutcome {
    /// Whether an action, real or simulated, was executed.
    pub fn acted(&self) -> bool {
        matches!(self, CycleOutcome::Acted { .. } | CycleOutcome::DryRun { .. })
    }
}

pub struct ControlLoop<M, A, C> {
    config: ActionConfig,
    state: Arc<SessionState>,
    matcher: M,
    actuator: A,
    clock: C,
    notifier: Box<dyn Notifier>,
    last_known_match: Option<Point>,
    search_failures: u32,
    events: Option<UnboundedSender<SessionEvent>>,
}

impl<M, A, C> ControlLoop<M, A, C>
where
    M: ScreenMatcher,
    A: InputActuator,
    C: Clock,
{
    pub fn new(config: ActionConfig, state: Arc<SessionState>, matcher: M, actuator: A, clock: C, notifier: Box<dyn Notifier>) -> Self {
        Self {
            config,
            state,
            matcher,
            actuator,
            clock,
            notifier,
            last_known_match: None,
            search_failures: 0,
            events: None,
        }
    }

    /// Reports dispatched actions to the session controller.
    pub fn with_events(mut self, events: UnboundedSender<SessionEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn last_known_match(&self) -> Option<Point> {
        self.last_known_match
    }

    pub fn config(&self) -> &ActionConfig {
        &self.config
    }

    /// Runs one decision cycle.
    ///
    /// Search and injection failures are absorbed into the outcome. An error
    /// is returned only for failures outside them, such as the activity
    /// sensor losing the pointer.
    pub fn process_cycle(&mut self) -> Result<CycleOutcome> {
        if self.state.is_paused() {
            self.clock.sleep(PAUSED_SLEEP);
            return Ok(CycleOutcome::Paused);
        }

        if let Some(last) = self.state.last_action_time() {
            let elapsed = self.clock.now().saturating_duration_since(last);
            if elapsed < self.config.cooldown {
                debug!("cooling down, {:?} left", self.config.cooldown - elapsed);
                return Ok(CycleOutcome::CoolingDown);
            }
        }

        let found = match self.search() {
            Ok(found) => {
                self.search_failures = 0;
                found
            }
            Err(e) => {
                self.search_failures = self.search_failures.saturating_add(1);
                if e.is_transient() {
                    msg_warning!(Message::SearchFailed(e.to_string()));
                } else {
                    msg_error!(Message::SearchFailed(e.to_string()));
                }
                return Ok(CycleOutcome::SearchFailed);
            }
        };

        let Some(found) = found else {
            return Ok(CycleOutcome::NotFound);
        };
        self.last_known_match = Some(found);
        debug!("idle cue at {}", found);

        if self.config.polite && self.config.activity.is_user_active(&self.actuator, &self.clock)? {
            msg_info!(Message::UserActiveSkipping);
            return Ok(CycleOutcome::UserActive);
        }

        let target = found + self.config.offset;
        if let Err(e) = self.dispatch(target) {
            msg_error!(Message::ActionFailed(e.to_string()));
            return Ok(CycleOutcome::ActionFailed);
        }
        self.state.record_action(self.clock.now());

        if self.config.dry_run {
            msg_info!(Message::DryRunAction(target));
            return Ok(CycleOutcome::DryRun { target });
        }

        msg_success!(Message::ActionPerformed(target));
        if self.config.notify {
            let body = Message::ActionNotification(Local::now().format("%H:%M:%S").to_string());
            if let Err(e) = self.notifier.notify(APP_NAME, &body.to_string()) {
                msg_warning!(Message::NotificationFailed(e.to_string()));
            }
        }
        Ok(CycleOutcome::Acted { target })
    }

    /// Searches around the last match first, then the whole screen.
    fn search(&mut self) -> Result<Option<Point>, MatchError> {
        let (confidence, grayscale) = (self.config.confidence, self.config.grayscale);
        if let Some(last) = self.last_known_match {
            let region = Region::centered_on(last, self.config.region_size);
            if let Some(point) = self.matcher.locate(Some(region), confidence, grayscale)? {
                return Ok(Some(point));
            }
            debug!("not found near {}, searching the full screen", last);
        }
        self.matcher.locate(None, confidence, grayscale)
    }

    /// Clicks the target, types, confirms and puts the pointer back.
    ///
    /// The pointer is restored even when injection fails halfway.
    fn dispatch(&mut self, target: Point) -> Result<(), InputError> {
        let origin = self.actuator.position()?;
        let injected = self.inject(target);
        let restored = self.actuator.move_to(origin);
        injected?;
        restored
    }

    fn inject(&mut self, target: Point) -> Result<(), InputError> {
        if self.config.dry_run {
            self.actuator.move_to(target)?;
            self.actuator.move_relative(DRY_RUN_NUDGE, 0)?;
            return self.actuator.move_relative(-DRY_RUN_NUDGE, 0);
        }
        self.actuator.click(target)?;
        self.clock.sleep(CLICK_SETTLE);
        self.actuator.type_text(&self.config.text, self.config.type_interval)?;
        self.actuator.press_key(&self.config.confirm_key)
    }

    /// Rest after a cycle: 2 s, growing by a second per consecutive search
    /// failure up to 5 s.
    pub fn cycle_delay(&self) -> Duration {
        (CYCLE_DELAY + Duration::from_secs(u64::from(self.search_failures))).min(MAX_BACKOFF)
    }

    /// Rest after a cycle with `outcome`. A paused cycle already slept.
    pub fn delay_after(&self, outcome: CycleOutcome) -> Duration {
        match outcome {
            CycleOutcome::Paused => Duration::ZERO,
            _ => self.cycle_delay(),
        }
    }

    /// Repeats cycles until the session stops running.
    ///
    /// In single-shot mode the loop also ends after the first executed action.
    pub fn run(mut self) {
        log_start(&self.config);
        while self.state.is_running() {
            let delay = match self.process_cycle() {
                Ok(outcome) => {
                    if outcome.acted() {
                        self.report(outcome);
                        if self.config.single_shot {
                            break;
                        }
                    }
                    self.delay_after(outcome)
                }
                Err(e) => {
                    msg_error!(Message::CycleFailed(e.to_string()));
                    MAX_BACKOFF
                }
            };
            self.rest(delay);
        }
        debug!("control loop stopped");
    }

    fn report(&self, outcome: CycleOutcome) {
        let event = match outcome {
            CycleOutcome::Acted { target } => SessionEvent::ActionDispatched { target, simulated: false },
            CycleOutcome::DryRun { target } => SessionEvent::ActionDispatched { target, simulated: true },
            _ => return,
        };
        if let Some(events) = &self.events {
            if events.send(event).is_err() {
                debug!("session controller is gone");
            }
        }
    }

    fn rest(&self, total: Duration) {
        let mut left = total;
        while !left.is_zero() && self.state.is_running() {
            let step = left.min(REST_SLICE);
            self.clock.sleep(step);
            left -= step;
        }
    }
}

fn log_start(config: &ActionConfig) {
    debug!(
        "control loop: image={} cooldown={:?} offset={} polite={} dry_run={} once={}",
        config.image.display(),
        config.cooldown,
        config.offset,
        config.polite,
        config.dry_run,
        config.single_shot
    );
}
