//! Fakes for the desktop seams, shared by the integration tests.
#![allow(dead_code)]

use autocontinue::libs::actuator::{InputActuator, InputError, PointerPosition};
use autocontinue::libs::calibration::Prompt;
use autocontinue::libs::clock::Clock;
use autocontinue::libs::config::ActionConfig;
use autocontinue::libs::control::ControlLoop;
use autocontinue::libs::geometry::{Point, Region};
use autocontinue::libs::matcher::{MatchError, ScreenMatcher};
use autocontinue::libs::notifier::Notifier;
use autocontinue::libs::session::{SessionState, SessionSurface};
use image::{Rgba, RgbaImage};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Manual clock: `sleep` advances time instantly and is recorded.
///
/// With [`FakeClock::quit_after`] the clock asks the session to quit once
/// enough sleeps have passed, which ends a running loop.
#[derive(Clone)]
pub struct FakeClock {
    inner: Arc<Mutex<ClockInner>>,
}

struct ClockInner {
    now: Instant,
    sleeps: Vec<Duration>,
    quit_after: Option<(Arc<SessionState>, usize)>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ClockInner {
                now: Instant::now(),
                sleeps: Vec::new(),
                quit_after: None,
            })),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.inner.lock().unwrap().now += by;
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.inner.lock().unwrap().sleeps.clone()
    }

    pub fn quit_after(&self, state: Arc<SessionState>, sleeps: usize) {
        self.inner.lock().unwrap().quit_after = Some((state, sleeps));
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.inner.lock().unwrap().now
    }

    fn sleep(&self, duration: Duration) {
        let mut inner = self.inner.lock().unwrap();
        inner.now += duration;
        inner.sleeps.push(duration);
        if let Some((state, limit)) = &inner.quit_after {
            if inner.sleeps.len() >= *limit {
                state.request_quit();
            }
        }
    }
}

/// Matcher answering from a script, then from a default.
#[derive(Clone, Default)]
pub struct FakeMatcher {
    inner: Arc<Mutex<MatcherInner>>,
}

#[derive(Default)]
struct MatcherInner {
    script: VecDeque<Result<Option<Point>, MatchError>>,
    default: Option<Point>,
    calls: Vec<Option<Region>>,
}

impl FakeMatcher {
    /// Every search finds the icon at `point`.
    pub fn always(point: Point) -> Self {
        let matcher = Self::default();
        matcher.set_default(Some(point));
        matcher
    }

    pub fn set_default(&self, point: Option<Point>) {
        self.inner.lock().unwrap().default = point;
    }

    pub fn push(&self, response: Result<Option<Point>, MatchError>) {
        self.inner.lock().unwrap().script.push_back(response);
    }

    /// Regions searched so far; `None` is a full-screen search.
    pub fn calls(&self) -> Vec<Option<Region>> {
        self.inner.lock().unwrap().calls.clone()
    }
}

impl ScreenMatcher for FakeMatcher {
    fn locate(&mut self, region: Option<Region>, _confidence: f32, _grayscale: bool) -> Result<Option<Point>, MatchError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(region);
        match inner.script.pop_front() {
            Some(response) => response,
            None => Ok(inner.default),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    MoveTo(Point),
    MoveBy(i32, i32),
    Click(Point),
    Type(String),
    Press(String),
}

/// Pointer and keyboard recorder.
///
/// `position()` first drains the queued samples, then reports wherever the
/// last move left the pointer.
#[derive(Clone)]
pub struct FakeActuator {
    inner: Arc<Mutex<ActuatorInner>>,
}

struct ActuatorInner {
    pointer: Point,
    samples: VecDeque<Point>,
    position_reads: usize,
    inputs: Vec<Input>,
    fail_typing: bool,
    fail_position: bool,
}

impl FakeActuator {
    pub fn at(pointer: Point) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ActuatorInner {
                pointer,
                samples: VecDeque::new(),
                position_reads: 0,
                inputs: Vec::new(),
                fail_typing: false,
                fail_position: false,
            })),
        }
    }

    pub fn queue_samples(&self, samples: &[Point]) {
        self.inner.lock().unwrap().samples.extend(samples.iter().copied());
    }

    pub fn set_pointer(&self, point: Point) {
        self.inner.lock().unwrap().pointer = point;
    }

    pub fn pointer(&self) -> Point {
        self.inner.lock().unwrap().pointer
    }

    pub fn fail_typing(&self) {
        self.inner.lock().unwrap().fail_typing = true;
    }

    pub fn fail_position(&self) {
        self.inner.lock().unwrap().fail_position = true;
    }

    pub fn inputs(&self) -> Vec<Input> {
        self.inner.lock().unwrap().inputs.clone()
    }

    pub fn position_reads(&self) -> usize {
        self.inner.lock().unwrap().position_reads
    }

    pub fn clicked(&self) -> bool {
        self.inputs().iter().any(|i| matches!(i, Input::Click(_)))
    }

    pub fn typed(&self) -> bool {
        self.inputs().iter().any(|i| matches!(i, Input::Type(_)))
    }
}

impl PointerPosition for FakeActuator {
    fn position(&self) -> Result<Point, InputError> {
        let mut inner = self.inner.lock().unwrap();
        inner.position_reads += 1;
        if inner.fail_position {
            return Err(InputError::Unavailable("pointer query refused".to_string()));
        }
        Ok(inner.samples.pop_front().unwrap_or(inner.pointer))
    }
}

impl InputActuator for FakeActuator {
    fn move_to(&mut self, point: Point) -> Result<(), InputError> {
        let mut inner = self.inner.lock().unwrap();
        inner.pointer = point;
        inner.inputs.push(Input::MoveTo(point));
        Ok(())
    }

    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<(), InputError> {
        let mut inner = self.inner.lock().unwrap();
        inner.pointer = Point::new(inner.pointer.x + dx, inner.pointer.y + dy);
        inner.inputs.push(Input::MoveBy(dx, dy));
        Ok(())
    }

    fn click(&mut self, point: Point) -> Result<(), InputError> {
        let mut inner = self.inner.lock().unwrap();
        inner.pointer = point;
        inner.inputs.push(Input::Click(point));
        Ok(())
    }

    fn type_text(&mut self, text: &str, _interval: Duration) -> Result<(), InputError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_typing {
            return Err(InputError::Injection("keyboard went away".to_string()));
        }
        inner.inputs.push(Input::Type(text.to_string()));
        Ok(())
    }

    fn press_key(&mut self, name: &str) -> Result<(), InputError> {
        self.inner.lock().unwrap().inputs.push(Input::Press(name.to_string()));
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, message: &str) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push((title.to_string(), message.to_string()));
        Ok(())
    }
}

/// Records what the controller asked a surface to do.
#[derive(Clone, Default)]
pub struct RecordingSurface {
    pub log: Arc<Mutex<Vec<String>>>,
}

impl RecordingSurface {
    pub fn entries(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

impl SessionSurface for RecordingSurface {
    fn name(&self) -> &str {
        "recording"
    }

    fn reflect_pause(&self, paused: bool) {
        self.log.lock().unwrap().push(format!("paused={}", paused));
    }

    fn stop(&self) {
        self.log.lock().unwrap().push("stop".to_string());
    }
}

/// Moves the fake pointer to the next scripted spot whenever the operator
/// "presses Enter".
pub struct ScriptedPrompt {
    pub pointer: FakeActuator,
    pub spots: VecDeque<Point>,
    pub shown: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new(pointer: FakeActuator, spots: &[Point]) -> Self {
        Self {
            pointer,
            spots: spots.iter().copied().collect(),
            shown: Vec::new(),
        }
    }
}

impl Prompt for ScriptedPrompt {
    fn wait(&mut self, instruction: &str) -> anyhow::Result<()> {
        self.shown.push(instruction.to_string());
        if let Some(spot) = self.spots.pop_front() {
            self.pointer.set_pointer(spot);
        }
        Ok(())
    }
}

/// A control loop over fakes, with handles to inspect them.
pub struct Rig {
    pub state: Arc<SessionState>,
    pub matcher: FakeMatcher,
    pub actuator: FakeActuator,
    pub clock: FakeClock,
    pub notifier: RecordingNotifier,
}

impl Rig {
    /// A resumed session with the pointer resting at (1000, 700).
    pub fn new(matcher: FakeMatcher) -> Self {
        let state = Arc::new(SessionState::new());
        state.request_resume();
        Self {
            state,
            matcher,
            actuator: FakeActuator::at(Point::new(1000, 700)),
            clock: FakeClock::new(),
            notifier: RecordingNotifier::default(),
        }
    }

    pub fn control_loop(&self, config: ActionConfig) -> ControlLoop<FakeMatcher, FakeActuator, FakeClock> {
        ControlLoop::new(
            config,
            self.state.clone(),
            self.matcher.clone(),
            self.actuator.clone(),
            self.clock.clone(),
            Box::new(self.notifier.clone()),
        )
    }
}

/// Cooldown 15 s, offset (-200, -50), polite mode off.
pub fn impolite_config() -> ActionConfig {
    ActionConfig {
        polite: false,
        ..ActionConfig::default()
    }
}

/// Deterministic texture, so correlation away from the true match stays low.
pub fn noise_image(width: u32, height: u32, seed: u32) -> RgbaImage {
    let mut state = seed.wrapping_mul(2654435761).wrapping_add(1);
    RgbaImage::from_fn(width, height, |_, _| {
        let mut next = || {
            state = state.wrapping_mul(1664525).wrapping_add(1013904223);
            (state >> 24) as u8
        };
        Rgba([next(), next(), next(), 255])
    })
}

pub fn paste(target: &mut RgbaImage, patch: &RgbaImage, left: u32, top: u32) {
    for (x, y, pixel) in patch.enumerate_pixels() {
        target.put_pixel(left + x, top + y, *pixel);
    }
}
