use crate::libs::actuator::{InputError, PointerPosition};
use crate::libs::clock::Clock;
use std::time::Duration;
use tracing::debug;

/// Detects whether the operator is moving the pointer.
///
/// Takes two pointer samples `window` apart and reports activity when the
/// pointer travelled further than `threshold` pixels. The check blocks the
/// caller for the whole window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivitySensor {
    pub window: Duration,
    pub threshold: f64,
}

impl Default for ActivitySensor {
    fn default() -> Self {
        Self {
            window: Duration::from_millis(500),
            threshold: 5.0,
        }
    }
}

impl ActivitySensor {
    pub fn new(window: Duration, threshold: f64) -> Self {
        Self { window, threshold }
    }

    pub fn is_user_active<P, C>(&self, pointer: &P, clock: &C) -> Result<bool, InputError>
    where
        P: PointerPosition + ?Sized,
        C: Clock + ?Sized,
    {
        let before = pointer.position()?;
        clock.sleep(self.window);
        let after = pointer.position()?;
        let moved = before.distance_to(after);
        debug!("pointer moved {:.1}px in {:?}", moved, self.window);
        Ok(moved > self.threshold)
    }
}
