//! Pointer and keyboard injection.
//!
//! The control loop, the activity sensor and the calibration wizard only see
//! the [`PointerPosition`] and [`InputActuator`] traits. [`EnigoActuator`] is
//! the desktop backend built on `enigo`.

use crate::libs::geometry::Point;
use enigo::{Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("input backend unavailable: {0}")]
    Unavailable(String),
    #[error("input injection failed: {0}")]
    Injection(String),
    #[error("unknown key name '{0}'")]
    UnknownKey(String),
}

/// Read access to the pointer, all the activity sensor and the wizard need.
pub trait PointerPosition {
    fn position(&self) -> Result<Point, InputError>;
}

/// Blocking input primitives with no built-in retry.
pub trait InputActuator: PointerPosition {
    fn move_to(&mut self, point: Point) -> Result<(), InputError>;
    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<(), InputError>;
    fn click(&mut self, point: Point) -> Result<(), InputError>;
    /// Types `text`, waiting `interval` between characters.
    fn type_text(&mut self, text: &str, interval: Duration) -> Result<(), InputError>;
    fn press_key(&mut self, name: &str) -> Result<(), InputError>;
}

/// Maps a configured key name (`enter`, `tab`, `escape`, ...) to an enigo key.
pub fn parse_key(name: &str) -> Result<Key, InputError> {
    let lowered = name.trim().to_lowercase();
    let key = match lowered.as_str() {
        "enter" | "return" => Key::Return,
        "tab" => Key::Tab,
        "escape" | "esc" => Key::Escape,
        "space" => Key::Space,
        "backspace" => Key::Backspace,
        _ => {
            let mut chars = lowered.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Key::Unicode(c),
                _ => return Err(InputError::UnknownKey(name.to_string())),
            }
        }
    };
    Ok(key)
}

pub struct EnigoActuator {
    enigo: Enigo,
}

impl EnigoActuator {
    pub fn new() -> Result<Self, InputError> {
        let enigo = Enigo::new(&Settings::default()).map_err(|e| InputError::Unavailable(e.to_string()))?;
        Ok(Self { enigo })
    }
}

fn injection<E: std::fmt::Display>(e: E) -> InputError {
    InputError::Injection(e.to_string())
}

impl PointerPosition for EnigoActuator {
    fn position(&self) -> Result<Point, InputError> {
        let (x, y) = self.enigo.location().map_err(injection)?;
        Ok(Point::new(x, y))
    }
}

impl InputActuator for EnigoActuator {
    fn move_to(&mut self, point: Point) -> Result<(), InputError> {
        debug!("move_to {}", point);
        self.enigo.move_mouse(point.x, point.y, Coordinate::Abs).map_err(injection)
    }

    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<(), InputError> {
        self.enigo.move_mouse(dx, dy, Coordinate::Rel).map_err(injection)
    }

    fn click(&mut self, point: Point) -> Result<(), InputError> {
        debug!("click {}", point);
        self.move_to(point)?;
        self.enigo.button(Button::Left, Direction::Click).map_err(injection)
    }

    fn type_text(&mut self, text: &str, interval: Duration) -> Result<(), InputError> {
        if interval.is_zero() {
            return self.enigo.text(text).map_err(injection);
        }
        let mut buf = [0u8; 4];
        for c in text.chars() {
            self.enigo.text(c.encode_utf8(&mut buf)).map_err(injection)?;
            thread::sleep(interval);
        }
        Ok(())
    }

    fn press_key(&mut self, name: &str) -> Result<(), InputError> {
        let key = parse_key(name)?;
        self.enigo.key(key, Direction::Click).map_err(injection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_and_single_char_keys() {
        assert!(matches!(parse_key("Enter"), Ok(Key::Return)));
        assert!(matches!(parse_key("esc"), Ok(Key::Escape)));
        assert!(matches!(parse_key("a"), Ok(Key::Unicode('a'))));
        assert!(matches!(parse_key("hyper"), Err(InputError::UnknownKey(_))));
    }
}
