use crate::libs::messages::Message;
use crate::libs::session::{SessionEvent, SessionSurface};
use crate::{msg_bail_anyhow, msg_error};
use anyhow::Result;
use rdev::{listen, Event, EventType, Key};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Parses a hotkey name such as `F8`, `pause` or `scrolllock`.
pub fn parse_hotkey(name: &str) -> Result<Key> {
    let key = match name.trim().to_lowercase().as_str() {
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,
        "pause" => Key::Pause,
        "scrolllock" | "scroll_lock" => Key::ScrollLock,
        "printscreen" | "print_screen" => Key::PrintScreen,
        "insert" => Key::Insert,
        "home" => Key::Home,
        "end" => Key::End,
        "pageup" | "page_up" => Key::PageUp,
        "pagedown" | "page_down" => Key::PageDown,
        _ => msg_bail_anyhow!(Message::UnknownHotkey(name.to_string())),
    };
    Ok(key)
}

/// The keys that drive the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hotkeys {
    pub pause: Key,
    pub quit: Key,
}

impl Hotkeys {
    pub fn parse(pause: &str, quit: &str) -> Result<Self> {
        let hotkeys = Self {
            pause: parse_hotkey(pause)?,
            quit: parse_hotkey(quit)?,
        };
        if hotkeys.pause == hotkeys.quit {
            msg_bail_anyhow!(Message::HotkeysCollide(pause.to_string()));
        }
        Ok(hotkeys)
    }

    /// Event for a key press, if the key is bound.
    pub fn event_for(&self, key: Key) -> Option<SessionEvent> {
        if key == self.pause {
            Some(SessionEvent::TogglePause)
        } else if key == self.quit {
            Some(SessionEvent::Quit)
        } else {
            None
        }
    }
}

/// Global keyboard hook feeding the session controller.
///
/// `rdev::listen` blocks its thread for the lifetime of the process and
/// cannot be cancelled, so [`SessionSurface::stop`] only makes the hook
/// drop further key presses.
pub struct HotkeySurface {
    stopped: Arc<AtomicBool>,
}

impl HotkeySurface {
    pub fn spawn(hotkeys: Hotkeys, events: UnboundedSender<SessionEvent>) -> Self {
        let stopped = Arc::new(AtomicBool::new(false));
        let flag = stopped.clone();
        thread::spawn(move || loop {
            let flag_for_listener = flag.clone();
            let sender = events.clone();
            let result = listen(move |event: Event| {
                if flag_for_listener.load(Ordering::SeqCst) {
                    return;
                }
                if let EventType::KeyPress(key) = event.event_type {
                    if let Some(session_event) = hotkeys.event_for(key) {
                        debug!("hotkey {:?} -> {:?}", key, session_event);
                        if sender.send(session_event).is_err() {
                            flag_for_listener.store(true, Ordering::SeqCst);
                        }
                    }
                }
            });
            match result {
                Err(e) if !flag.load(Ordering::SeqCst) => {
                    msg_error!(Message::HotkeyListenFailed(format!("{:?}", e)));
                    thread::sleep(Duration::from_secs(1));
                }
                _ => break,
            }
        });
        Self { stopped }
    }
}

impl SessionSurface for HotkeySurface {
    fn name(&self) -> &str {
        "hotkeys"
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_function_keys_case_insensitively() {
        assert_eq!(parse_hotkey("F8").unwrap(), Key::F8);
        assert_eq!(parse_hotkey("f9").unwrap(), Key::F9);
        assert!(parse_hotkey("hyper").is_err());
    }

    #[test]
    fn maps_bound_keys_to_events() {
        let hotkeys = Hotkeys::parse("F8", "F9").unwrap();
        assert_eq!(hotkeys.event_for(Key::F8), Some(SessionEvent::TogglePause));
        assert_eq!(hotkeys.event_for(Key::F9), Some(SessionEvent::Quit));
        assert_eq!(hotkeys.event_for(Key::KeyA), None);
    }

    #[test]
    fn rejects_the_same_key_for_both_actions() {
        assert!(Hotkeys::parse("F8", "f8").is_err());
    }
}
