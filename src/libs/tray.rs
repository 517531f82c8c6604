//! Tray icon and menu, built with the `tray` feature.
//!
//! The `tao` event loop owns the main thread until the session is over. The
//! menu only produces [`SessionEvent`]s; the icon and labels change when the
//! controller reflects a new pause state through [`TraySurface`].

use crate::libs::autostart;
use crate::libs::indicator::{tray_image, ICON_SIZE};
use crate::libs::messages::Message;
use crate::libs::session::{SessionEvent, SessionSurface};
use crate::{msg_error, msg_warning};
use anyhow::{anyhow, Result};
use tao::event::{Event, StartCause};
use tao::event_loop::{ControlFlow, EventLoop, EventLoopBuilder, EventLoopProxy};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;
use tray_icon::menu::{CheckMenuItem, Menu, MenuEvent, MenuItem, PredefinedMenuItem};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

#[derive(Debug, Clone)]
pub enum TrayEvent {
    Menu(MenuEvent),
    Paused(bool),
    Exit,
}

fn icon(paused: bool) -> Result<Icon> {
    Icon::from_rgba(tray_image(paused).into_raw(), ICON_SIZE, ICON_SIZE).map_err(|e| anyhow!("tray icon: {}", e))
}

fn status_text(paused: bool) -> String {
    Message::StatusLine(paused).to_string()
}

fn toggle_text(paused: bool) -> &'static str {
    if paused {
        "Resume"
    } else {
        "Pause"
    }
}

/// Mirrors the pause state into the tray.
pub struct TraySurface {
    proxy: EventLoopProxy<TrayEvent>,
}

impl SessionSurface for TraySurface {
    fn name(&self) -> &str {
        "tray"
    }

    fn reflect_pause(&self, paused: bool) {
        if self.proxy.send_event(TrayEvent::Paused(paused)).is_err() {
            debug!("tray event loop already closed");
        }
    }
}

/// Closes the tray once the control loop has finished.
#[derive(Clone)]
pub struct TrayHandle {
    proxy: EventLoopProxy<TrayEvent>,
}

impl TrayHandle {
    pub fn exit(&self) {
        if self.proxy.send_event(TrayEvent::Exit).is_err() {
            debug!("tray event loop already closed");
        }
    }
}

pub struct Tray {
    event_loop: EventLoop<TrayEvent>,
}

impl Tray {
    /// Must be called on the main thread.
    pub fn new() -> Self {
        Self {
            event_loop: EventLoopBuilder::<TrayEvent>::with_user_event().build(),
        }
    }

    pub fn surface(&self) -> TraySurface {
        TraySurface {
            proxy: self.event_loop.create_proxy(),
        }
    }

    pub fn handle(&self) -> TrayHandle {
        TrayHandle {
            proxy: self.event_loop.create_proxy(),
        }
    }

    /// Runs the tray until [`TrayHandle::exit`]; the process ends with it.
    pub fn run(self, events: UnboundedSender<SessionEvent>, initially_paused: bool) -> ! {
        let proxy = self.event_loop.create_proxy();
        MenuEvent::set_event_handler(Some(move |event| {
            let _ = proxy.send_event(TrayEvent::Menu(event));
        }));

        let status_item = MenuItem::new(status_text(initially_paused), false, None);
        let toggle_item = MenuItem::new(toggle_text(initially_paused), true, None);
        let autostart_item = CheckMenuItem::new("Run on startup", true, autostart::is_enabled().unwrap_or(false), None);
        let quit_item = MenuItem::new("Quit", true, None);

        let menu = Menu::new();
        let built = menu
            .append(&status_item)
            .and_then(|_| menu.append(&PredefinedMenuItem::separator()))
            .and_then(|_| menu.append(&toggle_item))
            .and_then(|_| menu.append(&autostart_item))
            .and_then(|_| menu.append(&PredefinedMenuItem::separator()))
            .and_then(|_| menu.append(&quit_item));
        if let Err(e) = built {
            msg_error!(Message::TrayFailed(e.to_string()));
        }

        let mut tray_icon: Option<TrayIcon> = None;

        self.event_loop.run(move |event, _target, control_flow| {
            *control_flow = ControlFlow::Wait;

            match event {
                Event::NewEvents(StartCause::Init) => {
                    let built = icon(initially_paused).and_then(|icon| {
                        TrayIconBuilder::new()
                            .with_menu(Box::new(menu.clone()))
                            .with_tooltip(crate::libs::data_storage::APP_NAME)
                            .with_icon(icon)
                            .build()
                            .map_err(|e| anyhow!("{}", e))
                    });
                    match built {
                        Ok(built) => tray_icon = Some(built),
                        Err(e) => msg_error!(Message::TrayFailed(e.to_string())),
                    }
                }
                Event::UserEvent(TrayEvent::Menu(menu_event)) => {
                    let session_event = if menu_event.id == toggle_item.id() {
                        Some(SessionEvent::TogglePause)
                    } else if menu_event.id == quit_item.id() {
                        Some(SessionEvent::Quit)
                    } else if menu_event.id == autostart_item.id() {
                        if let Err(e) = autostart::toggle() {
                            msg_warning!(Message::AutostartToggleFailed(e.to_string()));
                        }
                        autostart_item.set_checked(autostart::is_enabled().unwrap_or(false));
                        None
                    } else {
                        None
                    };
                    if let Some(session_event) = session_event {
                        if events.send(session_event).is_err() {
                            *control_flow = ControlFlow::Exit;
                        }
                    }
                }
                Event::UserEvent(TrayEvent::Paused(paused)) => {
                    status_item.set_text(status_text(paused));
                    toggle_item.set_text(toggle_text(paused));
                    if let Some(tray) = &tray_icon {
                        match icon(paused) {
                            Ok(icon) => {
                                if let Err(e) = tray.set_icon(Some(icon)) {
                                    debug!("tray icon update failed: {}", e);
                                }
                            }
                            Err(e) => debug!("{}", e),
                        }
                    }
                }
                Event::UserEvent(TrayEvent::Exit) => {
                    tray_icon = None;
                    *control_flow = ControlFlow::Exit;
                }
                _ => {}
            }
        })
    }
}

impl Default for Tray {
    fn default() -> Self {
        Self::new()
    }
}
