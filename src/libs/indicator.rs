//! Pause-state indicators.

use crate::libs::config::resolve_resource;
use crate::libs::messages::Message;
use crate::libs::session::SessionSurface;
use crate::msg_print;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use std::path::Path;
use tracing::debug;

pub const ICON_SIZE: u32 = 64;

/// Optional artwork shipped next to the executable.
pub const ICON_FILE: &str = "icon.png";

const BADGE_RADIUS: f32 = 10.0;

const PAUSED_COLOR: Rgba<u8> = Rgba([220, 53, 69, 255]);
const ACTIVE_COLOR: Rgba<u8> = Rgba([40, 167, 69, 255]);
const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Red disc while paused, green disc while scanning, on a transparent square.
pub fn render_icon(paused: bool) -> RgbaImage {
    let color = if paused { PAUSED_COLOR } else { ACTIVE_COLOR };
    let center = (ICON_SIZE as f32 - 1.0) / 2.0;
    let radius = ICON_SIZE as f32 / 2.0 - 4.0;
    RgbaImage::from_fn(ICON_SIZE, ICON_SIZE, |x, y| {
        let dx = x as f32 - center;
        let dy = y as f32 - center;
        if dx.hypot(dy) <= radius {
            color
        } else {
            TRANSPARENT
        }
    })
}

/// Tray artwork: the bundled [`ICON_FILE`] when present, the generated disc
/// otherwise.
pub fn tray_image(paused: bool) -> RgbaImage {
    icon_from(&resolve_resource(Path::new(ICON_FILE)), paused)
}

/// Loads `path` scaled to [`ICON_SIZE`] with a status badge in the
/// bottom-right corner, or falls back to [`render_icon`].
pub fn icon_from(path: &Path, paused: bool) -> RgbaImage {
    if !path.exists() {
        return render_icon(paused);
    }
    match image::open(path) {
        Ok(artwork) => {
            let mut icon = imageops::resize(&artwork.to_rgba8(), ICON_SIZE, ICON_SIZE, FilterType::Nearest);
            draw_badge(&mut icon, paused);
            icon
        }
        Err(e) => {
            debug!("ignoring {}: {}", path.display(), e);
            render_icon(paused)
        }
    }
}

fn draw_badge(icon: &mut RgbaImage, paused: bool) {
    let color = if paused { PAUSED_COLOR } else { ACTIVE_COLOR };
    let center = ICON_SIZE as f32 - BADGE_RADIUS - 1.0;
    for (x, y, pixel) in icon.enumerate_pixels_mut() {
        if (x as f32 - center).hypot(y as f32 - center) <= BADGE_RADIUS {
            *pixel = color;
        }
    }
}

/// Status line used when no tray icon is shown.
#[derive(Debug, Default)]
pub struct LogSurface;

impl SessionSurface for LogSurface {
    fn name(&self) -> &str {
        "console"
    }

    fn reflect_pause(&self, paused: bool) {
        msg_print!(Message::StatusLine(paused));
    }
}
