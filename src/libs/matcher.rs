//! Locating the idle cue on screen.
//!
//! [`ScreenMatcher`] is the seam the control loop searches through. The
//! desktop implementation, [`ScreenshotMatcher`], grabs a frame from a
//! [`FrameSource`] (the primary monitor via `xcap` by default) and runs
//! [`find_template`] over it.
//!
//! ## Scoring
//!
//! Candidates are scored with zero-mean normalized cross-correlation, so the
//! confidence threshold is a similarity in `0.0..=1.0` where `1.0` is a
//! pixel-exact match up to brightness and contrast. In grayscale mode the
//! frame and the reference are reduced to luma first; in color mode the three
//! channels are correlated together.
//!
//! The raw cross-correlation comes from `imageproc`; window sums and sums of
//! squares for the normalization come from integral images, so the only
//! per-pixel work left is the correlation itself. Cost still grows with
//! `search area x reference size`, which is why the control loop searches a
//! small region around the last match before falling back to the whole
//! screen.

use crate::libs::geometry::{Point, Region};
use image::imageops;
use image::{GrayImage, ImageBuffer, Luma, RgbaImage};
use imageproc::integral_image::{integral_image, integral_squared_image};
use imageproc::template_matching::{find_extremes, match_template, MatchTemplateMethod};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("reference image not found: {}", .0.display())]
    ReferenceMissing(PathBuf),
    #[error("reference image {} could not be decoded: {reason}", .path.display())]
    ReferenceUnreadable { path: PathBuf, reason: String },
    #[error("screen capture failed: {0}")]
    Capture(String),
}

impl MatchError {
    /// Capture failures usually clear up on their own (screen locked, display
    /// reconfigured); a broken reference image never does.
    pub fn is_transient(&self) -> bool {
        matches!(self, MatchError::Capture(_))
    }
}

pub trait ScreenMatcher {
    /// Center of the best match with a score of at least `confidence`.
    ///
    /// `region` is in screen coordinates; `None` searches the whole screen.
    fn locate(&mut self, region: Option<Region>, confidence: f32, grayscale: bool) -> Result<Option<Point>, MatchError>;
}

/// Checks that the reference image exists and decodes.
pub fn validate_reference(path: &Path) -> Result<(), MatchError> {
    load_reference(path).map(|_| ())
}

pub fn load_reference(path: &Path) -> Result<RgbaImage, MatchError> {
    if !path.exists() {
        return Err(MatchError::ReferenceMissing(path.to_path_buf()));
    }
    let image = image::open(path).map_err(|e| MatchError::ReferenceUnreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(image.to_rgba8())
}

/// A captured screen image and the screen coordinate of its top-left pixel.
pub struct Frame {
    pub origin: Point,
    pub image: RgbaImage,
}

pub trait FrameSource {
    fn capture(&mut self) -> Result<Frame, MatchError>;
}

/// Captures the primary monitor.
#[derive(Debug, Default)]
pub struct PrimaryMonitor;

impl FrameSource for PrimaryMonitor {
    fn capture(&mut self) -> Result<Frame, MatchError> {
        let monitors = xcap::Monitor::all().map_err(|e| MatchError::Capture(e.to_string()))?;
        let monitor = monitors
            .iter()
            .find(|m| m.is_primary())
            .or_else(|| monitors.first())
            .ok_or_else(|| MatchError::Capture("no monitor available".to_string()))?;
        let image = monitor.capture_image().map_err(|e| MatchError::Capture(e.to_string()))?;
        Ok(Frame {
            origin: Point::new(monitor.x(), monitor.y()),
            image,
        })
    }
}

pub struct ScreenshotMatcher<S: FrameSource = PrimaryMonitor> {
    reference: RgbaImage,
    source: S,
}

impl ScreenshotMatcher<PrimaryMonitor> {
    pub fn from_path(path: &Path) -> Result<Self, MatchError> {
        Ok(Self::new(load_reference(path)?, PrimaryMonitor))
    }
}

impl<S: FrameSource> ScreenshotMatcher<S> {
    pub fn new(reference: RgbaImage, source: S) -> Self {
        Self { reference, source }
    }
}

impl<S: FrameSource> ScreenMatcher for ScreenshotMatcher<S> {
    fn locate(&mut self, region: Option<Region>, confidence: f32, grayscale: bool) -> Result<Option<Point>, MatchError> {
        let frame = self.source.capture()?;
        // Translate the screen-space region into frame pixels.
        let area = region.map(|r| Region::new(r.left - frame.origin.x, r.top - frame.origin.y, r.width, r.height));
        let found = find_template(&frame.image, &self.reference, area, confidence, grayscale);
        debug!("template search in {:?}: {:?}", region, found);
        Ok(found.map(|(x, y)| Point::new(frame.origin.x + x as i32, frame.origin.y + y as i32)))
    }
}

type SumTable = ImageBuffer<Luma<u64>, Vec<u64>>;

/// One channel of the search: correlation map plus what is needed to
/// normalize it.
struct Plane {
    cross: ImageBuffer<Luma<f32>, Vec<f32>>,
    sums: SumTable,
    squares: SumTable,
    t_mean: f64,
    t_energy: f64,
}

impl Plane {
    fn new(haystack: &GrayImage, template: &GrayImage) -> Self {
        let n = f64::from(template.width() * template.height());
        let t_sum: f64 = template.pixels().map(|p| f64::from(p[0])).sum();
        let t_sum_sq: f64 = template.pixels().map(|p| f64::from(p[0]).powi(2)).sum();
        Self {
            cross: match_template(haystack, template, MatchTemplateMethod::CrossCorrelation),
            sums: integral_image::<_, u64>(haystack),
            squares: integral_squared_image::<_, u64>(haystack),
            t_mean: t_sum / n,
            t_energy: (t_sum_sq - t_sum * t_sum / n).max(0.0),
        }
    }
}

/// Sum over the `w` x `h` window whose top-left corner is (`x`, `y`).
fn window_sum(table: &SumTable, x: u32, y: u32, w: u32, h: u32) -> f64 {
    let at = |x: u32, y: u32| table.get_pixel(x, y)[0] as f64;
    at(x + w, y + h) - at(x, y + h) - at(x + w, y) + at(x, y)
}

/// Luma, or the red, green and blue channels as separate images.
fn channels(image: &RgbaImage, grayscale: bool) -> Vec<GrayImage> {
    if grayscale {
        return vec![imageops::grayscale(image)];
    }
    (0..3)
        .map(|c| GrayImage::from_fn(image.width(), image.height(), |x, y| Luma([image.get_pixel(x, y)[c]])))
        .collect()
}

const FLAT_EPSILON: f64 = 1e-6;

/// Finds `template` inside `haystack` and returns the center of the best
/// match in haystack pixels, provided its score reaches `confidence`.
///
/// `area` restricts the search to a rectangle of the haystack; it is clipped
/// to the image and a template that does not fit finds nothing.
pub fn find_template(haystack: &RgbaImage, template: &RgbaImage, area: Option<Region>, confidence: f32, grayscale: bool) -> Option<(u32, u32)> {
    let (hw, hh) = haystack.dimensions();
    let bounds = Region::new(0, 0, hw, hh);
    let area = match area {
        Some(area) => area.intersect(&bounds)?,
        None => bounds,
    };
    let (tw, th) = template.dimensions();
    if tw == 0 || th == 0 || tw > area.width || th > area.height {
        return None;
    }

    let view = imageops::crop_imm(haystack, area.left as u32, area.top as u32, area.width, area.height).to_image();
    let planes: Vec<Plane> = channels(&view, grayscale)
        .iter()
        .zip(channels(template, grayscale).iter())
        .map(|(h, t)| Plane::new(h, t))
        .collect();
    let n = f64::from(tw * th);
    let t_energy: f64 = planes.iter().map(|p| p.t_energy).sum();

    let scores = ImageBuffer::from_fn(area.width - tw + 1, area.height - th + 1, |ox, oy| {
        let mut cross = 0.0;
        let mut variance = 0.0;
        let mut means_match = true;
        for plane in &planes {
            let sum = window_sum(&plane.sums, ox, oy, tw, th);
            let sum_sq = window_sum(&plane.squares, ox, oy, tw, th);
            cross += f64::from(plane.cross.get_pixel(ox, oy)[0]) - plane.t_mean * sum;
            variance += (sum_sq - sum * sum / n).max(0.0);
            means_match &= (sum / n - plane.t_mean).abs() < 0.5;
        }

        let score = if t_energy <= FLAT_EPSILON || variance <= FLAT_EPSILON {
            // Uniform patches carry no structure to correlate.
            if t_energy <= FLAT_EPSILON && variance <= FLAT_EPSILON && means_match {
                1.0
            } else {
                0.0
            }
        } else {
            cross / (t_energy * variance).sqrt()
        };
        Luma([score as f32])
    });

    let best = find_extremes(&scores);
    let (ox, oy) = best.max_value_location;
    debug!("best template score {:.3} at ({}, {})", best.max_value, ox, oy);
    if f64::from(best.max_value) + 1e-6 < f64::from(confidence) {
        return None;
    }
    Some((area.left as u32 + ox + tw / 2, area.top as u32 + oy + th / 2))
}
