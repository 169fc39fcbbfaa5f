//! Pixel rendering of the agent population.
//!
//! The engine never owns the drawable. Hosts hand in anything implementing
//! [`Surface`] (a canvas adapter, a framebuffer, or the bundled
//! [`PixelBuffer`]) and the [`Renderer`] plots one fixed-size marker per
//! agent in O(1), colored by health status.

use crate::components::HealthStatus;
use crate::error::UniverseError;
use serde::{Deserialize, Serialize};

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Pack as little-endian `u32` so the byte order in memory is R, G, B, A.
    pub const fn to_u32(self) -> u32 {
        u32::from_le_bytes([self.r, self.g, self.b, self.a])
    }

    pub const fn from_u32(packed: u32) -> Self {
        let [r, g, b, a] = packed.to_le_bytes();
        Self { r, g, b, a }
    }
}

/// Status to color mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub susceptible: Rgba,
    pub infected: Rgba,
    pub removed: Rgba,
    pub died: Rgba,
}

impl Palette {
    pub fn color(&self, status: HealthStatus) -> Rgba {
        match status {
            HealthStatus::Susceptible => self.susceptible,
            HealthStatus::Infected => self.infected,
            HealthStatus::Removed => self.removed,
            HealthStatus::Died => self.died,
        }
    }

    /// True when every status maps to its own color.
    pub fn is_distinct(&self) -> bool {
        let colors = HealthStatus::ALL.map(|s| self.color(s));
        (0..colors.len()).all(|i| (i + 1..colors.len()).all(|j| colors[i] != colors[j]))
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            susceptible: Rgba::rgb(0x4a, 0x90, 0xd9),
            infected: Rgba::rgb(0xe0, 0x3c, 0x31),
            removed: Rgba::rgb(0x5c, 0xb8, 0x5c),
            died: Rgba::rgb(0x33, 0x33, 0x33),
        }
    }
}

/// Rendering parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub palette: Palette,
    /// Marker edge length in pixels.
    pub marker_size: u32,
    pub background: Rgba,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            marker_size: 3,
            background: Rgba::rgb(0xff, 0xff, 0xff),
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), UniverseError> {
        if self.marker_size == 0 {
            return Err(UniverseError::InvalidConfig("marker_size must be at least 1"));
        }
        if !self.palette.is_distinct() {
            return Err(UniverseError::InvalidConfig(
                "palette colors must be distinct per status",
            ));
        }
        Ok(())
    }
}

/// A drawable target owned by the caller.
pub trait Surface {
    /// Surface extent in pixels, `(width, height)`.
    fn size(&self) -> (u32, u32);

    /// Fill the whole surface.
    fn clear(&mut self, color: Rgba);

    /// Fill an axis-aligned rectangle. Implementations clip to their bounds.
    fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: Rgba);
}

/// In-memory RGBA8 surface, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(Rgba::from_u32(
            self.pixels[y as usize * self.width as usize + x as usize],
        ))
    }

    /// Packed pixels, one `u32` per pixel.
    pub fn as_slice(&self) -> &[u32] {
        &self.pixels
    }

    /// Pixels as RGBA bytes, ready for an image upload.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.to_le_bytes()).collect()
    }

    /// Number of pixels currently holding `color`.
    pub fn count_color(&self, color: Rgba) -> usize {
        let packed = color.to_u32();
        self.pixels.iter().filter(|&&p| p == packed).count()
    }
}

impl Surface for PixelBuffer {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self, color: Rgba) {
        self.pixels.fill(color.to_u32());
    }

    fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: Rgba) {
        let x_end = x.saturating_add(width).min(self.width);
        let y_end = y.saturating_add(height).min(self.height);
        if x >= x_end || y >= y_end {
            return;
        }
        let packed = color.to_u32();
        let stride = self.width as usize;
        for row in y as usize..y_end as usize {
            self.pixels[row * stride + x as usize..row * stride + x_end as usize].fill(packed);
        }
    }
}

/// One agent as the renderer sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub x: f64,
    pub y: f64,
    pub status: HealthStatus,
}

/// Maps agent state to pixels on a [`Surface`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Clear `surface` and draw every marker, scaling the `plane` extent to
    /// the surface size. Died markers go first so living ones stay on top.
    pub fn draw<S, I>(&self, plane: (f64, f64), markers: I, surface: &mut S)
    where
        S: Surface + ?Sized,
        I: IntoIterator<Item = Marker>,
        I::IntoIter: Clone,
    {
        let markers = markers.into_iter();
        self.draw_with(plane, || markers.clone(), surface);
    }

    /// Like [`Renderer::draw`], but pulls markers from `markers()` once per
    /// layer, so callers can stream straight from their storage.
    pub fn draw_with<S, F, I>(&self, plane: (f64, f64), markers: F, surface: &mut S)
    where
        S: Surface + ?Sized,
        F: Fn() -> I,
        I: IntoIterator<Item = Marker>,
    {
        surface.clear(self.config.background);
        let (surface_w, surface_h) = surface.size();
        if surface_w == 0 || surface_h == 0 {
            return;
        }
        let scale_x = surface_w as f64 / plane.0;
        let scale_y = surface_h as f64 / plane.1;
        let size = self.config.marker_size;
        let half = (size / 2) as f64;

        let dead = markers()
            .into_iter()
            .filter(|m| m.status == HealthStatus::Died);
        let living = markers()
            .into_iter()
            .filter(|m| m.status != HealthStatus::Died);
        for marker in dead.chain(living) {
            let px = (marker.x * scale_x - half).max(0.0) as u32;
            let py = (marker.y * scale_y - half).max(0.0) as u32;
            surface.fill_rect(px, py, size, size, self.config.palette.color(marker.status));
        }
    }
}
