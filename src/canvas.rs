//! Pixel surface the show draws on, presented to the terminal as half blocks.
//!
//! Drawing calls take viewport units; `scale` viewport units make one pixel
//! and every terminal cell holds two pixels stacked vertically.

use crate::color::Rgb;
use std::io::Write;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Blend {
    SourceOver,
    /// Additive, clamped at full intensity.
    Lighter,
}

#[derive(Clone, Copy, Debug)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Rgb,
    pub alpha: f32,
}

impl GradientStop {
    pub const fn new(offset: f32, color: Rgb, alpha: f32) -> Self {
        Self { offset, color, alpha }
    }
}

/// Text drawn over the frame at a fixed terminal cell.
#[derive(Clone, Debug, PartialEq)]
pub struct Overlay {
    pub column: u16,
    pub row: u16,
    pub text: String,
    pub fg: Rgb,
    pub bg: Rgb,
}

/// Whether there is anything to draw on, decided once at start-up.
pub enum Capability {
    Enabled(Canvas),
    Disabled(String),
}

impl Capability {
    pub fn probe(is_terminal: bool, size: std::io::Result<(u16, u16)>, scale: f32) -> Self {
        if !is_terminal {
            return Capability::Disabled("stdout is not a terminal".to_string());
        }
        let (cols, rows) = match size {
            Ok(size) => size,
            Err(err) => return Capability::Disabled(format!("cannot read terminal size: {}", err)),
        };
        match Canvas::new(cols as usize, rows as usize, scale) {
            Some(canvas) => Capability::Enabled(canvas),
            None => Capability::Disabled(format!("no drawable area ({}x{} cells)", cols, rows)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Capability::Enabled(_))
    }
}

pub struct Canvas {
    cols: usize,
    rows: usize,
    width: usize,
    height: usize,
    scale: f32,
    pixels: Vec<(f32, f32, f32)>,
    output_buf: Vec<u8>,
}

impl Canvas {
    /// Returns `None` when the terminal has no drawable area.
    pub fn new(cols: usize, rows: usize, scale: f32) -> Option<Self> {
        if cols == 0 || rows == 0 || !(scale > 0.0) {
            return None;
        }
        let width = cols;
        let height = rows * 2;
        Some(Self {
            cols,
            rows,
            width,
            height,
            scale,
            pixels: vec![(0.0, 0.0, 0.0); width * height],
            output_buf: Vec::with_capacity(width * height * 25),
        })
    }

    /// Resizes to a new terminal size, discarding the previous frame.
    /// Returns false (and keeps the old size) for a zero-sized terminal.
    pub fn resize(&mut self, cols: usize, rows: usize) -> bool {
        if cols == 0 || rows == 0 {
            return false;
        }
        self.cols = cols;
        self.rows = rows;
        self.width = cols;
        self.height = rows * 2;
        self.pixels = vec![(0.0, 0.0, 0.0); self.width * self.height];
        self.output_buf = Vec::with_capacity(self.width * self.height * 25);
        true
    }

    /// Drawable extents in viewport units.
    pub fn viewport(&self) -> (f32, f32) {
        (self.width as f32 * self.scale, self.height as f32 * self.scale)
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn cell_size(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    pub fn pixel(&self, x: usize, y: usize) -> Rgb {
        let (r, g, b) = self.pixels[y * self.width + x];
        (r as u8, g as u8, b as u8)
    }

    /// Paints the whole surface with `color` at `alpha`.
    pub fn fill(&mut self, color: Rgb, alpha: f32) {
        let alpha = alpha.clamp(0.0, 1.0);
        for pixel in &mut self.pixels {
            blend(pixel, channels(color), alpha, Blend::SourceOver);
        }
    }

    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgb, alpha: f32) {
        let alpha = alpha.clamp(0.0, 1.0);
        if alpha <= 0.0 || radius <= 0.0 {
            return;
        }
        let Some((x0, y0, x1, y1)) = self.pixel_bounds(cx, cy, radius) else {
            return;
        };
        for py in y0..=y1 {
            for px in x0..=x1 {
                if self.nearest_distance(px, py, cx, cy) <= radius {
                    let idx = py * self.width + px;
                    blend(&mut self.pixels[idx], channels(color), alpha, Blend::SourceOver);
                }
            }
        }
    }

    /// Outline of width `line_width` centred on the circle's edge.
    pub fn stroke_circle(&mut self, cx: f32, cy: f32, radius: f32, line_width: f32, color: Rgb, alpha: f32) {
        let half = line_width / 2.0;
        let Some((x0, y0, x1, y1)) = self.pixel_bounds(cx, cy, radius + half) else {
            return;
        };
        for py in y0..=y1 {
            for px in x0..=x1 {
                let near = self.nearest_distance(px, py, cx, cy);
                let far = self.farthest_distance(px, py, cx, cy);
                if near <= radius + half && far >= radius - half {
                    let idx = py * self.width + px;
                    blend(&mut self.pixels[idx], channels(color), alpha, Blend::SourceOver);
                }
            }
        }
    }

    /// Radial gradient from `inner` to `outer` radius. Stops must be sorted
    /// by offset.
    pub fn fill_radial(
        &mut self,
        cx: f32,
        cy: f32,
        inner: f32,
        outer: f32,
        stops: &[GradientStop],
        mode: Blend,
    ) {
        if stops.is_empty() || outer <= 0.0 {
            return;
        }
        let Some((x0, y0, x1, y1)) = self.pixel_bounds(cx, cy, outer) else {
            return;
        };
        let span = outer - inner;
        for py in y0..=y1 {
            for px in x0..=x1 {
                let d = self.nearest_distance(px, py, cx, cy);
                if d > outer {
                    continue;
                }
                let t = if span <= 0.0 { 0.0 } else { ((d - inner) / span).clamp(0.0, 1.0) };
                let (color, alpha) = sample(stops, t);
                if alpha <= 0.0 {
                    continue;
                }
                let idx = py * self.width + px;
                blend(&mut self.pixels[idx], color, alpha, mode);
            }
        }
    }

    /// Fills every pixel whose centre lies on or below `surface(x)`.
    pub fn fill_below(&mut self, surface: impl Fn(f32) -> f32, color: Rgb, alpha: f32) {
        let alpha = alpha.clamp(0.0, 1.0);
        for px in 0..self.width {
            let top = surface((px as f32 + 0.5) * self.scale);
            for py in 0..self.height {
                if (py as f32 + 0.5) * self.scale >= top {
                    let idx = py * self.width + px;
                    blend(&mut self.pixels[idx], channels(color), alpha, Blend::SourceOver);
                }
            }
        }
    }

    pub fn present<W: Write>(&mut self, out: &mut W, overlays: &[Overlay]) -> std::io::Result<()> {
        self.output_buf.clear();
        self.output_buf.extend_from_slice(b"\x1b[H");

        let mut prev_top_color: Rgb = (255, 255, 255);
        let mut prev_bot_color: Rgb = (255, 255, 255);

        for y in (0..self.height).step_by(2) {
            for x in 0..self.width {
                let top_color = self.pixel(x, y);
                let bot_color = if y + 1 < self.height { self.pixel(x, y + 1) } else { top_color };

                if top_color != prev_top_color {
                    write!(
                        self.output_buf,
                        "\x1b[48;2;{};{};{}m",
                        top_color.0, top_color.1, top_color.2
                    )?;
                    prev_top_color = top_color;
                }
                if bot_color != prev_bot_color {
                    write!(
                        self.output_buf,
                        "\x1b[38;2;{};{};{}m",
                        bot_color.0, bot_color.1, bot_color.2
                    )?;
                    prev_bot_color = bot_color;
                }

                self.output_buf.extend_from_slice("▄".as_bytes());
            }
            self.output_buf.extend_from_slice(b"\x1b[0m");
            prev_top_color = (255, 255, 255);
            prev_bot_color = (255, 255, 255);
            if y + 2 < self.height {
                self.output_buf.extend_from_slice(b"\r\n");
            }
        }

        for overlay in overlays {
            let column = overlay.column as usize;
            if overlay.row as usize >= self.rows || column >= self.cols {
                continue;
            }
            let room = self.cols - column;
            let text: String = overlay.text.chars().take(room).collect();
            write!(
                self.output_buf,
                "\x1b[{};{}H\x1b[38;2;{};{};{}m\x1b[48;2;{};{};{}m{}\x1b[0m",
                overlay.row + 1,
                overlay.column + 1,
                overlay.fg.0,
                overlay.fg.1,
                overlay.fg.2,
                overlay.bg.0,
                overlay.bg.1,
                overlay.bg.2,
                text
            )?;
        }

        out.write_all(&self.output_buf)?;
        out.flush()?;
        Ok(())
    }

    fn pixel_bounds(&self, cx: f32, cy: f32, radius: f32) -> Option<(usize, usize, usize, usize)> {
        let min_x = ((cx - radius) / self.scale).floor();
        let max_x = ((cx + radius) / self.scale).floor();
        let min_y = ((cy - radius) / self.scale).floor();
        let max_y = ((cy + radius) / self.scale).floor();
        if max_x < 0.0 || max_y < 0.0 || min_x >= self.width as f32 || min_y >= self.height as f32 {
            return None;
        }
        Some((
            min_x.max(0.0) as usize,
            min_y.max(0.0) as usize,
            (max_x as usize).min(self.width - 1),
            (max_y as usize).min(self.height - 1),
        ))
    }

    /// Distance from (cx, cy) to the closest point of pixel (px, py).
    /// Zero for the pixel that contains the point, so sub-pixel shapes still show.
    fn nearest_distance(&self, px: usize, py: usize, cx: f32, cy: f32) -> f32 {
        let left = px as f32 * self.scale;
        let top = py as f32 * self.scale;
        let nx = cx.clamp(left, left + self.scale);
        let ny = cy.clamp(top, top + self.scale);
        ((nx - cx).powi(2) + (ny - cy).powi(2)).sqrt()
    }

    fn farthest_distance(&self, px: usize, py: usize, cx: f32, cy: f32) -> f32 {
        let left = px as f32 * self.scale;
        let top = py as f32 * self.scale;
        let fx = if cx - left > left + self.scale - cx { left } else { left + self.scale };
        let fy = if cy - top > top + self.scale - cy { top } else { top + self.scale };
        ((fx - cx).powi(2) + (fy - cy).powi(2)).sqrt()
    }
}

fn channels(color: Rgb) -> (f32, f32, f32) {
    (color.0 as f32, color.1 as f32, color.2 as f32)
}

/// Colour and alpha of the gradient at `t`, channels left unrounded.
fn sample(stops: &[GradientStop], t: f32) -> ((f32, f32, f32), f32) {
    let first = stops[0];
    if t <= first.offset {
        return (channels(first.color), first.alpha);
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.offset {
            let span = b.offset - a.offset;
            let k = if span <= 0.0 { 1.0 } else { (t - a.offset) / span };
            let (ca, cb) = (channels(a.color), channels(b.color));
            return (
                (
                    ca.0 + (cb.0 - ca.0) * k,
                    ca.1 + (cb.1 - ca.1) * k,
                    ca.2 + (cb.2 - ca.2) * k,
                ),
                a.alpha + (b.alpha - a.alpha) * k,
            );
        }
    }
    let last = stops[stops.len() - 1];
    (channels(last.color), last.alpha)
}

fn blend(pixel: &mut (f32, f32, f32), color: (f32, f32, f32), alpha: f32, mode: Blend) {
    let alpha = alpha.clamp(0.0, 1.0);
    let (r, g, b) = color;
    match mode {
        Blend::SourceOver => {
            pixel.0 += (r - pixel.0) * alpha;
            pixel.1 += (g - pixel.1) * alpha;
            pixel.2 += (b - pixel.2) * alpha;
        }
        Blend::Lighter => {
            pixel.0 = (pixel.0 + r * alpha).min(255.0);
            pixel.1 = (pixel.1 + g * alpha).min(255.0);
            pixel.2 = (pixel.2 + b * alpha).min(255.0);
        }
    }
}
