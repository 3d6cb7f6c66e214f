use crate::canvas::{Blend, Canvas, GradientStop};
use crate::color::{self, Rgb};
use noise::{NoiseFn, Perlin};

pub const STAR_COUNT: usize = 400;
pub const GROUND_SEGMENTS: usize = 15;
pub const GROUND_HEIGHT: f32 = 50.0;
pub const GRAVITY_BASE: f32 = 0.05;
pub const DEFAULT_HUE: f32 = 240.0;

const CELESTIAL_SPEED: f32 = 0.00008;
const HUE_TRANSITION_RATE: f32 = 0.1;
const STAR_MIN_OPACITY: f32 = 0.2;
const STAR_MAX_OPACITY: f32 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GravityLevel {
    Low,
    Normal,
    High,
}

impl GravityLevel {
    pub fn factor(self) -> f32 {
        match self {
            GravityLevel::Low => 0.5,
            GravityLevel::Normal => 1.0,
            GravityLevel::High => 1.5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            GravityLevel::Low => "Low",
            GravityLevel::Normal => "Normal",
            GravityLevel::High => "High",
        }
    }

    pub fn next(self) -> Self {
        match self {
            GravityLevel::Low => GravityLevel::Normal,
            GravityLevel::Normal => GravityLevel::High,
            GravityLevel::High => GravityLevel::Low,
        }
    }
}

/// Process-wide sky and toggle state. Only the frame driver mutates it.
#[derive(Clone, Debug)]
pub struct SkyState {
    pub current_hue: f32,
    pub target_hue: f32,
    /// Cycles through [0, 1); drives sun and moon placement.
    pub celestial_position: f32,
    pub gravity: GravityLevel,
    pub dark_mode: bool,
    pub animating: bool,
}

impl SkyState {
    pub fn new(dark_mode: bool, animating: bool) -> Self {
        Self {
            current_hue: DEFAULT_HUE,
            target_hue: DEFAULT_HUE,
            celestial_position: 0.0,
            gravity: GravityLevel::Normal,
            dark_mode,
            animating,
        }
    }

    /// Per-tick background update; runs whether or not fireworks are animating.
    pub fn advance(&mut self) {
        self.celestial_position = (self.celestial_position + CELESTIAL_SPEED) % 1.0;
        self.ease_hue();
    }

    /// Moves the current hue 10% of the shortest arc toward the target.
    pub fn ease_hue(&mut self) {
        let mut diff = self.target_hue - self.current_hue;
        if diff > 180.0 {
            diff -= 360.0;
        } else if diff < -180.0 {
            diff += 360.0;
        }
        self.current_hue = color::normalize_hue(self.current_hue + diff * HUE_TRANSITION_RATE);
    }

    pub fn set_target_hue(&mut self, hue: f32) {
        self.target_hue = color::normalize_hue(hue);
    }

    pub fn gravity_factor(&self) -> f32 {
        self.gravity.factor()
    }

    pub fn cycle_gravity(&mut self) -> GravityLevel {
        self.gravity = self.gravity.next();
        self.gravity
    }

    /// Flips day/night and snaps both hues back to the default.
    pub fn toggle_mode(&mut self) -> bool {
        self.dark_mode = !self.dark_mode;
        self.current_hue = DEFAULT_HUE;
        self.target_hue = DEFAULT_HUE;
        self.dark_mode
    }

    pub fn background_color(&self) -> Rgb {
        if self.dark_mode {
            color::hsl_to_rgb(self.current_hue, 0.70, 0.08)
        } else {
            color::hsl_to_rgb(self.current_hue, 0.40, 0.85)
        }
    }

    /// Translucent clears leave motion trails; a disabled show gets a clean frame.
    pub fn clear_alpha(&self) -> f32 {
        match (self.animating, self.dark_mode) {
            (false, _) => 1.0,
            (true, true) => 0.1,
            (true, false) => 0.05,
        }
    }

    pub fn draw_background(&self, canvas: &mut Canvas) {
        canvas.fill(self.background_color(), self.clear_alpha());
    }

    pub fn draw_sun(&self, canvas: &mut Canvas) {
        if self.dark_mode {
            return;
        }
        let (w, h) = canvas.viewport();
        let x = w * (0.1 + 0.8 * self.celestial_position);
        let y = h * 0.05;
        let disk = w * 0.03;

        canvas.fill_circle(x, y, disk, (255, 255, 220), 0.90);
        canvas.stroke_circle(x, y, disk, 2.0, (255, 217, 0), 1.0);

        let glow = [
            GradientStop::new(0.0, (255, 255, 180), 0.9),
            GradientStop::new(0.1, (255, 255, 220), 0.5),
            GradientStop::new(0.3, (255, 255, 255), 0.2),
            GradientStop::new(1.0, (255, 255, 255), 0.0),
        ];
        canvas.fill_radial(x, y, disk * 0.5, w * 0.7, &glow, Blend::SourceOver);
    }

    pub fn draw_moon(&self, canvas: &mut Canvas) {
        if !self.dark_mode {
            return;
        }
        let (w, h) = canvas.viewport();
        let x = w * (0.9 - 0.8 * self.celestial_position);
        let y = h * 0.1;
        let radius = w * 0.03;

        canvas.fill_circle(x, y, radius, color::WHITE, 0.95);
        // (radius fraction, dx, dy)
        for (r, dx, dy) in [(0.15, -0.3, -0.3), (0.2, 0.2, 0.4), (0.1, 0.4, -0.05)] {
            canvas.fill_circle(x + radius * dx, y + radius * dy, radius * r, color::BLACK, 0.2);
        }
    }
}

#[derive(Clone, Debug)]
pub struct Star {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub opacity: f32,
    /// Signed; flips when opacity leaves [0.2, 1].
    pub blink_rate: f32,
}

impl Star {
    fn twinkle(&mut self) {
        self.opacity += self.blink_rate;
        if self.opacity > STAR_MAX_OPACITY {
            self.opacity = STAR_MAX_OPACITY;
            self.blink_rate = -self.blink_rate;
        } else if self.opacity < STAR_MIN_OPACITY {
            self.opacity = STAR_MIN_OPACITY;
            self.blink_rate = -self.blink_rate;
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct StarField {
    pub stars: Vec<Star>,
}

impl StarField {
    pub fn generate(width: f32, height: f32, rng: &mut fastrand::Rng) -> Self {
        let stars = (0..STAR_COUNT)
            .map(|_| {
                let rate = rng.f32() * 0.05 + 0.01;
                Star {
                    x: rng.f32() * width,
                    y: rng.f32() * height * 0.7,
                    radius: rng.f32() * 1.5 + 0.5,
                    opacity: STAR_MIN_OPACITY + rng.f32() * (STAR_MAX_OPACITY - STAR_MIN_OPACITY),
                    blink_rate: if rng.bool() { rate } else { -rate },
                }
            })
            .collect();
        Self { stars }
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    /// Stars only exist at night; they twinkle as they are drawn.
    pub fn draw(&mut self, canvas: &mut Canvas, dark_mode: bool) {
        if !dark_mode {
            return;
        }
        for star in &mut self.stars {
            star.twinkle();
            canvas.fill_circle(star.x, star.y, star.radius, color::WHITE, star.opacity);
        }
    }
}

/// Anchor points of the ground silhouette, left edge to right edge.
#[derive(Clone, Debug, Default)]
pub struct GroundProfile {
    pub points: Vec<(f32, f32)>,
}

impl GroundProfile {
    pub fn generate(width: f32, height: f32, rng: &mut fastrand::Rng) -> Self {
        let perlin = Perlin::new(rng.u32(..));
        let row = rng.f64() * 100.0;
        let segment_width = width / GROUND_SEGMENTS as f32;
        let points = (0..=GROUND_SEGMENTS)
            .map(|i| {
                // Off-lattice samples; Perlin is zero at integer coordinates
                let n = perlin.get([i as f64 * 0.61 + 0.37, row + 0.5]) as f32;
                let jitter = (n * 14.0).clamp(-10.0, 10.0);
                (i as f32 * segment_width, height - GROUND_HEIGHT + jitter)
            })
            .collect();
        Self { points }
    }

    pub fn segments(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    /// Height of the silhouette at `x`, following the cubic curve between the
    /// neighbouring anchors (controls at the horizontal midpoint).
    pub fn surface_at(&self, x: f32) -> f32 {
        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return f32::INFINITY;
        };
        if x <= first.0 {
            return first.1;
        }
        if x >= last.0 {
            return last.1;
        }

        let Some(pair) = self.points.windows(2).find(|p| x <= p[1].0) else {
            return last.1;
        };
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        let span = x1 - x0;
        if span <= 0.0 {
            return y1;
        }

        // x(t) = x0 + span * (1.5 t (1 - t) + t^3) is monotonic, so bisect for t.
        let target = (x - x0) / span;
        let (mut lo, mut hi) = (0.0f32, 1.0f32);
        for _ in 0..24 {
            let mid = (lo + hi) / 2.0;
            let progress = 1.5 * mid * (1.0 - mid) + mid * mid * mid;
            if progress < target {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        let t = (lo + hi) / 2.0;
        let u = 1.0 - t;
        y0 * (u * u * u + 3.0 * u * u * t) + y1 * (3.0 * u * t * t + t * t * t)
    }

    pub fn draw(&self, canvas: &mut Canvas, dark_mode: bool) {
        if self.points.is_empty() {
            return;
        }
        let fill: Rgb = if dark_mode { color::BLACK } else { (180, 180, 180) };
        canvas.fill_below(|x| self.surface_at(x), fill, 0.9);
    }
}
