use crate::canvas::{Blend, Canvas, GradientStop};
use crate::color::{self, Rgb, ShellColor};
use crate::sky::GRAVITY_BASE;
use std::collections::VecDeque;

pub const MAX_PARTICLES: usize = 500;
pub const LAUNCH_SPEED: f32 = 15.0;
pub const TRAIL_LENGTH: usize = 5;
pub const PARTICLE_LIFE: i32 = 100;
pub const TRAIL_PARTICLE_LIFE: i32 = 30;
pub const FLARE_MAX_LIFE: i32 = 30;

const TRAIL_CHANCE: f32 = 0.5;
const PARTICLE_FRICTION: f32 = 0.98;
const ALPHA_DECAY: f32 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FireworkKind {
    Standard,
    Flower,
    Bomb,
}

impl FireworkKind {
    /// 20% bomb, 20% flower, the rest standard.
    pub fn roll(rng: &mut fastrand::Rng) -> Self {
        let roll = rng.f32();
        if roll < 0.20 {
            FireworkKind::Bomb
        } else if roll < 0.40 {
            FireworkKind::Flower
        } else {
            FireworkKind::Standard
        }
    }
}

#[derive(Clone, Debug)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub color: Rgb,
    pub life: i32,
    pub alpha: f32,
    pub friction: f32,
    pub radius: f32,
}

impl Particle {
    /// The given velocity is scaled by a random factor in [0.5, 1) for spread.
    pub fn new(x: f32, y: f32, vx: f32, vy: f32, color: Rgb, life: i32, rng: &mut fastrand::Rng) -> Self {
        Self {
            x,
            y,
            vx: vx * (rng.f32() * 0.5 + 0.5),
            vy: vy * (rng.f32() * 0.5 + 0.5),
            color,
            life,
            alpha: 1.0,
            friction: PARTICLE_FRICTION,
            radius: rng.f32() * 2.0 + 1.0,
        }
    }

    pub fn step(&mut self, gravity_factor: f32) {
        self.vy += GRAVITY_BASE * gravity_factor * 0.5;
        self.vx *= self.friction;
        self.x += self.vx;
        self.y += self.vy;
        self.alpha -= ALPHA_DECAY;
        self.life -= 1;
    }

    pub fn is_alive(&self) -> bool {
        self.life > 0 && self.alpha > 0.0
    }

    pub fn draw(&self, canvas: &mut Canvas) {
        let stops = [
            GradientStop::new(0.0, self.color, self.alpha),
            GradientStop::new(1.0, color::BLACK, 0.0),
        ];
        canvas.fill_radial(self.x, self.y, 0.0, self.radius, &stops, Blend::SourceOver);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RocketState {
    Ascending,
    Exploded,
}

/// Result of one ascent tick.
#[derive(Debug)]
pub enum Ascent {
    Climbing { trail: Option<Particle> },
    /// Target altitude reached; the caller detonates the rocket.
    Detonate,
}

#[derive(Clone, Debug)]
pub struct Rocket {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub target_x: f32,
    pub target_y: f32,
    pub color: ShellColor,
    pub kind: FireworkKind,
    pub trail: VecDeque<(f32, f32)>,
    pub state: RocketState,
    /// Bomb fragments burst with a fixed small charge instead of their kind's.
    pub fragment: bool,
}

impl Rocket {
    pub fn launch(start: (f32, f32), target: (f32, f32), kind: FireworkKind, color: ShellColor) -> Self {
        let (dx, dy) = (target.0 - start.0, target.1 - start.1);
        let dist = (dx * dx + dy * dy).sqrt();
        let (vx, vy) = if dist > 0.0 {
            (dx / dist * LAUNCH_SPEED, dy / dist * LAUNCH_SPEED)
        } else {
            (0.0, 0.0)
        };

        Self {
            x: start.0,
            y: start.1,
            vx,
            vy,
            target_x: target.0,
            target_y: start.1.min(target.1),
            color,
            kind,
            trail: VecDeque::with_capacity(TRAIL_LENGTH + 1),
            state: RocketState::Ascending,
            fragment: false,
        }
    }

    pub fn is_exploded(&self) -> bool {
        self.state == RocketState::Exploded
    }

    /// At or past the target altitude, or falling back while below it.
    pub fn reached_target(&self) -> bool {
        self.y <= self.target_y || (self.vy > 0.0 && self.y >= self.target_y)
    }

    /// Flips to `Exploded`; true only the first time.
    pub fn mark_exploded(&mut self) -> bool {
        if self.is_exploded() {
            return false;
        }
        self.state = RocketState::Exploded;
        true
    }

    pub fn ascend(&mut self, gravity_factor: f32, rng: &mut fastrand::Rng) -> Ascent {
        if self.is_exploded() {
            return Ascent::Climbing { trail: None };
        }
        if self.reached_target() {
            return Ascent::Detonate;
        }

        self.vy += GRAVITY_BASE * gravity_factor;
        self.x += self.vx;
        self.y += self.vy;

        let trail = if rng.f32() < TRAIL_CHANCE {
            let vx = self.vx * -0.1 + (rng.f32() - 0.5) * 0.5;
            let vy = self.vy * -0.1 + rng.f32() * 0.5;
            Some(Particle::new(self.x, self.y, vx, vy, color::WHITE, TRAIL_PARTICLE_LIFE, rng))
        } else {
            None
        };

        self.trail.push_back((self.x, self.y));
        while self.trail.len() > TRAIL_LENGTH {
            self.trail.pop_front();
        }

        Ascent::Climbing { trail }
    }

    pub fn draw(&self, canvas: &mut Canvas) {
        if self.is_exploded() {
            return;
        }
        let len = self.trail.len() as f32;
        for (i, &(x, y)) in self.trail.iter().enumerate() {
            canvas.fill_circle(x, y, 1.5, self.color.rgb, i as f32 / len * 0.8);
        }
        canvas.fill_circle(self.x, self.y, 2.0, color::WHITE, 1.0);
    }
}

/// Live particles, never more than `capacity`.
#[derive(Clone, Debug)]
pub struct ParticlePool {
    particles: Vec<Particle>,
    capacity: usize,
}

impl Default for ParticlePool {
    fn default() -> Self {
        Self::with_capacity(MAX_PARTICLES)
    }
}

impl ParticlePool {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            particles: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    /// Adds new particles until the pool is full; live ones are never evicted
    /// to make room. Returns how many were accepted.
    pub fn absorb(&mut self, batch: impl IntoIterator<Item = Particle>) -> usize {
        let room = self.capacity.saturating_sub(self.particles.len());
        let before = self.particles.len();
        self.particles.extend(batch.into_iter().take(room));
        self.particles.len() - before
    }

    /// Steps every particle once, draws the survivors and drops the rest.
    pub fn step_and_draw(&mut self, gravity_factor: f32, canvas: &mut Canvas) {
        self.particles.retain_mut(|particle| {
            particle.step(gravity_factor);
            if particle.is_alive() {
                particle.draw(canvas);
                true
            } else {
                false
            }
        });
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }
}

/// Single shared flash shown where the last shell burst.
#[derive(Clone, Debug)]
pub struct Flare {
    pub x: f32,
    pub y: f32,
    pub hue: f32,
    pub life: i32,
    pub max_life: i32,
    pub active: bool,
}

impl Default for Flare {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            hue: 0.0,
            life: 0,
            max_life: FLARE_MAX_LIFE,
            active: false,
        }
    }
}

impl Flare {
    pub fn ignite(&mut self, x: f32, y: f32, hue: f32) {
        self.x = x;
        self.y = y;
        self.hue = hue;
        self.life = self.max_life;
        self.active = true;
    }

    /// Draws one frame of the flash and burns down its life.
    pub fn draw(&mut self, canvas: &mut Canvas) {
        if !self.active || self.life <= 0 {
            return;
        }
        let remaining = self.life as f32 / self.max_life as f32;
        let alpha = remaining * 0.5;
        let radius = 50.0 + (1.0 - remaining) * 150.0;

        let stops = [
            GradientStop::new(0.0, color::hsl_to_rgb(self.hue, 1.0, 0.9), alpha * 0.8),
            GradientStop::new(0.3, color::hsl_to_rgb(self.hue, 0.8, 0.7), alpha * 0.4),
            GradientStop::new(1.0, color::BLACK, 0.0),
        ];
        canvas.fill_radial(self.x, self.y, 0.0, radius, &stops, Blend::Lighter);

        self.life -= 1;
        if self.life <= 0 {
            self.active = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::palette_color;

    #[test]
    fn particle_decays_by_one_tick() {
        let mut rng = fastrand::Rng::with_seed(1);
        let mut p = Particle::new(10.0, 10.0, 2.0, -2.0, (255, 0, 0), 3, &mut rng);
        assert!((1.0..=2.0).contains(&p.vx));
        assert!((1.0..3.0).contains(&p.radius));

        let vx = p.vx;
        p.step(1.0);
        assert_eq!(p.life, 2);
        assert!((p.alpha - 0.99).abs() < 1e-6);
        assert!((p.vx - vx * 0.98).abs() < 1e-6);
        p.step(1.0);
        p.step(1.0);
        assert_eq!(p.life, 0);
        assert!(!p.is_alive());
    }

    #[test]
    fn particle_gravity_scales_with_factor() {
        let mut rng = fastrand::Rng::with_seed(2);
        let mut low = Particle::new(0.0, 0.0, 0.0, 0.0, (1, 1, 1), 10, &mut rng);
        let mut high = low.clone();
        low.step(0.5);
        high.step(1.5);
        assert!((low.vy - 0.0125).abs() < 1e-6);
        assert!((high.vy - 0.0375).abs() < 1e-6);
    }

    #[test]
    fn rocket_heads_for_target_at_launch_speed() {
        let rocket = Rocket::launch((100.0, 400.0), (100.0, 100.0), FireworkKind::Standard, palette_color(0).unwrap());
        assert_eq!(rocket.vx, 0.0);
        assert_eq!(rocket.vy, -LAUNCH_SPEED);
        assert_eq!(rocket.target_y, 100.0);
        assert_eq!(rocket.state, RocketState::Ascending);
    }

    #[test]
    fn rocket_trail_is_bounded() {
        let mut rng = fastrand::Rng::with_seed(5);
        let mut rocket = Rocket::launch((0.0, 1000.0), (0.0, 0.0), FireworkKind::Flower, palette_color(3).unwrap());
        for _ in 0..20 {
            assert!(matches!(rocket.ascend(1.0, &mut rng), Ascent::Climbing { .. }));
            assert!(rocket.trail.len() <= TRAIL_LENGTH);
        }
        assert_eq!(rocket.trail.len(), TRAIL_LENGTH);
    }

    #[test]
    fn rocket_detonates_once_at_target() {
        let mut rng = fastrand::Rng::with_seed(8);
        let mut rocket = Rocket::launch((0.0, 300.0), (0.0, 100.0), FireworkKind::Standard, palette_color(1).unwrap());
        let mut ticks = 0;
        loop {
            match rocket.ascend(1.0, &mut rng) {
                Ascent::Detonate => break,
                Ascent::Climbing { .. } => ticks += 1,
            }
            assert!(ticks < 100);
        }
        assert!(rocket.y <= rocket.target_y);
        assert!(rocket.mark_exploded());
        assert!(!rocket.mark_exploded());
        assert!(matches!(rocket.ascend(1.0, &mut rng), Ascent::Climbing { trail: None }));
    }

    #[test]
    fn stalled_rocket_detonates_when_falling() {
        let mut rocket = Rocket::launch((0.0, 300.0), (0.0, 100.0), FireworkKind::Standard, palette_color(1).unwrap());
        rocket.y = 200.0;
        rocket.vy = 0.5;
        assert!(rocket.reached_target());
    }

    #[test]
    fn pool_truncates_new_particles_at_capacity() {
        let mut rng = fastrand::Rng::with_seed(4);
        let mut pool = ParticlePool::with_capacity(10);
        let first: Vec<Particle> = (0..6).map(|_| Particle::new(0.0, 0.0, 0.0, 0.0, (1, 0, 0), 50, &mut rng)).collect();
        assert_eq!(pool.absorb(first), 6);
        let second: Vec<Particle> = (0..6).map(|_| Particle::new(0.0, 0.0, 0.0, 0.0, (2, 0, 0), 50, &mut rng)).collect();
        assert_eq!(pool.absorb(second), 4);
        assert_eq!(pool.len(), 10);
        assert_eq!(pool.iter().filter(|p| p.color == (1, 0, 0)).count(), 6);
    }

    #[test]
    fn pool_culls_expired_particles() {
        let mut rng = fastrand::Rng::with_seed(6);
        let mut canvas = Canvas::new(10, 5, 4.0).unwrap();
        let mut pool = ParticlePool::default();
        pool.absorb([
            Particle::new(5.0, 5.0, 0.0, 0.0, color::WHITE, 1, &mut rng),
            Particle::new(5.0, 5.0, 0.0, 0.0, color::WHITE, 3, &mut rng),
        ]);
        pool.step_and_draw(1.0, &mut canvas);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.iter().next().unwrap().life, 2);
    }

    #[test]
    fn flare_burns_out() {
        let mut canvas = Canvas::new(20, 10, 4.0).unwrap();
        let mut flare = Flare::default();
        flare.ignite(40.0, 40.0, 45.0);
        for _ in 0..FLARE_MAX_LIFE {
            assert!(flare.active);
            flare.draw(&mut canvas);
        }
        assert!(!flare.active);
        assert_ne!(canvas.pixel(10, 10), (0, 0, 0));
    }
}
