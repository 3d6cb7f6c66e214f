//! Turns a detonating rocket into its burst.

use crate::color::{self, Rgb};
use crate::entities::{FireworkKind, PARTICLE_LIFE, Particle, Rocket};
use std::f32::consts::PI;

pub const FLOWER_PARTICLES: usize = 120;
pub const FLOWER_INNER_LIFE: i32 = 40;
pub const FRAGMENT_PARTICLES: usize = 40;
const FRAGMENT_SPEED: f32 = 3.0;
const FRAGMENT_DISTANCE: f32 = 4.0 * 10.0;
const SHELL_SPEED: f32 = 5.0;

/// Everything a detonation adds to the show.
#[derive(Debug)]
pub struct Detonation {
    pub x: f32,
    pub y: f32,
    pub hue: f32,
    /// Shells retint the sky and fire the flare; bomb fragments do neither.
    pub lights_sky: bool,
    pub particles: Vec<Particle>,
    /// Bomb fragments, already exploded.
    pub fragments: Vec<Rocket>,
}

type Composer = fn(&Rocket, &mut fastrand::Rng, &mut Detonation);

fn composer(kind: FireworkKind) -> Composer {
    match kind {
        FireworkKind::Standard => compose_standard,
        FireworkKind::Flower => compose_flower,
        FireworkKind::Bomb => compose_bomb,
    }
}

/// Explodes `rocket`, or returns `None` if it already went off.
pub fn detonate(rocket: &mut Rocket, rng: &mut fastrand::Rng) -> Option<Detonation> {
    if !rocket.mark_exploded() {
        return None;
    }

    let mut detonation = Detonation {
        x: rocket.x,
        y: rocket.y,
        hue: rocket.color.hue,
        lights_sky: !rocket.fragment,
        particles: Vec::new(),
        fragments: Vec::new(),
    };

    if rocket.fragment {
        detonation.particles = burst(rocket, FRAGMENT_PARTICLES, FRAGMENT_SPEED, rng);
    } else {
        composer(rocket.kind)(rocket, rng, &mut detonation);
    }

    Some(detonation)
}

fn compose_standard(rocket: &Rocket, rng: &mut fastrand::Rng, out: &mut Detonation) {
    let count = 70 + rng.usize(0..50);
    out.particles = burst(rocket, count, SHELL_SPEED, rng);
}

/// White slow core with short life, coloured fast petals around it.
fn compose_flower(rocket: &Rocket, rng: &mut fastrand::Rng, out: &mut Detonation) {
    let inner = FLOWER_PARTICLES * 2 / 5;
    out.particles = (0..FLOWER_PARTICLES)
        .map(|i| {
            let angle = rng.f32() * PI * 2.0;
            let (speed, color, life): (f32, Rgb, i32) = if i < inner {
                (rng.f32() * 2.0 + 0.5, color::WHITE, FLOWER_INNER_LIFE)
            } else {
                (rng.f32() * 6.0 + 3.0, rocket.color.rgb, PARTICLE_LIFE)
            };
            Particle::new(rocket.x, rocket.y, angle.cos() * speed, angle.sin() * speed, color, life, rng)
        })
        .collect();
}

/// Scatters 5-9 fragments that burst on the spot.
fn compose_bomb(rocket: &Rocket, rng: &mut fastrand::Rng, out: &mut Detonation) {
    let count = 5 + rng.usize(0..5);
    for _ in 0..count {
        let angle = rng.f32() * PI * 2.0;
        let target = (
            rocket.x + angle.cos() * FRAGMENT_DISTANCE,
            rocket.y + angle.sin() * FRAGMENT_DISTANCE,
        );
        let mut fragment = Rocket::launch((rocket.x, rocket.y), target, FireworkKind::Standard, rocket.color);
        fragment.fragment = true;

        if let Some(inner) = detonate(&mut fragment, rng) {
            out.particles.extend(inner.particles);
        }
        out.fragments.push(fragment);
    }
}

fn burst(rocket: &Rocket, count: usize, speed_base: f32, rng: &mut fastrand::Rng) -> Vec<Particle> {
    (0..count)
        .map(|_| {
            let angle = rng.f32() * PI * 2.0;
            let speed = rng.f32() * speed_base + 1.0;
            Particle::new(
                rocket.x,
                rocket.y,
                angle.cos() * speed,
                angle.sin() * speed,
                rocket.color.rgb,
                PARTICLE_LIFE,
                rng,
            )
        })
        .collect()
}
