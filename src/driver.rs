//! The single per-tick loop body: sky, launches, entities, frame.

use crate::canvas::{Canvas, Capability, Overlay};
use crate::color::{self, Rgb};
use crate::entities::{Ascent, FireworkKind, Flare, ParticlePool, Rocket};
use crate::explosion;
use crate::input::{self, Chrome, Command, Control, Region};
use crate::prefs::{self, PreferenceStore, Preferences, Theme};
use crate::scheduler::{AutoLauncher, LaunchRequest};
use crate::sky::{GroundProfile, SkyState, StarField};
use crossterm::event::Event;
use std::collections::VecDeque;
use std::io::Write;

pub const TICK_MS: f64 = 1000.0 / 60.0;
pub const SHORT_NOTICE_MS: f64 = 2000.0;
pub const LONG_NOTICE_MS: f64 = 3000.0;

/// Everything the show simulates.
pub struct SimulationState {
    pub sky: SkyState,
    pub stars: StarField,
    pub ground: GroundProfile,
    pub rockets: Vec<Rocket>,
    pub particles: ParticlePool,
    pub flare: Flare,
    pub launch_queue: VecDeque<LaunchRequest>,
    pub rng: fastrand::Rng,
}

impl SimulationState {
    pub fn init(viewport: (f32, f32), prefs: Preferences, mut rng: fastrand::Rng) -> Self {
        let stars = StarField::generate(viewport.0, viewport.1, &mut rng);
        let ground = GroundProfile::generate(viewport.0, viewport.1, &mut rng);
        Self {
            sky: SkyState::new(prefs.theme == Theme::Dark, prefs.animating),
            stars,
            ground,
            rockets: Vec::new(),
            particles: ParticlePool::default(),
            flare: Flare::default(),
            launch_queue: VecDeque::new(),
            rng,
        }
    }

    /// Drops every in-flight entity and pending launch; sky state is kept.
    pub fn reset(&mut self) {
        self.rockets.clear();
        self.particles.clear();
        self.flare = Flare::default();
        self.launch_queue.clear();
    }

    pub fn regenerate_backdrop(&mut self, viewport: (f32, f32)) {
        self.stars = StarField::generate(viewport.0, viewport.1, &mut self.rng);
        self.ground = GroundProfile::generate(viewport.0, viewport.1, &mut self.rng);
    }

    fn draw_static(&mut self, canvas: &mut Canvas) {
        self.sky.draw_background(canvas);
        self.stars.draw(canvas, self.sky.dark_mode);
        self.sky.draw_sun(canvas);
        self.sky.draw_moon(canvas);
        self.ground.draw(canvas, self.sky.dark_mode);
    }

    fn launch(&mut self, request: LaunchRequest, viewport: (f32, f32)) -> Rocket {
        let (w, h) = viewport;
        let rng = &mut self.rng;
        let kind = request.kind.unwrap_or_else(|| FireworkKind::roll(rng));
        let start = (w / 2.0 + (rng.f32() - 0.5) * w * 0.1, h);
        let target = (request.x, request.y.min(h * 0.2));
        Rocket::launch(start, target, kind, color::random_shell_color(rng))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub text: String,
    pub expires_at_ms: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub ticks: u64,
    pub launches: u64,
    pub detonations: u64,
    pub fragments: u64,
}

pub struct FrameDriver {
    state: SimulationState,
    canvas: Option<Canvas>,
    scheduler: AutoLauncher,
    store: Box<dyn PreferenceStore>,
    clock_ms: f64,
    hidden: bool,
    notice: Option<Notice>,
    stats: FrameStats,
}

impl FrameDriver {
    /// A disabled surface yields a driver that ignores every call.
    pub fn new(
        surface: Capability,
        prefs: Preferences,
        store: Box<dyn PreferenceStore>,
        rng: fastrand::Rng,
    ) -> Self {
        let canvas = match surface {
            Capability::Enabled(canvas) => Some(canvas),
            Capability::Disabled(reason) => {
                log::error!("fireworks disabled: {}", reason);
                None
            }
        };
        let viewport = canvas.as_ref().map(Canvas::viewport).unwrap_or((0.0, 0.0));

        let mut driver = Self {
            state: SimulationState::init(viewport, prefs, rng),
            canvas,
            scheduler: AutoLauncher::default(),
            store,
            clock_ms: 0.0,
            hidden: false,
            notice: None,
            stats: FrameStats::default(),
        };
        if driver.is_enabled() {
            log::info!(
                "show started: {:.0}x{:.0} viewport, {} mode, animation {}",
                viewport.0,
                viewport.1,
                if prefs.theme == Theme::Dark { "dark" } else { "light" },
                if prefs.animating { "on" } else { "off" }
            );
            if prefs.animating {
                driver.scheduler.start(driver.clock_ms);
            }
        }
        driver
    }

    pub fn is_enabled(&self) -> bool {
        self.canvas.is_some()
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.state
    }

    pub fn canvas(&self) -> Option<&Canvas> {
        self.canvas.as_ref()
    }

    pub fn scheduler(&self) -> &AutoLauncher {
        &self.scheduler
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    pub fn viewport(&self) -> Option<(f32, f32)> {
        self.canvas.as_ref().map(Canvas::viewport)
    }

    /// Queues a launch for the next tick. Ignored while animation is off.
    pub fn request_launch(&mut self, request: LaunchRequest) -> bool {
        if !self.is_enabled() || !self.state.sky.animating {
            return false;
        }
        self.state.launch_queue.push_back(request);
        true
    }

    pub fn handle_event(&mut self, event: &Event) {
        let Some(canvas) = self.canvas.as_ref() else {
            return;
        };
        if let Some(command) = input::translate(event, &self.chrome(), canvas.scale()) {
            self.apply(command);
        }
    }

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Launch { x, y } => {
                self.request_launch(LaunchRequest { x, y, kind: None });
            }
            Command::Resize { cols, rows } => self.resize(cols as usize, rows as usize),
            Command::Visibility { hidden } => self.set_hidden(hidden),
            Command::Toggle(Control::DayNight) => self.toggle_mode(),
            Command::Toggle(Control::Gravity) => self.cycle_gravity(),
            Command::Toggle(Control::Animation) => self.toggle_animation(),
        }
    }

    pub fn resize(&mut self, cols: usize, rows: usize) {
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        if !canvas.resize(cols, rows) {
            log::warn!("ignoring resize to {}x{}", cols, rows);
            return;
        }
        let viewport = canvas.viewport();
        self.state.regenerate_backdrop(viewport);
        log::info!("resized to {}x{} cells ({:.0}x{:.0} viewport)", cols, rows, viewport.0, viewport.1);
    }

    /// Hidden pauses auto-launch; coming back resumes it if the show is on.
    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
        if !self.state.sky.animating || !self.is_enabled() {
            return;
        }
        if hidden {
            self.scheduler.cancel();
        } else {
            self.scheduler.start(self.clock_ms);
        }
    }

    pub fn toggle_mode(&mut self) {
        if !self.is_enabled() {
            return;
        }
        let dark = self.state.sky.toggle_mode();
        prefs::save_theme(self.store.as_mut(), dark);
        log::info!("switched to {} mode", if dark { "dark" } else { "light" });
        self.notify(if dark { "Dark mode" } else { "Light mode" }, SHORT_NOTICE_MS);
    }

    pub fn cycle_gravity(&mut self) {
        if !self.is_enabled() {
            return;
        }
        let level = self.state.sky.cycle_gravity();
        log::info!("gravity set to {}", level.name());
        self.notify(&format!("Gravity set to {}", level.name()), SHORT_NOTICE_MS);
    }

    pub fn toggle_animation(&mut self) {
        if !self.is_enabled() {
            return;
        }
        let animating = !self.state.sky.animating;
        self.state.sky.animating = animating;
        prefs::save_animation(self.store.as_mut(), animating);
        log::info!("fireworks animation {}", if animating { "on" } else { "off" });

        if animating {
            self.notify("Fireworks ON!", LONG_NOTICE_MS);
            if !self.hidden {
                self.scheduler.start(self.clock_ms);
            }
        } else {
            self.notify("Fireworks OFF.", LONG_NOTICE_MS);
            self.scheduler.cancel();
            self.state.launch_queue.clear();
            if let Some(canvas) = self.canvas.as_mut() {
                self.state.draw_static(canvas);
            }
        }
    }

    pub fn notify(&mut self, text: &str, duration_ms: f64) {
        if !self.is_enabled() {
            return;
        }
        self.notice = Some(Notice {
            text: text.to_string(),
            expires_at_ms: self.clock_ms + duration_ms,
        });
    }

    /// Advances the show by one frame and draws it onto the canvas.
    pub fn tick(&mut self) {
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        self.clock_ms += TICK_MS;
        self.stats.ticks += 1;

        let state = &mut self.state;
        state.sky.advance();

        let viewport = canvas.viewport();
        if state.sky.animating {
            if let Some(request) = self.scheduler.poll(self.clock_ms, viewport, &mut state.rng) {
                state.launch_queue.push_back(request);
            }
            while let Some(request) = state.launch_queue.pop_front() {
                let rocket = state.launch(request, viewport);
                log::debug!(
                    "launch {:?} {} toward ({:.0}, {:.0})",
                    rocket.kind,
                    rocket.color.hex,
                    rocket.target_x,
                    rocket.target_y
                );
                state.rockets.push(rocket);
                self.stats.launches += 1;
            }
        }

        state.draw_static(canvas);

        if state.sky.animating {
            state.flare.draw(canvas);

            let gravity = state.sky.gravity_factor();
            let stats = &mut self.stats;
            let SimulationState {
                sky,
                rockets,
                particles,
                flare,
                rng,
                ..
            } = state;
            rockets.retain_mut(|rocket| match rocket.ascend(gravity, rng) {
                Ascent::Climbing { trail } => {
                    particles.absorb(trail);
                    rocket.draw(canvas);
                    !rocket.is_exploded()
                }
                Ascent::Detonate => {
                    if let Some(detonation) = explosion::detonate(rocket, rng) {
                        if detonation.lights_sky {
                            sky.set_target_hue(detonation.hue);
                            flare.ignite(detonation.x, detonation.y, detonation.hue);
                        }
                        log::debug!(
                            "{:?} burst at ({:.0}, {:.0}): {} particles, {} fragments",
                            rocket.kind,
                            detonation.x,
                            detonation.y,
                            detonation.particles.len(),
                            detonation.fragments.len()
                        );
                        stats.detonations += 1;
                        stats.fragments += detonation.fragments.len() as u64;
                        particles.absorb(detonation.particles);
                    }
                    false
                }
            });

            particles.step_and_draw(gravity, canvas);
        }

        if self.notice.as_ref().is_some_and(|n| self.clock_ms >= n.expires_at_ms) {
            self.notice = None;
        }
    }

    /// Controls strip plus the message box, if one is showing.
    pub fn chrome(&self) -> Chrome {
        let Some(canvas) = self.canvas.as_ref() else {
            return Chrome::default();
        };
        let (cols, _) = canvas.cell_size();
        let sky = &self.state.sky;
        let mut chrome = Chrome::layout(cols as u16, sky.dark_mode, sky.gravity.name(), sky.animating);
        chrome.notice = self.notice.as_ref().map(|notice| {
            let width = notice_text(notice).chars().count() as u16;
            Region {
                column: (cols as u16).saturating_sub(width) / 2,
                row: 1,
                width,
            }
        });
        chrome
    }

    pub fn overlays(&self) -> Vec<Overlay> {
        let (fg, bg): (Rgb, Rgb) = if self.state.sky.dark_mode {
            ((230, 230, 240), (30, 30, 45))
        } else {
            ((20, 20, 30), (225, 225, 215))
        };
        let chrome = self.chrome();
        let mut overlays: Vec<Overlay> = chrome
            .buttons
            .iter()
            .map(|button| Overlay {
                column: button.region.column,
                row: button.region.row,
                text: button.label.clone(),
                fg,
                bg,
            })
            .collect();
        if let (Some(notice), Some(region)) = (self.notice.as_ref(), chrome.notice) {
            overlays.push(Overlay {
                column: region.column,
                row: region.row,
                text: notice_text(notice),
                fg: bg,
                bg: fg,
            });
        }
        overlays
    }

    pub fn present<W: Write>(&mut self, out: &mut W) -> std::io::Result<()> {
        let overlays = self.overlays();
        match self.canvas.as_mut() {
            Some(canvas) => canvas.present(out, &overlays),
            None => Ok(()),
        }
    }
}

fn notice_text(notice: &Notice) -> String {
    format!("  {}  ", notice.text)
}
