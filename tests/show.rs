use skyfire::canvas::{Canvas, Capability};
use skyfire::driver::FrameDriver;
use skyfire::entities::{FireworkKind, MAX_PARTICLES, PARTICLE_LIFE};
use skyfire::prefs::{MemoryStore, Preferences, Theme};
use skyfire::scheduler::LaunchRequest;
use skyfire::sky::{GROUND_SEGMENTS, STAR_COUNT};

const SCALE: f32 = 4.0;

fn show(theme: Theme, animating: bool, seed: u64) -> FrameDriver {
    let canvas = Canvas::new(120, 40, SCALE).unwrap();
    FrameDriver::new(
        Capability::Enabled(canvas),
        Preferences { theme, animating },
        Box::new(MemoryStore::default()),
        fastrand::Rng::with_seed(seed),
    )
}

/// A show with auto-launch paused so only explicit launches fly.
fn quiet_show(theme: Theme, seed: u64) -> FrameDriver {
    let mut driver = show(theme, true, seed);
    driver.set_hidden(true);
    driver
}

fn center_launch(driver: &FrameDriver, kind: FireworkKind) -> LaunchRequest {
    let (w, h) = driver.viewport().unwrap();
    LaunchRequest { x: w / 2.0, y: h / 2.0, kind: Some(kind) }
}

#[test]
fn standard_launch_at_center_detonates_and_tints_sky() {
    let mut driver = quiet_show(Theme::Dark, 21);
    let request = center_launch(&driver, FireworkKind::Standard);
    assert!(driver.request_launch(request));

    driver.tick();
    assert_eq!(driver.state().rockets.len(), 1);
    let rocket = driver.state().rockets[0].clone();
    let (_, h) = driver.viewport().unwrap();
    assert!(rocket.target_y <= h * 0.2);

    let mut ticks = 0;
    while !driver.state().rockets.is_empty() {
        let before = driver.state().rockets[0].y;
        driver.tick();
        if let Some(r) = driver.state().rockets.first() {
            assert!(r.y < before, "rocket should climb every tick");
        }
        ticks += 1;
        assert!(ticks < 200);
    }

    assert_eq!(driver.stats().detonations, 1);
    assert_eq!(driver.stats().fragments, 0);

    let burst = driver
        .state()
        .particles
        .iter()
        .filter(|p| p.life == PARTICLE_LIFE - 1)
        .count();
    assert!((70..=119).contains(&burst), "burst of {}", burst);

    assert_eq!(driver.state().sky.target_hue, rocket.color.hue);
    let flare = &driver.state().flare;
    assert!(flare.active);
    assert!(flare.y <= rocket.target_y);
}

#[test]
fn flower_burst_has_white_core() {
    let mut driver = quiet_show(Theme::Light, 4);
    driver.request_launch(center_launch(&driver, FireworkKind::Flower));
    while driver.stats().detonations == 0 {
        driver.tick();
    }
    let core = driver
        .state()
        .particles
        .iter()
        .filter(|p| p.life == 40 - 1 && p.color == (255, 255, 255))
        .count();
    assert_eq!(core, 48);
}

#[test]
fn bomb_scatters_fragments() {
    let mut driver = quiet_show(Theme::Dark, 8);
    driver.request_launch(center_launch(&driver, FireworkKind::Bomb));
    while driver.stats().detonations == 0 {
        driver.tick();
    }
    let fragments = driver.stats().fragments as usize;
    assert!((5..=9).contains(&fragments));
    assert!(driver.state().rockets.is_empty());
    let burst = driver
        .state()
        .particles
        .iter()
        .filter(|p| p.life == PARTICLE_LIFE - 1)
        .count();
    assert_eq!(burst, fragments * 40);
}

#[test]
fn particle_cap_holds_under_barrage() {
    let mut driver = quiet_show(Theme::Dark, 77);
    let (w, h) = driver.viewport().unwrap();
    for tick in 0..400 {
        if tick % 3 == 0 {
            for i in 0..4 {
                driver.request_launch(LaunchRequest {
                    x: w * (i as f32 + 0.5) / 4.0,
                    y: h * 0.1,
                    kind: Some(FireworkKind::Bomb),
                });
            }
        }
        driver.tick();
        assert!(driver.state().particles.len() <= MAX_PARTICLES);
        for p in driver.state().particles.iter() {
            assert!(p.life > 0 && p.alpha > 0.0);
        }
        let sky = &driver.state().sky;
        assert!((0.0..360.0).contains(&sky.current_hue));
        assert!((0.0..360.0).contains(&sky.target_hue));
    }
    assert!(driver.stats().detonations > 0);
}

#[test]
fn disabling_animation_freezes_entities_and_draws_static_sky() {
    let mut driver = quiet_show(Theme::Light, 13);
    driver.set_hidden(false);
    driver.tick();
    driver.tick();
    assert!(driver.scheduler().is_running());
    let rocket = driver.state().rockets[0].clone();
    let head = ((rocket.x / SCALE) as usize, (rocket.y / SCALE) as usize);
    let near_white = |c: (u8, u8, u8)| c.0 > 250 && c.1 > 250 && c.2 > 250;
    assert!(near_white(driver.canvas().unwrap().pixel(head.0, head.1)));

    driver.toggle_animation();
    assert!(!driver.scheduler().is_running());
    assert!(!near_white(driver.canvas().unwrap().pixel(head.0, head.1)));

    let launches = driver.stats().launches;
    let particles = driver.state().particles.len();
    // Well past the longest auto-launch delay.
    for _ in 0..600 {
        driver.tick();
    }
    assert_eq!(driver.stats().launches, launches);
    assert_eq!(driver.state().rockets.len(), 1);
    assert_eq!(driver.state().rockets[0].y, rocket.y);
    assert_eq!(driver.state().particles.len(), particles);

    driver.toggle_animation();
    assert!(driver.scheduler().is_running());
    driver.tick();
    assert_eq!(driver.stats().launches, launches + 1);
}

#[test]
fn resize_regenerates_backdrop() {
    let mut driver = show(Theme::Dark, true, 3);
    let old_star = driver.state().stars.stars[0].clone();

    driver.resize(200, 60);
    let (w, h) = driver.viewport().unwrap();
    assert_eq!((w, h), (200.0 * SCALE, 120.0 * SCALE));

    let state = driver.state();
    assert_eq!(state.stars.len(), STAR_COUNT);
    assert_eq!(state.ground.segments(), GROUND_SEGMENTS);
    assert!((state.ground.points.last().unwrap().0 - w).abs() < 1e-2);
    assert!(state.stars.stars.iter().all(|s| s.x <= w && s.y <= h * 0.7));
    assert_ne!((state.stars.stars[0].x, state.stars.stars[0].y), (old_star.x, old_star.y));
}

#[test]
fn launch_requests_from_clicks() {
    use crossterm::event::{Event, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

    let mut driver = quiet_show(Theme::Dark, 30);
    driver.handle_event(&Event::Mouse(MouseEvent {
        kind: MouseEventKind::Down(MouseButton::Left),
        column: 60,
        row: 20,
        modifiers: KeyModifiers::NONE,
    }));
    driver.tick();
    assert_eq!(driver.stats().launches, 1);
    let rocket = &driver.state().rockets[0];
    assert_eq!(rocket.target_x, 60.5 * SCALE);
}

#[test]
fn presented_frame_fills_the_terminal() {
    let mut driver = show(Theme::Dark, true, 1);
    for _ in 0..10 {
        driver.tick();
    }
    let mut out = Vec::new();
    driver.present(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.matches('▄').count(), 120 * 40);
    assert!(text.contains("Fireworks: on"));
}
