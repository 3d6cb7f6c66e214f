use anyhow::{Context, Result};
use crossterm::{
    cursor::{Hide, Show},
    event::{self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use skyfire::canvas::Capability;
use skyfire::config::{self, Command, Config};
use skyfire::driver::FrameDriver;
use skyfire::prefs::{JsonFileStore, MemoryStore, PreferenceStore, Preferences, Theme};
use std::env;
use std::fs::OpenOptions;
use std::io::{self, stdout, BufWriter, IsTerminal};
use std::path::Path;
use std::time::{Duration, Instant};

fn init_logging(path: &Path) {
    let file = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("skyfire: logging disabled, cannot open {}: {}", path.display(), err);
            return;
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
}

fn is_quit(event: &Event) -> bool {
    let Event::Key(key_event) = event else {
        return false;
    };
    key_event.code == KeyCode::Char('q')
        || key_event.code == KeyCode::Esc
        || (key_event.code == KeyCode::Char('c') && key_event.modifiers.contains(event::KeyModifiers::CONTROL))
}

fn run_show(driver: &mut FrameDriver) -> Result<()> {
    let stdout = stdout();
    let mut stdout = BufWriter::with_capacity(1024 * 64, stdout);

    terminal::enable_raw_mode().context("failed to enable raw mode")?;
    let result = execute!(
        stdout,
        EnterAlternateScreen,
        Hide,
        Clear(ClearType::All),
        EnableMouseCapture,
        EnableFocusChange
    )
    .context("failed to set up the terminal")
    .and_then(|()| frame_loop(driver, &mut stdout));

    // Restore the terminal even when the show failed.
    let screen = execute!(stdout, DisableFocusChange, DisableMouseCapture, Show, LeaveAlternateScreen);
    let raw_mode = terminal::disable_raw_mode();

    settle(result, screen, raw_mode)
}

/// The show's own error wins over any failure to restore the terminal.
fn settle(show: Result<()>, screen: io::Result<()>, raw_mode: io::Result<()>) -> Result<()> {
    show?;
    screen.context("failed to restore the terminal")?;
    raw_mode.context("failed to disable raw mode")
}

fn frame_loop(driver: &mut FrameDriver, stdout: &mut BufWriter<io::Stdout>) -> Result<()> {
    let mut last_frame = Instant::now();
    let mut accumulator = 0.0f32;
    const FIXED_DT: f32 = 1.0 / 60.0;

    loop {
        if event::poll(Duration::from_millis(1))? {
            let event = event::read()?;
            if is_quit(&event) {
                break;
            }
            if let Event::Resize(..) = event {
                execute!(stdout, Clear(ClearType::All))?;
            }
            driver.handle_event(&event);
        }

        let now = Instant::now();
        let frame_time = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;

        accumulator += frame_time;
        if accumulator > FIXED_DT * 3.0 {
            accumulator = FIXED_DT * 3.0;
        }

        while accumulator >= FIXED_DT {
            driver.tick();
            accumulator -= FIXED_DT;
        }

        if let Err(err) = driver.present(stdout) {
            log::warn!("frame presentation failed: {}", err);
        }
    }

    log::info!("show stopped after {} ticks", driver.stats().ticks);
    Ok(())
}

fn open_store(config: &Config) -> Box<dyn PreferenceStore> {
    match &config.prefs_path {
        Some(path) => Box::new(JsonFileStore::open(path)),
        None => {
            log::warn!("no preference location; toggles will not persist");
            Box::new(MemoryStore::default())
        }
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let config = match config::parse_args(&args) {
        Ok(Command::Run(config)) => config,
        Ok(Command::Help) => {
            config::print_usage();
            return Ok(());
        }
        Err(message) => {
            eprintln!("{}", message);
            eprintln!();
            config::print_usage();
            std::process::exit(1);
        }
    };

    init_logging(&config.log_path);

    let store = open_store(&config);
    let system_theme = Theme::from_colorfgbg(env::var("COLORFGBG").ok().as_deref());
    let prefs = Preferences::load(store.as_ref(), system_theme);

    let surface = Capability::probe(stdout().is_terminal(), terminal::size(), config.scale);
    let rng = config.seed.map(fastrand::Rng::with_seed).unwrap_or_default();
    let mut driver = FrameDriver::new(surface, prefs, store, rng);
    if !driver.is_enabled() {
        eprintln!("skyfire: no terminal to draw on (see {})", config.log_path.display());
        return Ok(());
    }

    run_show(&mut driver)
}
