use std::env;
use std::path::PathBuf;

pub const DEFAULT_SCALE: f32 = 4.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Viewport units per pixel.
    pub scale: f32,
    /// `None` keeps preferences in memory only.
    pub prefs_path: Option<PathBuf>,
    pub log_path: PathBuf,
    pub seed: Option<u64>,
}

#[derive(Debug, PartialEq)]
pub enum Command {
    Run(Config),
    Help,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            prefs_path: default_prefs_path(),
            log_path: env::temp_dir().join("skyfire.log"),
            seed: None,
        }
    }
}

fn default_prefs_path() -> Option<PathBuf> {
    let base = env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(base.join("skyfire").join("prefs.json"))
}

pub fn print_usage() {
    eprintln!("skyfire - Interactive fireworks over a day/night sky");
    eprintln!();
    eprintln!("Usage: skyfire [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scale N      Viewport units per pixel (default {})", DEFAULT_SCALE);
    eprintln!("  --prefs PATH   Preference file (default ~/.config/skyfire/prefs.json)");
    eprintln!("  --log PATH     Log file (default <temp>/skyfire.log, level from RUST_LOG)");
    eprintln!("  --seed N       Seed the random generator");
    eprintln!();
    eprintln!("Controls:");
    eprintln!("  click          Launch a firework at the pointer");
    eprintln!("  d              Toggle day/night");
    eprintln!("  g              Cycle gravity (Low/Normal/High)");
    eprintln!("  space, f       Toggle fireworks animation");
    eprintln!();
    eprintln!("Press 'q', ESC, or Ctrl+C to exit");
}

/// Parses everything after the program name.
pub fn parse_args(args: &[String]) -> Result<Command, String> {
    let mut config = Config::default();

    let mut i = 0;
    while i < args.len() {
        let value = |i: usize| {
            args.get(i + 1)
                .map(String::as_str)
                .ok_or_else(|| format!("{} requires a value", args[i]))
        };
        match args[i].as_str() {
            "--scale" => {
                let raw = value(i)?;
                match raw.parse::<f32>() {
                    Ok(scale) if scale > 0.0 && scale.is_finite() => config.scale = scale,
                    _ => return Err(format!("Invalid scale: {}", raw)),
                }
                i += 2;
            }
            "--prefs" => {
                config.prefs_path = Some(PathBuf::from(value(i)?));
                i += 2;
            }
            "--log" => {
                config.log_path = PathBuf::from(value(i)?);
                i += 2;
            }
            "--seed" => {
                let raw = value(i)?;
                config.seed = Some(raw.parse().map_err(|_| format!("Invalid seed: {}", raw))?);
                i += 2;
            }
            "help" | "--help" | "-h" => return Ok(Command::Help),
            arg => return Err(format!("Unknown option: {}", arg)),
        }
    }

    Ok(Command::Run(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_all_options() {
        let cmd = parse_args(&args(&["--scale", "2.5", "--prefs", "/tmp/p.json", "--log", "/tmp/l.log", "--seed", "9"])).unwrap();
        let Command::Run(config) = cmd else { panic!("expected run") };
        assert_eq!(config.scale, 2.5);
        assert_eq!(config.prefs_path, Some(PathBuf::from("/tmp/p.json")));
        assert_eq!(config.log_path, PathBuf::from("/tmp/l.log"));
        assert_eq!(config.seed, Some(9));
    }

    #[test]
    fn empty_args_use_defaults() {
        let Command::Run(config) = parse_args(&[]).unwrap() else { panic!("expected run") };
        assert_eq!(config.scale, DEFAULT_SCALE);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_args(&args(&["--scale", "0"])).is_err());
        assert!(parse_args(&args(&["--scale", "nan"])).is_err());
        assert!(parse_args(&args(&["--seed"])).is_err());
        assert!(parse_args(&args(&["--bogus"])).is_err());
        assert_eq!(parse_args(&args(&["-h"])), Ok(Command::Help));
    }
}
