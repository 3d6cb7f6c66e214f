pub type Rgb = (u8, u8, u8);

pub const WHITE: Rgb = (255, 255, 255);
pub const BLACK: Rgb = (0, 0, 0);

/// A launch colour: the hex it was picked by plus the hue the sky eases toward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShellColor {
    pub hex: &'static str,
    pub rgb: Rgb,
    pub hue: f32,
}

/// Launch colours as (hex, hue in degrees).
pub const PALETTE: [(&str, f32); 16] = [
    ("#FFC300", 45.0),
    ("#FF5733", 14.0),
    ("#C70039", 344.0),
    ("#900C3F", 329.0),
    ("#581845", 316.0),
    ("#33FFBD", 164.0),
    ("#337AFF", 218.0),
    ("#B833FF", 280.0),
    ("#FFFFFF", 0.0),
    ("#4DFF5E", 125.0),
    ("#FF33CC", 320.0),
    ("#33D7FF", 193.0),
    ("#C0C0C0", 0.0),
    ("#FF8A00", 31.0),
    ("#AAFF33", 85.0),
    ("#33AFFF", 200.0),
];

impl ShellColor {
    pub fn parse(hex: &'static str, hue: f32) -> Option<Self> {
        Some(Self {
            hex,
            rgb: parse_hex_color(hex)?,
            hue: normalize_hue(hue),
        })
    }
}

pub fn palette_color(index: usize) -> Option<ShellColor> {
    let (hex, hue) = *PALETTE.get(index)?;
    ShellColor::parse(hex, hue)
}

pub fn random_shell_color(rng: &mut fastrand::Rng) -> ShellColor {
    let index = rng.usize(0..PALETTE.len());
    palette_color(index).unwrap_or(ShellColor {
        hex: "#FFFFFF",
        rgb: WHITE,
        hue: 0.0,
    })
}

pub fn parse_hex_color(hex: &str) -> Option<Rgb> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

/// Wraps any angle into [0, 360).
pub fn normalize_hue(hue: f32) -> f32 {
    let h = hue.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if h >= 360.0 { 0.0 } else { h }
}

/// `hue` in degrees, `saturation` and `lightness` in [0, 1].
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> Rgb {
    let h = normalize_hue(hue) / 60.0;
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    (
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    )
}
