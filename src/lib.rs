//! Fireworks over a day/night sky, drawn in the terminal with half blocks.

pub mod canvas;
pub mod color;
pub mod config;
pub mod driver;
pub mod entities;
pub mod explosion;
pub mod input;
pub mod prefs;
pub mod scheduler;
pub mod sky;
