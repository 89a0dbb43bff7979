//! Component Graph Style System
//!
//! Maps group color tokens and dependency origins to concrete colors and
//! edge strokes.

use crate::graph::DependencyOrigin;
use serde::{Deserialize, Serialize};

/// RGBA color; palette entries are opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rgb` / `#rrggbb` hex or one of the named palette tokens.
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        if let Some(hex) = token.strip_prefix('#') {
            return parse_hex(hex);
        }
        let named = match token.to_ascii_lowercase().as_str() {
            "blue" => COLOR_BLUE,
            "green" => COLOR_GREEN,
            "orange" => COLOR_ORANGE,
            "red" => COLOR_RED,
            "purple" => COLOR_PURPLE,
            "teal" => COLOR_TEAL,
            "yellow" => COLOR_YELLOW,
            "pink" => COLOR_PINK,
            "gray" | "grey" => COLOR_NEUTRAL,
            _ => return None,
        };
        Some(named)
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut parts = hex.chars().map(|c| channel(&c.to_string()).map(|v| v * 17));
            Some(Color::rgb(parts.next()??, parts.next()??, parts.next()??))
        }
        6 => Some(Color::rgb(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        _ => None,
    }
}

// ============================================================================
// Palette
// ============================================================================

pub const COLOR_BLUE: Color = Color::rgb(80, 130, 180);
pub const COLOR_GREEN: Color = Color::rgb(80, 140, 100);
pub const COLOR_ORANGE: Color = Color::rgb(220, 140, 60);
pub const COLOR_RED: Color = Color::rgb(190, 80, 80);
pub const COLOR_PURPLE: Color = Color::rgb(140, 100, 170);
pub const COLOR_TEAL: Color = Color::rgb(70, 150, 150);
pub const COLOR_YELLOW: Color = Color::rgb(200, 160, 80);
pub const COLOR_PINK: Color = Color::rgb(210, 120, 160);

/// Used for ungrouped rules and unknown color tokens.
pub const COLOR_NEUTRAL: Color = Color::rgb(158, 158, 158);

pub const COLOR_EDGE: Color = Color::rgb(120, 120, 120);
pub const COLOR_EDGE_CYCLE: Color = Color::rgb(200, 60, 60);

/// Resolve a group's color token, falling back to the neutral color.
pub fn group_color(token: Option<&str>) -> Color {
    token.and_then(Color::from_token).unwrap_or(COLOR_NEUTRAL)
}

/// Edge color and style
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeStyle {
    pub color: Color,
    pub width: f32,
    pub dashed: bool,
    pub arrow_head: bool,
}

/// Declared dependencies are solid, inferred-only ones dashed; edges on a
/// cycle are drawn in the warning color.
pub fn get_edge_style(origin: DependencyOrigin, in_cycle: bool) -> EdgeStyle {
    EdgeStyle {
        color: if in_cycle { COLOR_EDGE_CYCLE } else { COLOR_EDGE },
        width: if origin.is_declared() { 1.5 } else { 1.0 },
        dashed: !origin.is_declared(),
        arrow_head: true,
    }
}
