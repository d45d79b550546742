//! Overlay definition types
//!
//! An overlay is an extra visual layer (image, text, or vector shapes)
//! rendered attached to a token, distinct from its base image. These types
//! describe the authored configuration; the engine expands them into
//! per-node configs and the host backend rasterizes them.

use serde::{Deserialize, Serialize};

/// Text content rendered to a texture by the host backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextConfig {
    /// Text to render; may contain `{{property.path}}` template expressions
    /// substituted against live token data
    pub text: String,

    #[serde(default = "default_font_family")]
    pub font_family: String,

    #[serde(default = "default_font_size")]
    pub font_size: f32,

    /// Fill color as a CSS-style string (e.g. `#ffffff`)
    #[serde(default = "default_fill")]
    pub fill: String,

    /// Arc in degrees the text is bent along (0 = straight)
    #[serde(default)]
    pub curvature: f32,

    /// Repeat the text around the full arc
    #[serde(default)]
    pub repeating: bool,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_family: default_font_family(),
            font_size: default_font_size(),
            fill: default_fill(),
            curvature: 0.0,
            repeating: false,
        }
    }
}

/// A single vector shape within an overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeConfig {
    pub shape: Shape,

    /// Fill color (None = unfilled)
    pub fill: Option<String>,

    /// Stroke color (None = no stroke)
    pub line: Option<String>,

    #[serde(default)]
    pub line_width: f32,

    /// Offset from the overlay origin, in grid units
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// Shape geometry, in grid units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Shape {
    Rectangle { width: f64, height: f64, radius: f64 },
    Ellipse { rx: f64, ry: f64 },
    Polygon { points: Vec<[f64; 2]> },
}

/// Continuous animation applied to an overlay node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Rotate the node continuously
    #[serde(default)]
    pub rotate: bool,

    /// Rotation period in milliseconds
    #[serde(default = "default_animation_duration")]
    pub duration_ms: u32,

    #[serde(default = "default_true")]
    pub clockwise: bool,
}

/// Named visual filter applied to an overlay node.
///
/// Filter implementations are opaque pluggable effects owned by the host;
/// the engine only diffs name + options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub name: String,

    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub options: serde_json::Value,
}

/// Full authored definition of one overlay node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Mapping id of the parent overlay node. None attaches the node
    /// directly to the token.
    pub parent: Option<String>,

    // ─── Content (image, text, or shapes) ───────────────────────────────────
    /// Image path; may contain `{{property.path}}` template expressions
    pub img: Option<String>,

    pub text: Option<TextConfig>,

    #[serde(default)]
    pub shapes: Vec<ShapeConfig>,

    // ─── Transform ──────────────────────────────────────────────────────────
    /// Offset from the attachment point, in grid units
    #[serde(default)]
    pub offset_x: f64,
    #[serde(default)]
    pub offset_y: f64,

    #[serde(default = "default_scale")]
    pub scale_x: f64,
    #[serde(default = "default_scale")]
    pub scale_y: f64,

    /// Rotation in degrees
    #[serde(default)]
    pub rotation: f64,

    #[serde(default = "default_opacity")]
    pub opacity: f64,

    pub animation: Option<AnimationConfig>,

    pub filter: Option<FilterConfig>,

    // ─── Placement ──────────────────────────────────────────────────────────
    /// Render beneath the token instead of above it
    #[serde(default)]
    pub underlay: bool,

    /// Render on the screen-space UI layer instead of the world canvas
    #[serde(default)]
    pub ui: bool,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            parent: None,
            img: None,
            text: None,
            shapes: Vec::new(),
            offset_x: 0.0,
            offset_y: 0.0,
            scale_x: default_scale(),
            scale_y: default_scale(),
            rotation: 0.0,
            opacity: default_opacity(),
            animation: None,
            filter: None,
            underlay: false,
            ui: false,
        }
    }
}

impl OverlayConfig {
    /// Whether the content sources (image/text/shapes) are identical.
    /// A content change requires regenerating the node's texture.
    pub fn same_content(&self, other: &Self) -> bool {
        self.img == other.img && self.text == other.text && self.shapes == other.shapes
    }

    /// Whether transform, animation, and filter fields are identical.
    /// These refresh in place without touching the texture.
    pub fn same_transform(&self, other: &Self) -> bool {
        self.offset_x == other.offset_x
            && self.offset_y == other.offset_y
            && self.scale_x == other.scale_x
            && self.scale_y == other.scale_y
            && self.rotation == other.rotation
            && self.opacity == other.opacity
            && self.animation == other.animation
            && self.filter == other.filter
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Serde Helpers
// ═══════════════════════════════════════════════════════════════════════════

fn default_true() -> bool {
    true
}

fn default_font_family() -> String {
    "Signika".to_string()
}

fn default_font_size() -> f32 {
    36.0
}

fn default_fill() -> String {
    "#ffffff".to_string()
}

fn default_scale() -> f64 {
    1.0
}

fn default_opacity() -> f64 {
    1.0
}

fn default_animation_duration() -> u32 {
    5000
}
