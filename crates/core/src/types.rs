//! Domain types for describing a deck before it is laid out.

use serde::{Serialize, Serializer};
use std::fmt;

/// Topic used when a deck arrives without one.
pub const DEFAULT_TOPIC: &str = "Presentation";

/// Theme style used when a deck arrives without one.
pub const DEFAULT_STYLE: &str = "default";

/// A validated deck, ready for layout.
///
/// Serializes to the persisted snapshot format (`topic`, `design_theme`,
/// `slides`). Reading goes through [`crate::extract`], which validates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckSpec {
    /// Presentation topic, shown on the title slide.
    pub topic: String,

    /// Colors and style name.
    #[serde(rename = "design_theme")]
    pub theme: Theme,

    /// Slides in presentation order.
    pub slides: Vec<SlideSpec>,
}

impl DeckSpec {
    /// Create a deck with the default theme.
    ///
    /// An empty topic is replaced with [`DEFAULT_TOPIC`].
    pub fn new(topic: impl Into<String>, slides: Vec<SlideSpec>) -> Self {
        let topic = topic.into();
        let topic = if topic.trim().is_empty() {
            DEFAULT_TOPIC.to_string()
        } else {
            topic
        };
        Self {
            topic,
            theme: Theme::default(),
            slides,
        }
    }

    /// Replace the theme.
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Serialize to the pretty-printed snapshot format.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Theme colors and style.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Theme {
    pub primary_color: Color,
    pub secondary_color: Color,
    pub accent_color: Color,
    pub style: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_color: Color::DEFAULT_PRIMARY,
            secondary_color: Color::DEFAULT_SECONDARY,
            accent_color: Color::DEFAULT_ACCENT,
            style: DEFAULT_STYLE.to_string(),
        }
    }
}

/// A 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const DEFAULT_PRIMARY: Color = Color::rgb(0x66, 0x7E, 0xEA);
    pub const DEFAULT_SECONDARY: Color = Color::rgb(0x76, 0x4B, 0xA2);
    pub const DEFAULT_ACCENT: Color = Color::rgb(0xF0, 0x93, 0xFB);

    /// Body text color for bullet points.
    pub const BODY_TEXT: Color = Color::rgb(50, 50, 50);

    /// Create a color from its components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` or `RRGGBB`, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Uppercase hex digits without the leading `#`, as DrawingML expects.
    pub fn hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.hex())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A single content slide.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideSpec {
    /// Slide heading.
    pub title: String,

    /// Bullet points in rendering order. Inline markup is kept verbatim.
    pub content: Vec<String>,

    /// Prompt for an external image generator. Not used by layout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_prompt: Option<String>,
}

impl SlideSpec {
    /// Create a slide with the given title and bullets.
    pub fn new(title: impl Into<String>, content: Vec<String>) -> Self {
        Self {
            title: title.into(),
            content,
            image_prompt: None,
        }
    }

    /// Attach an image prompt.
    pub fn with_image_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.image_prompt = Some(prompt.into());
        self
    }

    /// Merge an enhancement over this slide.
    ///
    /// Fields present in the patch overwrite; absent fields keep their
    /// current value.
    pub fn merged(self, patch: SlidePatch) -> Self {
        Self {
            title: patch.title.unwrap_or(self.title),
            content: patch.content.unwrap_or(self.content),
            image_prompt: patch.image_prompt.or(self.image_prompt),
        }
    }
}

/// Partial slide returned by an enhancement request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlidePatch {
    pub title: Option<String>,
    pub content: Option<Vec<String>>,
    pub image_prompt: Option<String>,
}
