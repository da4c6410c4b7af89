//! User-facing reader preferences.

use alloc::string::String;
use core::fmt::Write as _;

use crate::{
    layout::{PageLayout, PlanOptions, ReadingDirection},
    viewport::ViewportSize,
};

pub const MIN_TYPE_SCALE_PERCENT: u16 = 50;
pub const MAX_TYPE_SCALE_PERCENT: u16 = 300;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum FontFamily {
    #[default]
    Publisher,
    Serif,
    Sans,
    Dyslexic,
    Duo,
    Georgia,
    Helvetica,
}

impl FontFamily {
    pub const ALL: [Self; 7] = [
        Self::Publisher,
        Self::Serif,
        Self::Sans,
        Self::Dyslexic,
        Self::Duo,
        Self::Georgia,
        Self::Helvetica,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Publisher => "publisher",
            Self::Serif => "serif",
            Self::Sans => "sans",
            Self::Dyslexic => "dyslexic",
            Self::Duo => "duo",
            Self::Georgia => "georgia",
            Self::Helvetica => "helvetica",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|family| family.label() == label)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Theme {
    #[default]
    System,
    Light,
    Sepia,
    Dark,
}

impl Theme {
    pub const fn label(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Light => "light",
            Self::Sepia => "sepia",
            Self::Dark => "dark",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        [Self::System, Self::Light, Self::Sepia, Self::Dark]
            .into_iter()
            .find(|theme| theme.label() == label)
    }
}

/// Typography for reflowable chapters. Any change invalidates pagination.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ReflowStyle {
    pub font_family: FontFamily,
    /// Type scale in percent of the publisher size.
    pub type_scale_percent: u16,
    pub theme: Theme,
}

impl Default for ReflowStyle {
    fn default() -> Self {
        Self {
            font_family: FontFamily::Publisher,
            type_scale_percent: 100,
            theme: Theme::System,
        }
    }
}

impl ReflowStyle {
    pub fn with_type_scale_percent(mut self, percent: u16) -> Self {
        self.type_scale_percent = percent.clamp(MIN_TYPE_SCALE_PERCENT, MAX_TYPE_SCALE_PERCENT);
        self
    }

    /// `fontFamily=serif;typeScale=1.25;theme=dark`
    pub fn encode_raw(&self) -> String {
        let mut raw = String::new();
        let _ = write!(
            raw,
            "fontFamily={};typeScale={}.{:02};theme={}",
            self.font_family.label(),
            self.type_scale_percent / 100,
            self.type_scale_percent % 100,
            self.theme.label()
        );
        raw
    }

    /// Parses [`Self::encode_raw`] output. Unknown keys are skipped and
    /// malformed values fall back to their defaults.
    pub fn decode_raw(raw: &str) -> Self {
        let mut style = Self::default();
        for field in raw.split(';') {
            let Some((key, value)) = field.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "fontFamily" => {
                    if let Some(family) = FontFamily::from_label(value) {
                        style.font_family = family;
                    }
                }
                "typeScale" => {
                    if let Some(percent) = parse_scale_percent(value) {
                        style = style.with_type_scale_percent(percent);
                    }
                }
                "theme" => {
                    if let Some(theme) = Theme::from_label(value) {
                        style.theme = theme;
                    }
                }
                _ => {}
            }
        }
        style
    }
}

fn parse_scale_percent(value: &str) -> Option<u16> {
    let scale = value.parse::<f32>().ok()?;
    if !scale.is_finite() || scale <= 0.0 {
        return None;
    }
    let percent = scale * 100.0 + 0.5;
    Some(percent.min(u16::MAX as f32) as u16)
}

/// Per-book reading preferences.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ReaderSettings {
    pub direction: ReadingDirection,
    pub page_layout: PageLayout,
    pub isolate_cover: bool,
    pub tap_to_turn: bool,
    pub style: ReflowStyle,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            direction: ReadingDirection::LeftToRight,
            page_layout: PageLayout::Single,
            isolate_cover: true,
            tap_to_turn: true,
            style: ReflowStyle::default(),
        }
    }
}

impl ReaderSettings {
    /// Layout options for `viewport`. Continuous modes never pair pages.
    pub fn plan_options(&self, viewport: ViewportSize) -> PlanOptions {
        PlanOptions {
            dual_page: !self.direction.is_vertical() && self.page_layout.dual_active(viewport),
            isolate_cover: self.isolate_cover,
            direction: self.direction,
        }
    }
}
