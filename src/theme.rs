//! Colour palettes and the light/dark theme controller.
//!
//! Screens never decide the colour scheme themselves. The [`ThemeController`]
//! owns the dark flag and is the only caller of [`Appearance::apply`], the
//! boundary through which the active palette changes.

use std::fmt;

use catppuccin::PALETTE;
use clap::ValueEnum;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ThemeConfig;

/// Convert a catppuccin color to a ratatui color.
const fn catppuccin_to_color(c: &catppuccin::Color) -> Color {
    Color::Rgb(c.rgb.r, c.rgb.g, c.rgb.b)
}

/// Colours used to draw the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub base: Color,
    pub mantle: Color,
    pub surface0: Color,
    pub surface1: Color,
    pub surface2: Color,
    pub overlay0: Color,
    pub overlay1: Color,
    pub text: Color,
    pub subtext0: Color,
    pub subtext1: Color,
    pub mauve: Color,
    pub red: Color,
    pub peach: Color,
    pub yellow: Color,
    pub green: Color,
    pub sky: Color,
    pub blue: Color,
    pub lavender: Color,
}

impl Theme {
    const fn from_catppuccin(flavor: &catppuccin::Flavor) -> Self {
        let c = &flavor.colors;
        Self {
            base: catppuccin_to_color(&c.base),
            mantle: catppuccin_to_color(&c.mantle),
            surface0: catppuccin_to_color(&c.surface0),
            surface1: catppuccin_to_color(&c.surface1),
            surface2: catppuccin_to_color(&c.surface2),
            overlay0: catppuccin_to_color(&c.overlay0),
            overlay1: catppuccin_to_color(&c.overlay1),
            text: catppuccin_to_color(&c.text),
            subtext0: catppuccin_to_color(&c.subtext0),
            subtext1: catppuccin_to_color(&c.subtext1),
            mauve: catppuccin_to_color(&c.mauve),
            red: catppuccin_to_color(&c.red),
            peach: catppuccin_to_color(&c.peach),
            yellow: catppuccin_to_color(&c.yellow),
            green: catppuccin_to_color(&c.green),
            sky: catppuccin_to_color(&c.sky),
            blue: catppuccin_to_color(&c.blue),
            lavender: catppuccin_to_color(&c.lavender),
        }
    }

    /// Catppuccin Mocha theme (dark).
    #[must_use]
    pub fn catppuccin_mocha() -> Self {
        Self::from_catppuccin(&PALETTE.mocha)
    }

    /// Catppuccin Macchiato theme (dark).
    #[must_use]
    pub fn catppuccin_macchiato() -> Self {
        Self::from_catppuccin(&PALETTE.macchiato)
    }

    /// Catppuccin Frappé theme (dark).
    #[must_use]
    pub fn catppuccin_frappe() -> Self {
        Self::from_catppuccin(&PALETTE.frappe)
    }

    /// Catppuccin Latte theme (light).
    #[must_use]
    pub fn catppuccin_latte() -> Self {
        Self::from_catppuccin(&PALETTE.latte)
    }

    #[must_use]
    pub const fn base(&self) -> Color {
        self.base
    }

    #[must_use]
    pub const fn mantle(&self) -> Color {
        self.mantle
    }

    #[must_use]
    pub const fn surface0(&self) -> Color {
        self.surface0
    }

    #[must_use]
    pub const fn surface2(&self) -> Color {
        self.surface2
    }

    #[must_use]
    pub const fn overlay0(&self) -> Color {
        self.overlay0
    }

    #[must_use]
    pub const fn overlay1(&self) -> Color {
        self.overlay1
    }

    #[must_use]
    pub const fn text(&self) -> Color {
        self.text
    }

    #[must_use]
    pub const fn subtext0(&self) -> Color {
        self.subtext0
    }

    #[must_use]
    pub const fn subtext1(&self) -> Color {
        self.subtext1
    }

    #[must_use]
    pub const fn mauve(&self) -> Color {
        self.mauve
    }

    #[must_use]
    pub const fn peach(&self) -> Color {
        self.peach
    }

    #[must_use]
    pub const fn yellow(&self) -> Color {
        self.yellow
    }

    #[must_use]
    pub const fn blue(&self) -> Color {
        self.blue
    }

    #[must_use]
    pub const fn lavender(&self) -> Color {
        self.lavender
    }

    // Semantic colors
    #[must_use]
    pub const fn success(&self) -> Color {
        self.green
    }

    #[must_use]
    pub const fn error(&self) -> Color {
        self.red
    }

    #[must_use]
    pub const fn info(&self) -> Color {
        self.sky
    }

    #[must_use]
    pub const fn border(&self) -> Color {
        self.surface1
    }

    #[must_use]
    pub const fn border_focused(&self) -> Color {
        self.lavender
    }

    #[must_use]
    pub const fn selection_bg(&self) -> Color {
        self.surface1
    }

    #[must_use]
    pub const fn header(&self) -> Color {
        self.yellow
    }
}

/// Built-in palettes by display name.
fn palettes() -> [(&'static str, Theme); 4] {
    [
        ("Catppuccin Mocha", Theme::catppuccin_mocha()),
        ("Catppuccin Macchiato", Theme::catppuccin_macchiato()),
        ("Catppuccin Frappé", Theme::catppuccin_frappe()),
        ("Catppuccin Latte", Theme::catppuccin_latte()),
    ]
}

/// Look up a palette by name.
pub fn theme_from_name(name: &str) -> Option<Theme> {
    palettes()
        .into_iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, theme)| theme)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScheme {
    Light,
    Dark,
}

impl ColorScheme {
    pub const fn from_dark(dark: bool) -> Self {
        if dark { Self::Dark } else { Self::Light }
    }
}

impl fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Dark => write!(f, "dark"),
        }
    }
}

/// Asks the host environment whether it prefers a dark colour scheme.
pub trait SchemeProbe {
    /// `None` when the environment does not say.
    fn prefers_dark(&self) -> Option<bool>;
}

/// Reads the terminal's `COLORFGBG` variable (`"<fg>;<bg>"`).
pub struct TerminalProbe;

impl SchemeProbe for TerminalProbe {
    fn prefers_dark(&self) -> Option<bool> {
        std::env::var("COLORFGBG")
            .ok()
            .and_then(|value| dark_from_colorfgbg(&value))
    }
}

/// Interpret a `COLORFGBG` value by its background colour index.
fn dark_from_colorfgbg(value: &str) -> Option<bool> {
    let background: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
    match background {
        0..=6 | 8 => Some(true),
        7 | 9..=15 => Some(false),
        _ => None,
    }
}

/// Configured source of the initial colour scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    /// Follow the terminal.
    #[default]
    System,
    Dark,
    Light,
}

impl SchemeProbe for ThemePreference {
    fn prefers_dark(&self) -> Option<bool> {
        match self {
            Self::System => TerminalProbe.prefers_dark(),
            Self::Dark => Some(true),
            Self::Light => Some(false),
        }
    }
}

/// Where a colour scheme change becomes visible.
pub trait Appearance {
    fn apply(&mut self, scheme: ColorScheme);
}

/// The pair of palettes the UI switches between, plus the active one.
#[derive(Debug, Clone)]
pub struct Palette {
    dark: Theme,
    light: Theme,
    active: Theme,
}

impl Palette {
    pub const fn new(dark: Theme, light: Theme) -> Self {
        Self {
            dark,
            light,
            active: light,
        }
    }

    pub fn from_config(config: &ThemeConfig) -> Self {
        let dark = theme_from_name(&config.dark).unwrap_or_else(|| {
            debug!(name = %config.dark, "Unknown dark palette, using default");
            Theme::catppuccin_mocha()
        });
        let light = theme_from_name(&config.light).unwrap_or_else(|| {
            debug!(name = %config.light, "Unknown light palette, using default");
            Theme::catppuccin_latte()
        });
        Self::new(dark, light)
    }

    pub const fn active(&self) -> &Theme {
        &self.active
    }
}

impl Appearance for Palette {
    fn apply(&mut self, scheme: ColorScheme) {
        self.active = match scheme {
            ColorScheme::Dark => self.dark,
            ColorScheme::Light => self.light,
        };
    }
}

/// Shared light/dark state.
#[derive(Debug, Clone, Copy)]
pub struct ThemeController {
    dark: bool,
}

impl ThemeController {
    /// Derive the initial scheme from `probe` and apply it.
    ///
    /// An environment that gives no answer means light.
    pub fn initialize(probe: &dyn SchemeProbe, appearance: &mut dyn Appearance) -> Self {
        let dark = probe.prefers_dark().unwrap_or(false);
        let controller = Self { dark };
        appearance.apply(controller.scheme());
        info!(scheme = %controller.scheme(), "Initialized theme");
        controller
    }

    /// Flip between light and dark, returning the new dark flag.
    pub fn toggle(&mut self, appearance: &mut dyn Appearance) -> bool {
        self.dark = !self.dark;
        appearance.apply(self.scheme());
        debug!(scheme = %self.scheme(), "Toggled theme");
        self.dark
    }

    pub const fn scheme(&self) -> ColorScheme {
        ColorScheme::from_dark(self.dark)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        applied: Vec<ColorScheme>,
    }

    impl Appearance for Recorder {
        fn apply(&mut self, scheme: ColorScheme) {
            self.applied.push(scheme);
        }
    }

    struct Silent;

    impl SchemeProbe for Silent {
        fn prefers_dark(&self) -> Option<bool> {
            None
        }
    }

    #[test]
    fn colorfgbg_background_decides() {
        assert_eq!(dark_from_colorfgbg("15;0"), Some(true));
        assert_eq!(dark_from_colorfgbg("0;15"), Some(false));
        assert_eq!(dark_from_colorfgbg("12;default;8"), Some(true));
        assert_eq!(dark_from_colorfgbg("0;7"), Some(false));
        assert_eq!(dark_from_colorfgbg("default;default"), None);
        assert_eq!(dark_from_colorfgbg(""), None);
    }

    #[test]
    fn initialize_applies_probed_scheme() {
        let mut recorder = Recorder::default();
        let controller = ThemeController::initialize(&ThemePreference::Dark, &mut recorder);
        assert_eq!(controller.scheme(), ColorScheme::Dark);
        assert_eq!(recorder.applied, vec![ColorScheme::Dark]);
    }

    #[test]
    fn unavailable_preference_means_light() {
        let mut recorder = Recorder::default();
        let controller = ThemeController::initialize(&Silent, &mut recorder);
        assert_eq!(controller.scheme(), ColorScheme::Light);
        assert_eq!(recorder.applied, vec![ColorScheme::Light]);
    }

    #[test]
    fn toggle_negates_and_reapplies() {
        let mut recorder = Recorder::default();
        let mut controller = ThemeController::initialize(&ThemePreference::Light, &mut recorder);

        assert!(controller.toggle(&mut recorder));
        assert!(!controller.toggle(&mut recorder));
        assert_eq!(
            recorder.applied,
            vec![ColorScheme::Light, ColorScheme::Dark, ColorScheme::Light]
        );
    }

    #[test]
    fn palette_switches_active_theme() {
        let mut palette = Palette::from_config(&ThemeConfig::default());
        palette.apply(ColorScheme::Dark);
        assert_eq!(*palette.active(), Theme::catppuccin_mocha());
        palette.apply(ColorScheme::Light);
        assert_eq!(*palette.active(), Theme::catppuccin_latte());
    }

    #[test]
    fn unknown_palette_names_fall_back() {
        let config = ThemeConfig {
            dark: "Solarized".to_string(),
            ..ThemeConfig::default()
        };
        let mut palette = Palette::from_config(&config);
        palette.apply(ColorScheme::Dark);
        assert_eq!(*palette.active(), Theme::catppuccin_mocha());
        assert!(theme_from_name("Catppuccin Frappé").is_some());
    }
}
