//! Launcher input fields.
//!
//! Each input is a slider paired with a text field (or a label). Moving the
//! slider rewrites the text; text that does not parse falls back to a default
//! instead of failing.

use crate::launch::LaunchParameters;

pub const DEFAULT_ANGLE: f32 = 45.0;
pub const DEFAULT_FORCE: f32 = 10.0;
pub const DEFAULT_MASS: f32 = 1.0;

/// Parse `text` as a float, returning `fallback` when it is malformed.
pub fn parse_or(text: &str, fallback: f32) -> f32 {
    text.trim().parse().unwrap_or(fallback)
}

/// A slider paired with a text mirror.
#[derive(Debug, Clone, PartialEq)]
pub struct InputField {
    /// Slider position; `None` when the scene has no slider for this input.
    slider: Option<f32>,
    text: String,
    decimals: usize,
    suffix: &'static str,
    fallback: f32,
}

impl InputField {
    pub fn new(initial: f32, decimals: usize, fallback: f32) -> Self {
        let mut field = Self {
            slider: Some(initial),
            text: String::new(),
            decimals,
            suffix: "",
            fallback,
        };
        field.sync_text(initial);
        field
    }

    /// Text appended after the formatted number (e.g. `" kg"`).
    pub fn with_suffix(mut self, suffix: &'static str) -> Self {
        self.suffix = suffix;
        self.sync_text(self.slider.unwrap_or(self.fallback));
        self
    }

    /// Drop the slider; values are then read from the text.
    pub fn without_slider(mut self) -> Self {
        self.slider = None;
        self
    }

    /// Slider moved: store the value and mirror it into the text.
    pub fn set_slider(&mut self, value: f32) {
        self.slider = Some(value);
        self.sync_text(value);
    }

    /// Text edited by the user. The slider is left alone.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn slider(&self) -> Option<f32> {
        self.slider
    }

    /// Slider value, else the parsed text, else the fallback.
    pub fn value(&self) -> f32 {
        match self.slider {
            Some(value) => value,
            None => {
                let number = self.text.strip_suffix(self.suffix).unwrap_or(&self.text);
                parse_or(number, self.fallback)
            }
        }
    }

    fn sync_text(&mut self, value: f32) {
        self.text = format!("{:.*}{}", self.decimals, value, self.suffix);
    }
}

/// The launcher's three inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct LauncherControls {
    pub angle: InputField,
    pub force: InputField,
    pub mass: InputField,
}

impl LauncherControls {
    pub fn new(params: LaunchParameters) -> Self {
        Self {
            angle: InputField::new(params.angle, 1, DEFAULT_ANGLE),
            force: InputField::new(params.force, 1, DEFAULT_FORCE),
            mass: InputField::new(params.mass, 2, DEFAULT_MASS).with_suffix(" kg"),
        }
    }

    /// Current launch parameters as the fire button would read them.
    pub fn parameters(&self) -> LaunchParameters {
        LaunchParameters::new(self.angle.value(), self.force.value(), self.mass.value())
    }
}

impl Default for LauncherControls {
    fn default() -> Self {
        Self::new(LaunchParameters::default())
    }
}
