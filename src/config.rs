use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::form::{FormMessages, FormOptions};
use crate::motion::{Easing, MotionConfig, MotionLevel, MotionTransition, TransitionPreset};
use crate::navigation::CONTACT_SECTION;
use crate::reveal::{Margin, ObserverOptions};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct LandingConfig {
    pub form: FormConfig,
    pub messages: FormMessages,
    pub reveal: RevealConfig,
    pub navigation: NavigationConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    pub validate_on_input: bool,
    pub clear_on_success: bool,
    pub auto_hide_ms: u64,
    pub transport_delay_ms: u64,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            validate_on_input: true,
            clear_on_success: true,
            auto_hide_ms: 5_000,
            transport_delay_ms: 1_500,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    pub selectors: Vec<String>,
    pub revealed_class: String,
    pub threshold: f32,
    pub root_margin_bottom_px: f32,
    pub preset: TransitionPreset,
    pub duration_ms: u16,
    pub delay_ms: u16,
    pub offset_px: i16,
    pub easing: Easing,
    pub reduced_motion: bool,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            selectors: vec![".benefit-card".to_string(), ".service-card".to_string()],
            revealed_class: "animate-in".to_string(),
            threshold: 0.1,
            root_margin_bottom_px: -50.0,
            preset: TransitionPreset::FadeUp,
            duration_ms: 600,
            delay_ms: 0,
            offset_px: 30,
            easing: Easing::Ease,
            reduced_motion: false,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub call_master_target: String,
    pub scroll_on_success: Option<String>,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            call_master_target: CONTACT_SECTION.to_string(),
            scroll_on_success: None,
        }
    }
}

impl LandingConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Like [`LandingConfig::read`], but logs the problem and falls back to
    /// defaults instead of failing.
    pub fn load(path: &Path) -> Self {
        match Self::read(path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("{err}; using default landing config");
                Self::default()
            }
        }
    }

    pub fn form_options(&self) -> FormOptions {
        FormOptions {
            validate_on_input: self.form.validate_on_input,
            clear_on_success: self.form.clear_on_success,
            auto_hide: Duration::from_millis(self.form.auto_hide_ms),
            messages: self.messages.clone(),
        }
    }

    pub fn transport_delay(&self) -> Duration {
        Duration::from_millis(self.form.transport_delay_ms)
    }

    pub fn observer_options(&self) -> ObserverOptions {
        ObserverOptions {
            threshold: self.reveal.threshold.clamp(0.0, 1.0),
            root_margin: Margin {
                bottom: self.reveal.root_margin_bottom_px,
                ..Margin::default()
            },
        }
    }

    pub fn motion(&self) -> MotionConfig {
        let level = if self.reveal.reduced_motion {
            MotionLevel::Reduced
        } else {
            MotionLevel::Full
        };
        MotionConfig::new().level(level).reveal(
            MotionTransition::new()
                .preset(self.reveal.preset)
                .duration_ms(self.reveal.duration_ms)
                .delay_ms(self.reveal.delay_ms)
                .offset_px(self.reveal.offset_px)
                .easing(self.reveal.easing),
        )
    }
}
