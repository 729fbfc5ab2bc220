use std::fmt::Write as _;

use serde::Deserialize;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MotionLevel {
    Full,
    /// Reveals happen without any transition.
    Reduced,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransitionPreset {
    None,
    Fade,
    FadeUp,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    Linear,
    Ease,
    EaseIn,
    EaseOut,
    EaseInOut,
}

impl Easing {
    pub const fn css(self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::Ease => "ease",
            Easing::EaseIn => "ease-in",
            Easing::EaseOut => "ease-out",
            Easing::EaseInOut => "ease-in-out",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MotionTransition {
    pub preset: TransitionPreset,
    pub duration_ms: u16,
    pub delay_ms: u16,
    pub offset_px: i16,
    pub easing: Easing,
}

impl Default for MotionTransition {
    fn default() -> Self {
        Self {
            preset: TransitionPreset::FadeUp,
            duration_ms: 600,
            delay_ms: 0,
            offset_px: 30,
            easing: Easing::Ease,
        }
    }
}

impl MotionTransition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preset(mut self, preset: TransitionPreset) -> Self {
        self.preset = preset;
        self
    }

    pub fn duration_ms(mut self, duration_ms: u16) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn delay_ms(mut self, delay_ms: u16) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn offset_px(mut self, offset_px: i16) -> Self {
        self.offset_px = offset_px;
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MotionConfig {
    pub level: MotionLevel,
    pub reveal: MotionTransition,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            level: MotionLevel::Full,
            reveal: MotionTransition::default(),
        }
    }
}

impl MotionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: MotionLevel) -> Self {
        self.level = level;
        self
    }

    pub fn reveal(mut self, reveal: MotionTransition) -> Self {
        self.reveal = reveal;
        self
    }

    /// The transition actually played for a reveal at this motion level.
    pub fn effective_reveal(&self) -> MotionTransition {
        match self.level {
            MotionLevel::Full => self.reveal,
            MotionLevel::Reduced => self
                .reveal
                .preset(TransitionPreset::None)
                .duration_ms(0)
                .delay_ms(0),
        }
    }

    /// CSS hiding `selectors` until they receive `revealed_class`, with a
    /// `prefers-reduced-motion` override that shows them statically.
    pub fn reveal_stylesheet(&self, selectors: &[&str], revealed_class: &str) -> String {
        let base = selectors.join(", ");
        let revealed = selectors
            .iter()
            .map(|selector| format!("{selector}.{revealed_class}"))
            .collect::<Vec<_>>()
            .join(", ");
        let profile = self.effective_reveal();
        let (hidden_opacity, hidden_transform) = match profile.preset {
            TransitionPreset::None => (1, "none".to_string()),
            TransitionPreset::Fade => (0, "none".to_string()),
            TransitionPreset::FadeUp => (0, format!("translateY({}px)", profile.offset_px)),
        };

        let mut css = String::new();
        let _ = writeln!(css, "{base} {{");
        let _ = writeln!(css, "  opacity: {hidden_opacity};");
        let _ = writeln!(css, "  transform: {hidden_transform};");
        if profile.duration_ms > 0 {
            let _ = writeln!(
                css,
                "  transition: all {}s {} {}s;",
                f32::from(profile.duration_ms) / 1000.0,
                profile.easing.css(),
                f32::from(profile.delay_ms) / 1000.0
            );
        } else {
            let _ = writeln!(css, "  transition: none;");
        }
        let _ = writeln!(css, "}}");
        let _ = writeln!(css, "{revealed} {{");
        let _ = writeln!(css, "  opacity: 1;");
        let _ = writeln!(css, "  transform: none;");
        let _ = writeln!(css, "}}");
        let _ = writeln!(css, "@media (prefers-reduced-motion: reduce) {{");
        let _ = writeln!(css, "  {base} {{");
        let _ = writeln!(css, "    transition: none;");
        let _ = writeln!(css, "    opacity: 1;");
        let _ = writeln!(css, "    transform: none;");
        let _ = writeln!(css, "  }}");
        let _ = writeln!(css, "}}");
        css
    }
}
