use std::time::Duration;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

impl StatusKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            StatusKind::Info => "info",
            StatusKind::Success => "success",
            StatusKind::Error => "error",
        }
    }
}

/// Content of the form's aggregate status region.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
    pub auto_hide: Option<Duration>,
}

impl StatusMessage {
    pub fn new(kind: StatusKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            auto_hide: None,
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(StatusKind::Info, text)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(StatusKind::Success, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(StatusKind::Error, text)
    }

    pub fn auto_hide(mut self, value: Option<Duration>) -> Self {
        self.auto_hide = value;
        self
    }

    /// Class list for the status element, e.g. `form-message success`.
    pub fn css_class(&self) -> String {
        format!("form-message {}", self.kind.as_str())
    }
}
