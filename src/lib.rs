pub mod application;
pub mod config;
pub mod contracts;
pub mod feedback;
pub mod form;
pub mod motion;
pub mod navigation;
pub mod reveal;

pub use application::LandingPage;
pub use config::{ConfigError, LandingConfig};
