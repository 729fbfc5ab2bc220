//! Seams between the page logic and whatever renders it.
//!
//! Nothing in this crate queries a document tree. Controllers are handed
//! implementations of these traits and only ever talk to the page through
//! them.

use crate::feedback::StatusMessage;
use crate::form::FieldKey;
use crate::motion::MotionTransition;
use crate::reveal::Rect;

/// Rendering surface of the contact form.
pub trait FormView: Send + Sync {
    /// Shows `message` in the field's error region and flags the input.
    fn show_field_error(&self, field: FieldKey, message: &str);
    fn clear_field_error(&self, field: FieldKey);
    fn show_status(&self, status: &StatusMessage);
    fn hide_status(&self);
    /// Empties every input of the form.
    fn clear_inputs(&self);
}

/// Layout queries and effects on the page outside the form.
pub trait PageSurface: Send + Sync {
    /// Height of the fixed header overlapping the top of the viewport.
    fn header_height(&self) -> f32;
    /// Top edge of the element with `id`, relative to the viewport.
    fn element_top(&self, id: &str) -> Option<f32>;
    /// Current vertical scroll position of the document.
    fn page_offset(&self) -> f32;
    fn scroll_to(&self, offset: f32);
    fn reveal(&self, id: &str, transition: &MotionTransition);
}

pub type InputHandler = Box<dyn Fn(FieldKey, &str)>;
pub type ActionHandler = Box<dyn Fn()>;
pub type AnchorHandler = Box<dyn Fn(&str)>;
pub type ViewportHandler = Box<dyn Fn(Rect, &[(String, Rect)])>;

/// Registry of UI callbacks. Implementations invoke the handlers when the
/// corresponding event fires.
pub trait UiEventSource {
    fn on_input(&mut self, handler: InputHandler);
    fn on_submit(&mut self, handler: ActionHandler);
    fn on_clear(&mut self, handler: ActionHandler);
    /// `handler` receives the raw `href` of the clicked in-page link.
    fn on_anchor_click(&mut self, handler: AnchorHandler);
    fn on_call_master(&mut self, handler: ActionHandler);
    /// `handler` receives the viewport and the bounds of observed elements.
    fn on_viewport_change(&mut self, handler: ViewportHandler);
}
