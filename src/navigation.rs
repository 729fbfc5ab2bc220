use std::sync::Arc;

use crate::contracts::PageSurface;

pub const CONTACT_SECTION: &str = "contact";

/// Extracts the target id of an in-page link (`#contact` → `contact`).
pub fn anchor_target(href: &str) -> Option<&str> {
    href.strip_prefix('#').filter(|target| !target.is_empty())
}

/// Scrolls to page sections so they land just below the fixed header.
#[derive(Clone)]
pub struct ScrollNavigator {
    page: Arc<dyn PageSurface>,
}

impl ScrollNavigator {
    pub fn new(page: Arc<dyn PageSurface>) -> Self {
        Self { page }
    }

    pub fn offset_for(&self, target: &str) -> Option<f32> {
        let top = self.page.element_top(target)?;
        Some((top + self.page.page_offset() - self.page.header_height()).max(0.0))
    }

    /// Returns `false` when the page has no element with that id.
    pub fn scroll_to_section(&self, target: &str) -> bool {
        let Some(offset) = self.offset_for(target) else {
            tracing::debug!(target_id = target, "scroll target not found");
            return false;
        };
        self.page.scroll_to(offset);
        true
    }

    pub fn follow_anchor(&self, href: &str) -> bool {
        anchor_target(href).is_some_and(|target| self.scroll_to_section(target))
    }
}
