use std::collections::BTreeSet;

use crate::motion::MotionLevel;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Grows (positive) or shrinks (negative) each edge by its margin.
    pub fn expand(&self, margin: Margin) -> Rect {
        Rect {
            x: self.x - margin.left,
            y: self.y - margin.top,
            width: self.width + margin.left + margin.right,
            height: self.height + margin.top + margin.bottom,
        }
    }

    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        (right >= x && bottom >= y).then(|| Rect::new(x, y, right - x, bottom - y))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Margin {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObserverOptions {
    pub threshold: f32,
    pub root_margin: Margin,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            root_margin: Margin {
                bottom: -50.0,
                ..Margin::default()
            },
        }
    }
}

/// Share of `target` visible inside `root`, in `0.0..=1.0`.
///
/// A zero-area target counts as fully visible when it touches the root.
pub fn intersection_ratio(target: &Rect, root: &Rect) -> f32 {
    let Some(overlap) = target.intersection(root) else {
        return 0.0;
    };
    let area = target.area();
    if area <= 0.0 {
        return 1.0;
    }
    (overlap.area() / area).clamp(0.0, 1.0)
}

/// One-shot scroll reveal of page elements.
#[derive(Clone, Debug)]
pub struct RevealObserver {
    options: ObserverOptions,
    motion: MotionLevel,
    observed: Vec<String>,
    revealed: BTreeSet<String>,
}

impl RevealObserver {
    pub fn new(options: ObserverOptions, motion: MotionLevel) -> Self {
        Self {
            options,
            motion,
            observed: Vec::new(),
            revealed: BTreeSet::new(),
        }
    }

    pub fn observe(&mut self, id: impl Into<String>) {
        let id = id.into();
        if !self.observed.contains(&id) {
            self.observed.push(id);
        }
    }

    pub fn is_revealed(&self, id: &str) -> bool {
        self.revealed.contains(id)
    }

    pub fn pending(&self) -> usize {
        self.observed.len() - self.revealed.len()
    }

    /// Returns the observed elements revealed by this viewport change, in
    /// observation order. Each element is returned at most once over the
    /// observer's lifetime.
    pub fn update(&mut self, viewport: Rect, bounds: &[(String, Rect)]) -> Vec<String> {
        let root = viewport.expand(self.options.root_margin);
        let mut newly = Vec::new();
        for id in &self.observed {
            if self.revealed.contains(id) {
                continue;
            }
            let visible = match self.motion {
                MotionLevel::Reduced => true,
                MotionLevel::Full => bounds
                    .iter()
                    .find(|(candidate, _)| candidate == id)
                    .is_some_and(|(_, rect)| {
                        let ratio = intersection_ratio(rect, &root);
                        ratio > 0.0 && ratio >= self.options.threshold
                    }),
            };
            if visible {
                newly.push(id.clone());
            }
        }
        self.revealed.extend(newly.iter().cloned());
        newly
    }
}
