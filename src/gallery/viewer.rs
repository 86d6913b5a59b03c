//! Full-screen viewer over the whole snapshot.
//!
//! Navigation indexes into the full collection, not the page window, so
//! moving past the last item of a page simply shows the first item of the
//! next one. The grid's `current_page` is never touched from here.

use super::permalink::{Permalink, PermalinkClassifier};
use crate::models::{object::ObjectRecord, snapshot::BucketSnapshot};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

impl Direction {
    /// Map a click at horizontal offset `x` on a surface `width` wide.
    ///
    /// Left of the midpoint is `Prev`, the midpoint and right of it `Next`.
    /// A zero-width surface has no zones.
    pub fn from_click(x: u32, width: u32) -> Option<Self> {
        if width == 0 {
            return None;
        }
        if u64::from(x) * 2 < u64::from(width) {
            Some(Direction::Prev)
        } else {
            Some(Direction::Next)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewerAction {
    Advance(Direction),
    Click { x: u32, width: u32 },
    Close,
}

/// The open overlay: which record is on screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewerOverlay {
    selected_key: String,
}

impl ViewerOverlay {
    /// Open on `key`, provided it exists in `snapshot`.
    pub fn open(snapshot: &BucketSnapshot, key: &str) -> Option<Self> {
        snapshot.contains_key(key).then(|| Self {
            selected_key: key.to_string(),
        })
    }

    pub fn selected_key(&self) -> &str {
        &self.selected_key
    }

    pub fn position(&self, snapshot: &BucketSnapshot) -> Option<usize> {
        snapshot.position_of(&self.selected_key)
    }

    pub fn record<'a>(&self, snapshot: &'a BucketSnapshot) -> Option<&'a ObjectRecord> {
        self.position(snapshot).and_then(|i| snapshot.get(i))
    }

    /// Move one record in `direction`, clamped to the snapshot bounds.
    pub fn advance(self, snapshot: &BucketSnapshot, direction: Direction) -> Self {
        let Some(index) = self.position(snapshot) else {
            return self;
        };
        let target = match direction {
            Direction::Prev => index.saturating_sub(1),
            Direction::Next => (index + 1).min(snapshot.len().saturating_sub(1)),
        };
        match snapshot.get(target) {
            Some(record) if target != index => Self {
                selected_key: record.key.clone(),
            },
            _ => self,
        }
    }

    /// Apply one viewer action. `None` means the overlay closed.
    pub fn update(self, snapshot: &BucketSnapshot, action: ViewerAction) -> Option<Self> {
        match action {
            ViewerAction::Advance(direction) => Some(self.advance(snapshot, direction)),
            ViewerAction::Click { x, width } => match Direction::from_click(x, width) {
                Some(direction) => Some(self.advance(snapshot, direction)),
                None => Some(self),
            },
            ViewerAction::Close => None,
        }
    }

    /// External link for the selected record, if the classifier recognises
    /// its key.
    pub fn permalink(&self, classifier: &dyn PermalinkClassifier) -> Option<Permalink> {
        classifier.classify(&self.selected_key)
    }
}
