//! Gallery browsing state machine.
//!
//! The whole session is one `GalleryState` value. Every user action goes
//! through [`GalleryState::update`], which returns the next state plus the
//! side effects the host must perform (rewrite the location, scroll to top).
//! Nothing in here touches the network or the terminal.

use super::{
    api::ListingError,
    location::Bookmark,
    viewer::{ViewerAction, ViewerOverlay},
};
use crate::models::{object::ObjectRecord, snapshot::BucketSnapshot};
use std::{fmt, ops::Range, str::FromStr};
use tracing::{debug, warn};

/// Allowed grid sizes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PageSize {
    #[default]
    Sixteen,
    ThirtyTwo,
    SixtyFour,
    OneTwentyEight,
}

impl PageSize {
    pub const ALL: [PageSize; 4] = [
        PageSize::Sixteen,
        PageSize::ThirtyTwo,
        PageSize::SixtyFour,
        PageSize::OneTwentyEight,
    ];

    pub fn get(self) -> usize {
        match self {
            PageSize::Sixteen => 16,
            PageSize::ThirtyTwo => 32,
            PageSize::SixtyFour => 64,
            PageSize::OneTwentyEight => 128,
        }
    }
}

impl FromStr for PageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: usize = s
            .trim()
            .parse()
            .map_err(|_| format!("`{}` is not a number", s))?;
        PageSize::ALL
            .into_iter()
            .find(|size| size.get() == n)
            .ok_or_else(|| format!("items per page must be one of 16, 32, 64, 128 (got {})", n))
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadPhase {
    Loading,
    Ready,
    /// Terminal. Carries the message shown until the user reloads.
    Failed(String),
}

/// User-controlled part of the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GalleryViewState {
    pub current_page: u32,
    pub items_per_page: PageSize,
    pub overlay: Option<ViewerOverlay>,
}

impl GalleryViewState {
    pub fn selected_key(&self) -> Option<&str> {
        self.overlay.as_ref().map(ViewerOverlay::selected_key)
    }
}

#[derive(Debug)]
pub enum Action {
    Loaded(Result<Vec<ObjectRecord>, ListingError>),
    SetItemsPerPage(PageSize),
    NextPage,
    PrevPage,
    Select(String),
    Viewer(ViewerAction),
}

/// Work the host performs after a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Rewrite the location's page parameter.
    SyncLocation { page: u32 },
    ScrollToTop,
}

/// Which pagination controls are shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageControls {
    pub prev_visible: bool,
    pub next_visible: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GalleryState {
    pub phase: LoadPhase,
    pub snapshot: BucketSnapshot,
    pub view: GalleryViewState,
}

impl GalleryState {
    /// Fresh controller in `Loading`, page restored from `location`.
    pub fn mount(location: &Bookmark, items_per_page: PageSize) -> Self {
        Self {
            phase: LoadPhase::Loading,
            snapshot: BucketSnapshot::empty(),
            view: GalleryViewState {
                current_page: location.page(),
                items_per_page,
                overlay: None,
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        self.phase == LoadPhase::Ready
    }

    /// Apply one action.
    pub fn update(mut self, action: Action) -> (Self, Vec<Effect>) {
        if let Action::Loaded(outcome) = action {
            if self.phase == LoadPhase::Loading {
                self.apply_loaded(outcome);
            } else {
                debug!("ignoring listing result outside of loading");
            }
            return (self, Vec::new());
        }
        if !self.is_ready() {
            return (self, Vec::new());
        }

        let mut effects = Vec::new();
        match action {
            Action::Loaded(_) => {}
            Action::SetItemsPerPage(size) => self.view.items_per_page = size,
            Action::NextPage => {
                if self.has_next_page() {
                    self.view.current_page = self.view.current_page.saturating_add(1);
                    effects = page_changed(self.view.current_page);
                }
            }
            Action::PrevPage => {
                if self.view.current_page > 1 {
                    self.view.current_page -= 1;
                    effects = page_changed(self.view.current_page);
                }
            }
            Action::Select(key) => {
                if let Some(overlay) = ViewerOverlay::open(&self.snapshot, &key) {
                    self.view.overlay = Some(overlay);
                }
            }
            Action::Viewer(viewer_action) => {
                if let Some(overlay) = self.view.overlay.take() {
                    self.view.overlay = overlay.update(&self.snapshot, viewer_action);
                }
            }
        }
        (self, effects)
    }

    fn apply_loaded(&mut self, outcome: Result<Vec<ObjectRecord>, ListingError>) {
        match outcome {
            Ok(records) => {
                self.snapshot = BucketSnapshot::from_enumeration(records);
                self.phase = LoadPhase::Ready;
            }
            Err(ListingError::UnexpectedShape(detail)) => {
                warn!("unexpected listing format, showing an empty gallery: {}", detail);
                self.snapshot = BucketSnapshot::empty();
                self.phase = LoadPhase::Ready;
            }
            Err(err) => self.phase = LoadPhase::Failed(err.to_string()),
        }
    }

    /// Index range of the current window, before clamping to the snapshot.
    pub fn window_range(&self) -> Range<usize> {
        let per_page = self.view.items_per_page.get();
        let page = self.view.current_page.max(1) as usize;
        let start = (page - 1).saturating_mul(per_page);
        start..start.saturating_add(per_page)
    }

    /// Records on the current page. Empty when the page lies past the end.
    pub fn window(&self) -> &[ObjectRecord] {
        self.snapshot.slice(self.window_range())
    }

    pub fn has_next_page(&self) -> bool {
        self.window_range().end < self.snapshot.len()
    }

    pub fn page_controls(&self) -> PageControls {
        PageControls {
            prev_visible: self.view.current_page > 1,
            next_visible: self.has_next_page(),
        }
    }

    /// Pages needed to show every record (at least 1).
    pub fn page_count(&self) -> usize {
        self.snapshot
            .len()
            .div_ceil(self.view.items_per_page.get())
            .max(1)
    }

    pub fn overlay_record(&self) -> Option<&ObjectRecord> {
        self.view
            .overlay
            .as_ref()
            .and_then(|overlay| overlay.record(&self.snapshot))
    }
}

fn page_changed(page: u32) -> Vec<Effect> {
    vec![Effect::SyncLocation { page }, Effect::ScrollToTop]
}
