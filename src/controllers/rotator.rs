// src/controllers/rotator.rs
//! Cycles the hero demo through its views until the visitor picks one.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use crate::models::{DemoState, DemoView};
use crate::services::analytics::Tracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewSelection {
    pub active: DemoView,
    pub auto_rotate: bool,
}

impl ViewSelection {
    pub fn new() -> Self {
        Self {
            active: DemoView::default(),
            auto_rotate: true,
        }
    }

    /// One timer tick. Returns false once rotation has been switched off.
    pub fn advance(&mut self) -> bool {
        if !self.auto_rotate {
            return false;
        }
        self.active = self.active.next();
        true
    }

    /// A manual pick. Rotation stays off for the rest of the mount.
    pub fn select(&mut self, view: DemoView) {
        self.active = view;
        self.auto_rotate = false;
    }
}

impl Default for ViewSelection {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ViewSelection> for DemoState {
    fn from(selection: ViewSelection) -> Self {
        DemoState {
            view: selection.active,
            auto_rotate: selection.auto_rotate,
        }
    }
}

/// A mounted demo panel. Dropping it cancels the timer.
pub struct DemoRotator {
    selection: Arc<watch::Sender<ViewSelection>>,
    timer: Option<JoinHandle<()>>,
    tracker: Tracker,
}

impl DemoRotator {
    /// Starts at the first view with rotation on. The first advance happens
    /// one full `period` after mounting.
    pub fn mount(period: Duration, tracker: Tracker) -> Self {
        let (sender, _) = watch::channel(ViewSelection::new());
        let selection = Arc::new(sender);

        let ticking = Arc::clone(&selection);
        let timer = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                if !ticking.send_if_modified(|selection| selection.advance()) {
                    break;
                }
            }
        });

        Self {
            selection,
            timer: Some(timer),
            tracker,
        }
    }

    pub fn state(&self) -> DemoState {
        (*self.selection.borrow()).into()
    }

    /// Shows `view` and stops rotation. Rotation is off before the timer is
    /// cancelled, so a tick racing this call can no longer advance.
    pub fn select(&mut self, view: DemoView) {
        self.selection.send_modify(|selection| selection.select(view));
        self.stop();
        self.tracker
            .track_button_click(&format!("Demo {}", view.label()), Some("hero"));
    }

    fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            debug!("Demo rotation stopped");
        }
    }
}

impl Drop for DemoRotator {
    fn drop(&mut self) {
        self.stop();
    }
}
