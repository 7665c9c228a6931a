use std::time::{Duration, Instant};

use crate::models::Profile;

/// How long a popup survives after the pointer leaves its row or itself.
pub const HOVER_CLOSE_DELAY: Duration = Duration::from_millis(300);

pub trait HasId {
    fn id(&self) -> &str;
}

impl HasId for Profile {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Tracks which row a detached preview popup belongs to.
///
/// Entering a row shows its popup at once. Leaving the row or the popup
/// schedules a clear after [`HOVER_CLOSE_DELAY`]; entering either again
/// before then cancels it, so the pointer can travel from the row to the
/// popup.
#[derive(Debug, Clone)]
pub struct HoverPopup {
    active: Option<String>,
    clear_at: Option<Instant>,
    delay: Duration,
}

impl Default for HoverPopup {
    fn default() -> Self {
        Self::with_delay(HOVER_CLOSE_DELAY)
    }
}

impl HoverPopup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            active: None,
            clear_at: None,
            delay,
        }
    }

    pub fn enter_item(&mut self, id: &str) {
        self.enter_item_at(id, Instant::now());
    }

    pub fn leave_item(&mut self) {
        self.schedule_clear(Instant::now());
    }

    pub fn enter_popup(&mut self) {
        self.enter_popup_at(Instant::now());
    }

    pub fn leave_popup(&mut self) {
        self.schedule_clear(Instant::now());
    }

    pub fn active(&self) -> Option<&str> {
        self.active_at(Instant::now())
    }

    pub fn hovered<'a, T: HasId>(&self, items: &'a [T]) -> Option<&'a T> {
        let id = self.active()?;
        items.iter().find(|item| item.id() == id)
    }

    pub fn enter_item_at(&mut self, id: &str, now: Instant) {
        self.settle(now);
        self.clear_at = None;
        self.active = Some(id.to_string());
    }

    pub fn leave_item_at(&mut self, now: Instant) {
        self.schedule_clear(now);
    }

    pub fn enter_popup_at(&mut self, now: Instant) {
        self.settle(now);
        self.clear_at = None;
    }

    pub fn leave_popup_at(&mut self, now: Instant) {
        self.schedule_clear(now);
    }

    pub fn active_at(&self, now: Instant) -> Option<&str> {
        match self.clear_at {
            Some(deadline) if now >= deadline => None,
            _ => self.active.as_deref(),
        }
    }

    fn schedule_clear(&mut self, now: Instant) {
        self.settle(now);
        if self.active.is_some() {
            self.clear_at = Some(now + self.delay);
        }
    }

    /// Applies a clear whose deadline has passed.
    fn settle(&mut self, now: Instant) {
        if self.clear_at.is_some_and(|deadline| now >= deadline) {
            self.active = None;
            self.clear_at = None;
        }
    }
}
