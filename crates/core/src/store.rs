//! Ordered, mutable list of slide records for one session.
//!
//! Index arguments come from a rendered list view and are expected to be in
//! bounds. An out-of-range index is a caller bug: debug builds panic, release
//! builds log a warning and leave the list untouched.

use crate::types::{NewSlide, SlideId, SlideRecord};

/// Ordered slide records. List order is presentation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlideListStore {
    slides: Vec<SlideRecord>,
    next_id: u64,
}

impl SlideListStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a slide at the end of the list.
    ///
    /// A slide with an empty (or whitespace-only) title is silently dropped and
    /// `None` is returned.
    pub fn append(&mut self, slide: NewSlide) -> Option<SlideId> {
        if slide.title.trim().is_empty() {
            log::debug!("Dropping slide with empty title");
            return None;
        }

        self.next_id += 1;
        let id = SlideId(self.next_id);
        self.slides.push(SlideRecord {
            id,
            title: slide.title,
            content: slide.content,
        });
        Some(id)
    }

    /// Swap the slide at `index` with the one before it. No-op at index 0.
    pub fn move_up(&mut self, index: usize) {
        if !self.check_index(index, "move_up") {
            return;
        }
        if index > 0 {
            self.slides.swap(index, index - 1);
        }
    }

    /// Swap the slide at `index` with the one after it. No-op at the last index.
    pub fn move_down(&mut self, index: usize) {
        if !self.check_index(index, "move_down") {
            return;
        }
        if index + 1 < self.slides.len() {
            self.slides.swap(index, index + 1);
        }
    }

    /// Remove the slide at `index`, shifting later slides down by one.
    pub fn remove_at(&mut self, index: usize) -> Option<SlideRecord> {
        if !self.check_index(index, "remove_at") {
            return None;
        }
        Some(self.slides.remove(index))
    }

    /// The current ordered view.
    pub fn slides(&self) -> &[SlideRecord] {
        &self.slides
    }

    /// Number of slides.
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// Whether the store holds no slides.
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Get a slide by position.
    pub fn get(&self, index: usize) -> Option<&SlideRecord> {
        self.slides.get(index)
    }

    fn check_index(&self, index: usize, operation: &str) -> bool {
        let len = self.slides.len();
        debug_assert!(
            index < len,
            "{} index {} out of bounds for {} slides",
            operation,
            index,
            len
        );
        if index >= len {
            log::warn!(
                "Ignoring {} at index {} (list has {} slides)",
                operation,
                index,
                len
            );
            return false;
        }
        true
    }
}
