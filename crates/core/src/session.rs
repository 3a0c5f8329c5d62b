//! Per-session editing state.
//!
//! A [`DeckSession`] owns one user's slide list, deck info and theme settings,
//! plus any saved project snapshots. Hosting surfaces create one session per
//! user and pass it explicitly to every operation; sessions never share a
//! slide list. Uploaded blobs live inside the session and are released with it.

use crate::error::{Error, Result};
use crate::preview::{preview_slides, SlidePreview};
use crate::store::SlideListStore;
use crate::suggest::suggest;
use crate::theme::{TemplateChoice, ThemeSettings};
use crate::types::{DeckInfo, NewSlide, SlideId};
use std::collections::BTreeMap;

/// A saved copy of a session's deck, kept in memory only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSnapshot {
    pub info: DeckInfo,
    pub store: SlideListStore,
    pub theme: ThemeSettings,
}

/// Editing state for one user session.
#[derive(Debug, Clone, Default)]
pub struct DeckSession {
    info: DeckInfo,
    store: SlideListStore,
    theme: ThemeSettings,
    projects: BTreeMap<String, ProjectSnapshot>,
}

impl DeckSession {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deck title and subtitle.
    pub fn info(&self) -> &DeckInfo {
        &self.info
    }

    /// Replace deck title and subtitle.
    pub fn set_info(&mut self, info: DeckInfo) {
        self.info = info;
    }

    /// The slide list.
    pub fn store(&self) -> &SlideListStore {
        &self.store
    }

    /// Mutable access to the slide list.
    pub fn store_mut(&mut self) -> &mut SlideListStore {
        &mut self.store
    }

    /// Theme settings.
    pub fn theme(&self) -> &ThemeSettings {
        &self.theme
    }

    /// Mutable access to theme settings.
    pub fn theme_mut(&mut self) -> &mut ThemeSettings {
        &mut self.theme
    }

    /// Append a slide from the creation form. Empty titles are dropped.
    pub fn add_slide(&mut self, slide: NewSlide) -> Option<SlideId> {
        self.store.append(slide)
    }

    /// Move the slide at `index` one position earlier.
    pub fn move_up(&mut self, index: usize) {
        self.store.move_up(index);
    }

    /// Move the slide at `index` one position later.
    pub fn move_down(&mut self, index: usize) {
        self.store.move_down(index);
    }

    /// Delete the slide at `index`.
    pub fn remove_at(&mut self, index: usize) {
        self.store.remove_at(index);
    }

    /// Up-to-date ordered view for the editor.
    pub fn preview(&self) -> Vec<SlidePreview> {
        preview_slides(self.store.slides())
    }

    /// Advisory template suggestion for the current slides.
    pub fn suggest_theme(&self) -> TemplateChoice {
        suggest(self.store.slides())
    }

    /// Save a snapshot of the current deck under `name`, replacing any
    /// existing snapshot with that name.
    pub fn save_project(&mut self, name: impl Into<String>) {
        let name = name.into();
        log::debug!("Saving project '{}' with {} slides", name, self.store.len());
        self.projects.insert(
            name,
            ProjectSnapshot {
                info: self.info.clone(),
                store: self.store.clone(),
                theme: self.theme.clone(),
            },
        );
    }

    /// Restore the snapshot saved under `name`.
    pub fn load_project(&mut self, name: &str) -> Result<()> {
        let snapshot = self
            .projects
            .get(name)
            .ok_or_else(|| Error::ProjectNotFound(name.to_string()))?
            .clone();

        self.info = snapshot.info;
        self.store = snapshot.store;
        self.theme = snapshot.theme;
        Ok(())
    }

    /// Names of saved projects, sorted.
    pub fn project_names(&self) -> Vec<&str> {
        self.projects.keys().map(String::as_str).collect()
    }
}
