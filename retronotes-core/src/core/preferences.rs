//! UI preferences kept beside the notes in the same key-value storage.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::storage::{FAVORITES_KEY, THEME_KEY};
use crate::{KeyValueStore, Note, Result};

/// The cosmetic themes the front-end can switch between.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeVariant {
    #[default]
    Win98,
    Cyber,
    Terminal,
    Y2k,
    Hacker,
    Coffee,
    Retro,
    Minimal,
    Vaporwave,
    Forest,
    Midnight,
    Bubblegum,
    Papyrus,
    Sunshine,
    Ocean,
    Starlight,
}

impl ThemeVariant {
    pub const ALL: [ThemeVariant; 16] = [
        ThemeVariant::Win98,
        ThemeVariant::Cyber,
        ThemeVariant::Terminal,
        ThemeVariant::Y2k,
        ThemeVariant::Hacker,
        ThemeVariant::Coffee,
        ThemeVariant::Retro,
        ThemeVariant::Minimal,
        ThemeVariant::Vaporwave,
        ThemeVariant::Forest,
        ThemeVariant::Midnight,
        ThemeVariant::Bubblegum,
        ThemeVariant::Papyrus,
        ThemeVariant::Sunshine,
        ThemeVariant::Ocean,
        ThemeVariant::Starlight,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Win98 => "win98",
            Self::Cyber => "cyber",
            Self::Terminal => "terminal",
            Self::Y2k => "y2k",
            Self::Hacker => "hacker",
            Self::Coffee => "coffee",
            Self::Retro => "retro",
            Self::Minimal => "minimal",
            Self::Vaporwave => "vaporwave",
            Self::Forest => "forest",
            Self::Midnight => "midnight",
            Self::Bubblegum => "bubblegum",
            Self::Papyrus => "papyrus",
            Self::Sunshine => "sunshine",
            Self::Ocean => "ocean",
            Self::Starlight => "starlight",
        }
    }
}

impl fmt::Display for ThemeVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown theme name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown theme: {0}")]
pub struct UnknownTheme(pub String);

impl FromStr for ThemeVariant {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|theme| theme.as_str() == wanted)
            .ok_or_else(|| UnknownTheme(s.to_string()))
    }
}

/// Theme choice and favorite note ids.
///
/// The theme is stored as its plain name under `"theme"`; favorites as a JSON
/// array of ids under `"retro-notes-favorites"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preferences {
    pub theme: ThemeVariant,
    /// Favorite note ids, in the order they were starred.
    pub favorites: Vec<String>,
}

impl Preferences {
    /// Reads preferences from `storage`.
    ///
    /// Never fails: missing keys give defaults, and unreadable or corrupt
    /// values are logged and replaced with defaults.
    pub fn load(storage: &dyn KeyValueStore) -> Self {
        let theme = match storage.get(THEME_KEY) {
            Ok(Some(name)) => name.parse::<ThemeVariant>().unwrap_or_else(|e| {
                log::warn!("{e}; using default theme");
                ThemeVariant::default()
            }),
            Ok(None) => ThemeVariant::default(),
            Err(e) => {
                log::warn!("Failed to read theme: {e}");
                ThemeVariant::default()
            }
        };

        let favorites = match storage.get(FAVORITES_KEY) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                log::warn!("Failed to parse favorites: {e}");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("Failed to read favorites: {e}");
                Vec::new()
            }
        };

        Self { theme, favorites }
    }

    /// Writes both preferences to `storage`.
    ///
    /// # Errors
    ///
    /// Returns an error if either write fails.
    pub fn save(&self, storage: &mut dyn KeyValueStore) -> Result<()> {
        storage.set(THEME_KEY, self.theme.as_str())?;
        storage.set(FAVORITES_KEY, &serde_json::to_string(&self.favorites)?)?;
        Ok(())
    }

    #[must_use]
    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorites.iter().any(|favorite| favorite == id)
    }

    /// Stars or unstars `id`. Returns `true` if it is now a favorite.
    pub fn toggle_favorite(&mut self, id: &str) -> bool {
        if self.is_favorite(id) {
            self.favorites.retain(|favorite| favorite != id);
            false
        } else {
            self.favorites.push(id.to_string());
            true
        }
    }

    /// Drops favorites whose notes no longer exist, e.g. after a delete.
    ///
    /// Returns the number removed.
    pub fn prune(&mut self, notes: &[Note]) -> usize {
        let before = self.favorites.len();
        self.favorites
            .retain(|id| notes.iter().any(|note| &note.id == id));
        before - self.favorites.len()
    }

    /// Favorite notes in starred order, skipping ids with no note.
    #[must_use]
    pub fn favorite_notes<'a>(&self, notes: &'a [Note]) -> Vec<&'a Note> {
        self.favorites
            .iter()
            .filter_map(|id| notes.iter().find(|note| &note.id == id))
            .collect()
    }
}
