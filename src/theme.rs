// 🌗 Theme preference - light / dark, remembered between sessions

use crate::storage::{read_or_none, write_or_warn, KeyValueStore, THEME_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Anything other than "dark" reads as light
    pub fn parse(value: &str) -> Self {
        if value.trim() == "dark" {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Button text names the mode the button switches to
    pub fn button_label(&self) -> &'static str {
        match self {
            Theme::Light => "深色模式",
            Theme::Dark => "淺色模式",
        }
    }

    /// Stored preference, light when absent or unreadable
    pub fn load(store: &dyn KeyValueStore) -> Self {
        read_or_none(store, THEME_KEY)
            .map(|v| Theme::parse(&v))
            .unwrap_or_default()
    }

    pub fn save(&self, store: &dyn KeyValueStore) {
        write_or_warn(store, THEME_KEY, self.as_str());
    }

    /// Flip, persist, and return the new theme
    pub fn toggle(store: &dyn KeyValueStore) -> Self {
        let next = Theme::load(store).toggled();
        next.save(store);
        tracing::debug!(theme = next.as_str(), "theme toggled");
        next
    }
}
