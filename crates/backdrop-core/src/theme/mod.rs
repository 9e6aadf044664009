//! Theme registry: fixed pairs of {generator variant, style definition}.

pub mod orchestrator;

use crate::field::{AmbientField, FieldGenerator, StarfieldNebula};

/// Maximum number of registered themes.
pub const MAX_THEMES: usize = 4;

/// Particle field generator variant a theme animates with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeneratorKind {
    Ambient,
    StarfieldNebula,
}

impl GeneratorKind {
    /// Fresh generator with the variant's default settings.
    pub fn build(self) -> Box<dyn FieldGenerator> {
        match self {
            GeneratorKind::Ambient => Box::new(AmbientField::white()),
            GeneratorKind::StarfieldNebula => Box::new(StarfieldNebula::dark()),
        }
    }
}

/// One registry entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThemeEntry {
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Style definition the loader resolves for this theme.
    pub stylesheet: &'static str,
    pub generator: GeneratorKind,
}

/// Light theme: ambient particle cloud.
pub const WHITE_THEME: ThemeEntry = ThemeEntry {
    id: "white",
    name: "WhiteTheme",
    stylesheet: "chatBoxA.css",
    generator: GeneratorKind::Ambient,
};

/// Dark theme: starfield over nebula.
pub const DARK_THEME: ThemeEntry = ThemeEntry {
    id: "dark",
    name: "DarkTheme",
    stylesheet: "chatBoxB.css",
    generator: GeneratorKind::StarfieldNebula,
};

/// Immutable theme table. Built once; themes are swapped, never edited.
#[derive(Clone, Debug)]
pub struct ThemeRegistry {
    entries: heapless::Vec<ThemeEntry, MAX_THEMES>,
    default: usize,
}

impl Default for ThemeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ThemeRegistry {
    /// `white` and `dark`, starting on `dark`.
    pub fn builtin() -> Self {
        Self {
            entries: heapless::Vec::from_array([WHITE_THEME, DARK_THEME]),
            default: 1,
        }
    }

    /// Build a registry from `entries`, starting on `default_id`.
    ///
    /// Returns `None` if there are more than [`MAX_THEMES`] entries, an id is
    /// repeated, or `default_id` is not among them.
    pub fn from_entries(entries: &[ThemeEntry], default_id: &str) -> Option<Self> {
        let mut table: heapless::Vec<ThemeEntry, MAX_THEMES> = heapless::Vec::new();
        for entry in entries {
            if table.iter().any(|e| e.id == entry.id) {
                return None;
            }
            table.push(*entry).ok()?;
        }
        let default = table.iter().position(|e| e.id == default_id)?;
        Some(Self {
            entries: table,
            default,
        })
    }

    pub fn get(&self, id: &str) -> Option<&ThemeEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Entry by position, as used by `InputEvent::SelectTheme`.
    pub fn by_index(&self, index: u8) -> Option<&ThemeEntry> {
        self.entries.get(index as usize)
    }

    pub fn default_theme(&self) -> &ThemeEntry {
        &self.entries[self.default]
    }

    /// The entry after `id`, wrapping. With two themes this is "the other one".
    pub fn next_after(&self, id: &str) -> &ThemeEntry {
        let next = match self.entries.iter().position(|e| e.id == id) {
            Some(i) => (i + 1) % self.entries.len(),
            None => self.default,
        };
        &self.entries[next]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ThemeEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves a theme's style definition to the rule block applied to the chat UI.
///
/// The rules are opaque here: swapped, never parsed.
pub trait StyleLoader {
    fn load(&self, theme: &ThemeEntry) -> Option<String>;
}

/// Links the theme's stylesheet by name.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinStyles;

impl StyleLoader for BuiltinStyles {
    fn load(&self, theme: &ThemeEntry) -> Option<String> {
        Some(format!("@import url(\"{}\");", theme.stylesheet))
    }
}
