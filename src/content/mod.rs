/*!
 * Content loading for audio generation.
 *
 * Two layouts are supported:
 * - `units`: one directory per vocabulary unit with a `unit.json` manifest,
 *   audio paths derived from each phrase's `audioId`
 * - `roles`: a single role-play pack with scenarios, dialogues, turns and
 *   takeaways, audio paths given explicitly in the pack
 *
 * Both produce [`ContentSource`]s of [`ContentItem`]s so the generator only
 * deals with text and target paths.
 */

use std::path::PathBuf;

pub mod roles;
pub mod units;

/// Speaking-rate rendering of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Normal,
    Slow,
}

impl Variant {
    /// File name suffix used by derived audio paths
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Slow => "slow",
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

/// A piece of text with the audio files it should be rendered to
#[derive(Debug, Clone, PartialEq)]
pub struct ContentItem {
    /// Stable identifier, used in log lines
    pub id: String,
    /// Source-language text to speak
    pub text: String,
    /// Target for the normal-rate rendering
    pub normal_path: PathBuf,
    /// Target for the slow-rate rendering, if the content defines one
    pub slow_path: Option<PathBuf>,
}

impl ContentItem {
    /// Target path for a variant, if the item has one
    pub fn path_for(&self, variant: Variant) -> Option<&PathBuf> {
        match variant {
            Variant::Normal => Some(&self.normal_path),
            Variant::Slow => self.slow_path.as_ref(),
        }
    }
}

/// A named group of items: one unit, or one scenario of a role pack
#[derive(Debug, Clone, PartialEq)]
pub struct ContentSource {
    pub id: String,
    pub items: Vec<ContentItem>,
}

impl ContentSource {
    /// Number of audio files this source may produce
    pub fn target_count(&self, include_slow: bool) -> usize {
        self.items
            .iter()
            .map(|item| 1 + usize::from(include_slow && item.slow_path.is_some()))
            .sum()
    }
}

/// Total number of audio files across sources
pub fn total_targets(sources: &[ContentSource], include_slow: bool) -> usize {
    sources.iter().map(|s| s.target_count(include_slow)).sum()
}

/// Number of items that have no slow-rate target
pub fn items_without_slow(sources: &[ContentSource]) -> usize {
    sources
        .iter()
        .flat_map(|s| &s.items)
        .filter(|item| item.slow_path.is_none())
        .count()
}

/// Treat missing and blank strings the same way
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
