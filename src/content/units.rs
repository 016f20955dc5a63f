//! Vocabulary units: `{content_root}/{level}/unit_*/unit.json`.

use log::{debug, warn};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use super::{non_blank, ContentItem, ContentSource, Variant};
use crate::app_config::ContentConfig;
use crate::errors::ContentError;
use crate::file_utils::FileManager;

#[derive(Debug, Deserialize)]
struct UnitManifest {
    #[serde(default)]
    items: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct PhraseItem {
    #[serde(default)]
    lt: Option<String>,
    #[serde(default, rename = "audioId")]
    audio_id: Option<String>,
}

/// Output path for one variant of a phrase: `{audio_dir}/{audio_id}_{variant}.ogg`
pub fn audio_path(audio_dir: &Path, audio_id: &str, variant: Variant) -> PathBuf {
    audio_dir.join(format!("{}_{}.ogg", audio_id, variant.suffix()))
}

/// Unit directories that carry a manifest, in name order.
///
/// A missing units root is fatal. A unit without a manifest is reported and left out.
pub fn find_unit_dirs(
    config: &ContentConfig,
    unit_filter: Option<&str>,
) -> Result<Vec<PathBuf>, ContentError> {
    let units_root = config.units_root();
    if !FileManager::dir_exists(&units_root) {
        return Err(ContentError::MissingRoot(units_root));
    }

    let candidates = FileManager::list_subdirs(&units_root, &config.unit_prefix).map_err(|e| {
        ContentError::Scan {
            path: units_root.clone(),
            message: format!("{:#}", e),
        }
    })?;

    let mut units = Vec::new();
    for dir in candidates {
        let name = FileManager::display_name(&dir);
        if unit_filter.is_some_and(|wanted| wanted != name) {
            continue;
        }
        if FileManager::file_exists(dir.join(&config.manifest_name)) {
            units.push(dir);
        } else {
            warn!("{} missing {}", name, config.manifest_name);
        }
    }

    if let Some(wanted) = unit_filter {
        if units.is_empty() {
            warn!("Unit '{}' not found under {:?}", wanted, units_root);
        }
    }

    Ok(units)
}

/// Load one unit's phrases.
///
/// Phrases without text or audio id are reported and left out.
pub fn load_unit(unit_dir: &Path, config: &ContentConfig) -> Result<ContentSource, ContentError> {
    let unit_id = FileManager::display_name(unit_dir);
    let manifest_path = unit_dir.join(&config.manifest_name);
    if !manifest_path.is_file() {
        return Err(ContentError::MissingManifest(manifest_path));
    }

    let raw = fs::read_to_string(&manifest_path).map_err(|source| ContentError::Read {
        path: manifest_path.clone(),
        source,
    })?;
    let manifest: UnitManifest = serde_json::from_str(&raw).map_err(|source| ContentError::Parse {
        path: manifest_path.clone(),
        source,
    })?;

    let audio_dir = unit_dir.join(&config.audio_dir_name);
    let mut items = Vec::new();

    for (phrase_id, value) in manifest.items.unwrap_or_default() {
        let phrase = match serde_json::from_value::<PhraseItem>(value) {
            Ok(phrase) => phrase,
            Err(e) => {
                warn!("Skipping {}: malformed item ({})", phrase_id, e);
                continue;
            }
        };

        let (Some(text), Some(audio_id)) = (non_blank(phrase.lt), non_blank(phrase.audio_id)) else {
            warn!("Skipping {}: missing lt or audioId", phrase_id);
            continue;
        };

        items.push(ContentItem {
            normal_path: audio_path(&audio_dir, &audio_id, Variant::Normal),
            slow_path: Some(audio_path(&audio_dir, &audio_id, Variant::Slow)),
            id: phrase_id,
            text,
        });
    }

    debug!("Loaded {} item(s) from {}", items.len(), unit_id);

    Ok(ContentSource { id: unit_id, items })
}

/// Discover and load every unit, honoring the optional filter.
///
/// Only a missing units root fails; a unit that cannot be read is reported and skipped.
pub fn load_units(
    config: &ContentConfig,
    unit_filter: Option<&str>,
) -> Result<Vec<ContentSource>, ContentError> {
    let mut sources = Vec::new();
    for unit_dir in find_unit_dirs(config, unit_filter)? {
        match load_unit(&unit_dir, config) {
            Ok(source) => sources.push(source),
            Err(e) => warn!("Skipping {}: {}", FileManager::display_name(&unit_dir), e),
        }
    }
    Ok(sources)
}
