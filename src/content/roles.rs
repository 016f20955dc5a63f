//! Role-play packs: scenarios → dialogues → turns / takeaways.
//!
//! Audio paths are explicit in the pack and resolved against a base directory.

use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use super::{non_blank, ContentItem, ContentSource};
use crate::errors::ContentError;

#[derive(Debug, Deserialize)]
struct RolePack {
    #[serde(default)]
    scenarios: Vec<Scenario>,
}

#[derive(Debug, Deserialize)]
struct Scenario {
    #[serde(default)]
    id: String,
    #[serde(default)]
    dialogues: Vec<Dialogue>,
}

#[derive(Debug, Deserialize)]
struct Dialogue {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    turns: Vec<Value>,
    #[serde(default)]
    takeaways: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Turn {
    #[serde(default)]
    lt_text: Option<String>,
    #[serde(default)]
    audio_normal_path: Option<String>,
    #[serde(default)]
    audio_slow_path: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Takeaway {
    #[serde(default)]
    lt: Option<String>,
    #[serde(default)]
    audio_normal_path: Option<String>,
    #[serde(default)]
    audio_slow_path: Option<String>,
}

/// Load a role pack, one source per scenario.
///
/// The pack file is the content root: if it is missing or unreadable the run cannot start.
pub fn load_role_pack(
    pack_path: &Path,
    base_dir: &Path,
    scenario_filter: Option<&str>,
) -> Result<Vec<ContentSource>, ContentError> {
    if !pack_path.is_file() {
        return Err(ContentError::MissingRoot(pack_path.to_path_buf()));
    }

    let raw = fs::read_to_string(pack_path).map_err(|source| ContentError::Read {
        path: pack_path.to_path_buf(),
        source,
    })?;
    let pack: RolePack = serde_json::from_str(&raw).map_err(|source| ContentError::Parse {
        path: pack_path.to_path_buf(),
        source,
    })?;

    let mut sources = Vec::new();
    for (index, scenario) in pack.scenarios.into_iter().enumerate() {
        let scenario_id = if scenario.id.trim().is_empty() {
            format!("scenario_{}", index + 1)
        } else {
            scenario.id.clone()
        };
        if scenario_filter.is_some_and(|wanted| wanted != scenario_id) {
            continue;
        }
        let items = scenario_items(&scenario_id, scenario.dialogues, base_dir);
        debug!("Loaded {} item(s) from scenario {}", items.len(), scenario_id);
        sources.push(ContentSource { id: scenario_id, items });
    }

    if let Some(wanted) = scenario_filter {
        if sources.is_empty() {
            warn!("Scenario '{}' not found in {:?}", wanted, pack_path);
        }
    }

    Ok(sources)
}

fn scenario_items(scenario_id: &str, dialogues: Vec<Dialogue>, base_dir: &Path) -> Vec<ContentItem> {
    let mut items = Vec::new();

    for (d_index, dialogue) in dialogues.into_iter().enumerate() {
        let dialogue_id = non_blank(dialogue.id).unwrap_or_else(|| format!("dialogue_{}", d_index + 1));

        for (i, value) in dialogue.turns.into_iter().enumerate() {
            let id = format!("{}/{}/turn_{}", scenario_id, dialogue_id, i + 1);
            let parsed = serde_json::from_value::<Turn>(value)
                .map(|t| (t.lt_text, t.audio_normal_path, t.audio_slow_path));
            if let Some(item) = build_item(id, parsed, base_dir, "ltText") {
                items.push(item);
            }
        }

        for (i, value) in dialogue.takeaways.into_iter().enumerate() {
            let id = format!("{}/{}/takeaway_{}", scenario_id, dialogue_id, i + 1);
            let parsed = serde_json::from_value::<Takeaway>(value)
                .map(|t| (t.lt, t.audio_normal_path, t.audio_slow_path));
            if let Some(item) = build_item(id, parsed, base_dir, "lt") {
                items.push(item);
            }
        }
    }

    items
}

type RawFields = (Option<String>, Option<String>, Option<String>);

// Turns and takeaways only differ in the text field name.
fn build_item(
    id: String,
    parsed: Result<RawFields, serde_json::Error>,
    base_dir: &Path,
    text_field: &str,
) -> Option<ContentItem> {
    let (text, normal, slow) = match parsed {
        Ok(fields) => fields,
        Err(e) => {
            warn!("Skipping {}: malformed entry ({})", id, e);
            return None;
        }
    };

    let (Some(text), Some(normal)) = (non_blank(text), non_blank(normal)) else {
        warn!("Skipping {}: missing {} or audioNormalPath", id, text_field);
        return None;
    };

    Some(ContentItem {
        id,
        text,
        normal_path: resolve(base_dir, &normal),
        slow_path: non_blank(slow).map(|p| resolve(base_dir, &p)),
    })
}

fn resolve(base_dir: &Path, path: &str) -> PathBuf {
    base_dir.join(path)
}
