/*!
 * Tests for unit and role-pack content loading
 */

use anyhow::Result;
use serde_json::json;
use std::fs;
use std::path::PathBuf;

use lietucoach_tts::content::roles::load_role_pack;
use lietucoach_tts::content::units::{audio_path, find_unit_dirs, load_unit, load_units};
use lietucoach_tts::content::{items_without_slow, total_targets, Variant};
use lietucoach_tts::errors::ContentError;
use crate::common;

#[test]
fn test_audio_path_withAudioId_shouldDeriveVariantFileNames() {
    let audio_dir = PathBuf::from("content/a1/unit_01/audio");

    assert_eq!(
        audio_path(&audio_dir, "greet_01", Variant::Normal),
        audio_dir.join("greet_01_normal.ogg")
    );
    assert_eq!(
        audio_path(&audio_dir, "greet_01", Variant::Slow),
        audio_dir.join("greet_01_slow.ogg")
    );
}

#[test]
fn test_load_unit_withGreetings_shouldKeepManifestOrderAndDerivePaths() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());
    let unit_dir = common::write_greetings_unit(temp_dir.path())?;

    let source = load_unit(&unit_dir, &config.content)?;

    assert_eq!(source.id, "unit_01");
    assert_eq!(source.items.len(), 2);
    assert_eq!(source.items[0].id, "hello");
    assert_eq!(source.items[0].text, "Labas");
    assert_eq!(source.items[0].normal_path, unit_dir.join("audio").join("greet_01_normal.ogg"));
    assert_eq!(
        source.items[0].slow_path,
        Some(unit_dir.join("audio").join("greet_01_slow.ogg"))
    );
    assert_eq!(source.items[1].id, "thanks");
    assert_eq!(source.items[1].text, "Ačiū");
    Ok(())
}

#[test]
fn test_load_unit_withNonAlphabeticalKeys_shouldPreserveFileOrder() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());
    let unit_dir = common::write_unit(
        temp_dir.path(),
        "unit_02",
        json!({
            "zebra": { "lt": "Zebras", "audioId": "z_01" },
            "apple": { "lt": "Obuolys", "audioId": "a_01" }
        }),
    )?;

    let source = load_unit(&unit_dir, &config.content)?;
    let ids: Vec<&str> = source.items.iter().map(|i| i.id.as_str()).collect();

    assert_eq!(ids, vec!["zebra", "apple"]);
    Ok(())
}

#[test]
fn test_load_unit_withIncompleteItems_shouldSkipThem() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());
    let unit_dir = common::write_unit(
        temp_dir.path(),
        "unit_03",
        json!({
            "no_text": { "audioId": "x_01" },
            "no_audio": { "lt": "Sveiki" },
            "blank_text": { "lt": "   ", "audioId": "x_02" },
            "not_an_object": "Labas",
            "good": { "lt": "Taip", "audioId": "yes_01" }
        }),
    )?;

    let source = load_unit(&unit_dir, &config.content)?;

    assert_eq!(source.items.len(), 1);
    assert_eq!(source.items[0].id, "good");
    Ok(())
}

#[test]
fn test_load_unit_withoutItems_shouldReturnEmptySource() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());
    let unit_dir = temp_dir.path().join("content").join("a1").join("unit_04");
    common::create_test_file(&unit_dir, "unit.json", r#"{ "id": "unit_04" }"#)?;

    let source = load_unit(&unit_dir, &config.content)?;

    assert!(source.items.is_empty());
    Ok(())
}

#[test]
fn test_load_unit_withInvalidJson_shouldReturnParseError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());
    let unit_dir = temp_dir.path().join("content").join("a1").join("unit_05");
    common::create_test_file(&unit_dir, "unit.json", "{ not json")?;

    let result = load_unit(&unit_dir, &config.content);

    assert!(matches!(result, Err(ContentError::Parse { .. })));
    Ok(())
}

#[test]
fn test_find_unit_dirs_withUnitMissingManifest_shouldExcludeIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());
    common::write_greetings_unit(temp_dir.path())?;
    fs::create_dir_all(temp_dir.path().join("content").join("a1").join("unit_02"))?;
    fs::create_dir_all(temp_dir.path().join("content").join("a1").join("drafts"))?;

    let dirs = find_unit_dirs(&config.content, None)?;

    assert_eq!(dirs.len(), 1);
    assert!(dirs[0].ends_with("unit_01"));
    Ok(())
}

#[test]
fn test_find_unit_dirs_withMissingRoot_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());

    let result = find_unit_dirs(&config.content, None);

    assert!(matches!(result, Err(ContentError::MissingRoot(_))));
    Ok(())
}

#[test]
fn test_load_units_withFilter_shouldOnlyLoadMatchingUnit() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());
    common::write_greetings_unit(temp_dir.path())?;
    common::write_unit(
        temp_dir.path(),
        "unit_02",
        json!({ "water": { "lt": "Vanduo", "audioId": "food_01" } }),
    )?;

    let all = load_units(&config.content, None)?;
    let filtered = load_units(&config.content, Some("unit_02"))?;
    let unknown = load_units(&config.content, Some("unit_99"))?;

    assert_eq!(all.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(), vec!["unit_01", "unit_02"]);
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].items[0].text, "Vanduo");
    assert!(unknown.is_empty());
    assert_eq!(total_targets(&all, false), 3);
    assert_eq!(total_targets(&all, true), 6);
    assert_eq!(items_without_slow(&all), 0);
    Ok(())
}

#[test]
fn test_load_units_withBrokenUnit_shouldSkipItAndKeepOthers() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());
    common::write_greetings_unit(temp_dir.path())?;
    let broken = temp_dir.path().join("content").join("a1").join("unit_02");
    common::create_test_file(&broken, "unit.json", "[")?;

    let sources = load_units(&config.content, None)?;

    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].id, "unit_01");
    Ok(())
}

#[test]
fn test_load_role_pack_withScenarios_shouldResolvePathsAgainstBaseDir() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let base = temp_dir.path();
    let pack = common::write_role_pack(base)?;

    let sources = load_role_pack(&pack, base, None)?;

    assert_eq!(sources.len(), 2);
    let airport = &sources[0];
    assert_eq!(airport.id, "airport");
    assert_eq!(airport.items.len(), 3);

    assert_eq!(airport.items[0].id, "airport/checkin/turn_1");
    assert_eq!(airport.items[0].text, "Laba diena");
    assert_eq!(
        airport.items[0].normal_path,
        base.join("assets/audio/roles/traveler/airport/checkin_01.mp3")
    );
    assert_eq!(airport.items[0].slow_path, None);

    assert_eq!(
        airport.items[1].slow_path,
        Some(base.join("assets/audio/roles/traveler/airport/checkin_02_slow.mp3"))
    );

    assert_eq!(airport.items[2].id, "airport/checkin/takeaway_1");
    assert_eq!(airport.items[2].text, "pasas");

    let hotel = &sources[1];
    assert_eq!(hotel.id, "hotel");
    assert_eq!(hotel.items[0].id, "hotel/dialogue_1/turn_1");

    assert_eq!(total_targets(&sources, false), 4);
    assert_eq!(total_targets(&sources, true), 5);
    assert_eq!(items_without_slow(&sources), 3);
    Ok(())
}

#[test]
fn test_load_role_pack_withScenarioFilter_shouldKeepOnlyThatScenario() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let pack = common::write_role_pack(temp_dir.path())?;

    let sources = load_role_pack(&pack, temp_dir.path(), Some("hotel"))?;
    let none = load_role_pack(&pack, temp_dir.path(), Some("museum"))?;

    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].id, "hotel");
    assert!(none.is_empty());
    Ok(())
}

#[test]
fn test_load_role_pack_withMalformedEntries_shouldSkipThem() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let pack = json!({
        "scenarios": [{
            "dialogues": [{
                "id": "market",
                "turns": [
                    { "ltText": "Kiek kainuoja?" },
                    { "ltText": 42, "audioNormalPath": "a.mp3" },
                    { "ltText": "Ačiū", "audioNormalPath": "market/thanks.mp3" }
                ],
                "takeaways": [ "kaina", { "audioNormalPath": "b.mp3" } ]
            }]
        }]
    });
    let pack_path =
        common::create_test_file(temp_dir.path(), "pack.json", &serde_json::to_string(&pack)?)?;

    let sources = load_role_pack(&pack_path, temp_dir.path(), None)?;

    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].id, "scenario_1");
    assert_eq!(sources[0].items.len(), 1);
    assert_eq!(sources[0].items[0].id, "scenario_1/market/turn_3");
    assert_eq!(sources[0].items[0].text, "Ačiū");
    Ok(())
}

#[test]
fn test_load_role_pack_withMissingPack_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let missing = temp_dir.path().join("assets").join("missing.json");

    let result = load_role_pack(&missing, temp_dir.path(), None);

    assert!(matches!(result, Err(ContentError::MissingRoot(_))));
    Ok(())
}
