/*!
 * End-to-end runs through the controller against temporary content trees
 */

use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use lietucoach_tts::app_controller::{ContentTarget, Controller};
use lietucoach_tts::errors::AppError;
use lietucoach_tts::generator::{RunOptions, RunStats};
use lietucoach_tts::tts::SpeechSynthesizer;
use crate::common;
use crate::common::mock_synthesizer::MockSynthesizer;

fn all_units() -> ContentTarget {
    ContentTarget::Units { unit: None }
}

fn default_roles() -> ContentTarget {
    ContentTarget::Roles { pack: None, scenario: None }
}

fn controller(base: &std::path::Path, options: RunOptions) -> Result<Controller> {
    Ok(Controller::with_config(common::test_config(base), options)?
        .with_base_dir(base)
        .with_application_default(None))
}

fn mock(synth: MockSynthesizer) -> Option<Arc<dyn SpeechSynthesizer>> {
    let synthesizer: Arc<dyn SpeechSynthesizer> = Arc::new(synth);
    Some(synthesizer)
}

fn audio_files(base: &std::path::Path) -> Result<Vec<PathBuf>> {
    let audio_dir = base.join("content").join("a1").join("unit_01").join("audio");
    if !audio_dir.exists() {
        return Ok(Vec::new());
    }
    let mut files: Vec<PathBuf> = fs::read_dir(audio_dir)?
        .map(|e| e.map(|e| e.path()))
        .collect::<std::io::Result<_>>()?;
    files.sort();
    Ok(files)
}

#[test]
fn test_controller_withInvalidConfig_shouldFailWithConfigExitCode() {
    let mut config = common::test_config(std::path::Path::new("."));
    config.tts.speaking_rate_slow = 0.0;

    match Controller::with_config(config, RunOptions::default()) {
        Err(e) => assert_eq!(e.exit_code(), 2),
        Ok(_) => panic!("invalid configuration was accepted"),
    }
}

#[test]
fn test_connect_withoutCredentials_shouldFailBeforeAnyWork() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::write_greetings_unit(temp_dir.path())?;
    let controller = controller(temp_dir.path(), RunOptions::default())?;

    let result = controller.connect(None);

    match result {
        Err(e) => {
            assert!(matches!(e, AppError::Config(_)));
            assert_eq!(e.exit_code(), 2);
        }
        Ok(_) => panic!("connected without credentials"),
    }
    assert!(audio_files(temp_dir.path())?.is_empty());
    Ok(())
}

#[test]
fn test_connect_withUnreadableCredentials_shouldFailWithConfigExitCode() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), ".secrets/gcp_service_account.json", "not json")?;
    let controller = controller(temp_dir.path(), RunOptions::default())?;

    match controller.connect(None) {
        Err(e) => assert_eq!(e.exit_code(), 2),
        Ok(_) => panic!("accepted an invalid credentials file"),
    }
    Ok(())
}

#[test]
fn test_connect_withDryRun_shouldNotNeedCredentials() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let options = RunOptions { dry_run: true, ..RunOptions::default() };
    let controller = controller(temp_dir.path(), options)?;

    assert!(controller.connect(None)?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_run_withMissingContentRoot_shouldFailWithContentExitCode() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = controller(temp_dir.path(), RunOptions::default())?;

    let units = controller.run_with(&all_units(), mock(MockSynthesizer::working())).await;
    let roles = controller.run_with(&default_roles(), mock(MockSynthesizer::working())).await;

    for result in [units, roles] {
        match result {
            Err(e) => {
                assert!(matches!(e, AppError::Content(_)));
                assert_eq!(e.exit_code(), 2);
            }
            Ok(stats) => panic!("expected a content error, got {:?}", stats),
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_run_withDryRun_shouldReportPlanAndWriteNothing() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::write_greetings_unit(temp_dir.path())?;
    let options = RunOptions { dry_run: true, slow: true, ..RunOptions::default() };
    let controller = controller(temp_dir.path(), options)?;

    let stats = controller.run(&all_units()).await?;

    assert_eq!(stats, RunStats { generated: 0, skipped: 0, failed: 0, planned: 4 });
    assert!(audio_files(temp_dir.path())?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_run_twice_shouldSkipEverythingTheSecondTime() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::write_greetings_unit(temp_dir.path())?;
    let options = RunOptions { slow: true, ..RunOptions::default() };
    let controller = controller(temp_dir.path(), options)?;

    let first = controller.run_with(&all_units(), mock(MockSynthesizer::working())).await?;
    let second_mock = MockSynthesizer::working();
    let recorder = second_mock.recorder();
    let second = controller.run_with(&all_units(), mock(second_mock)).await?;

    assert_eq!(first.generated, 4);
    assert_eq!(first.exit_code(), 0);
    assert_eq!(second.generated, 0);
    assert_eq!(second.skipped, first.total());
    assert!(recorder.lock().unwrap().is_empty());

    let names: Vec<String> = audio_files(temp_dir.path())?
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .collect();
    assert_eq!(
        names,
        vec![
            "greet_01_normal.ogg",
            "greet_01_slow.ogg",
            "greet_02_normal.ogg",
            "greet_02_slow.ogg"
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_run_withProviderFailure_shouldCompleteWithFailureExitCode() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::write_greetings_unit(temp_dir.path())?;
    let controller = controller(temp_dir.path(), RunOptions::default())?;

    let stats = controller.run_with(&all_units(), mock(MockSynthesizer::failing_on("Ačiū"))).await?;

    assert_eq!(stats.generated, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.exit_code(), 1);
    assert_eq!(audio_files(temp_dir.path())?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_run_withUnknownUnit_shouldSucceedWithNothingToDo() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::write_greetings_unit(temp_dir.path())?;
    let controller = controller(temp_dir.path(), RunOptions::default())?;
    let target = ContentTarget::Units { unit: Some("unit_42".to_string()) };

    let stats = controller.run_with(&target, mock(MockSynthesizer::working())).await?;

    assert_eq!(stats, RunStats::default());
    assert_eq!(stats.exit_code(), 0);
    Ok(())
}

#[tokio::test]
async fn test_run_roles_shouldWriteExplicitPathsUnderBaseDir() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::write_role_pack(temp_dir.path())?;
    let options = RunOptions { slow: true, ..RunOptions::default() };
    let controller = controller(temp_dir.path(), options)?;
    let synth = MockSynthesizer::working();
    let recorder = synth.recorder();

    let stats = controller.run_with(&default_roles(), mock(synth)).await?;

    assert_eq!(stats.generated, 5);
    let roles_dir = temp_dir.path().join("assets/audio/roles/traveler");
    assert!(roles_dir.join("airport/checkin_01.mp3").is_file());
    assert!(roles_dir.join("airport/checkin_02_slow.mp3").is_file());
    assert!(roles_dir.join("airport/takeaway_pasas.ogg").is_file());
    assert!(roles_dir.join("hotel/reception_01.mp3").is_file());

    let requests = recorder.lock().unwrap();
    let slow: Vec<&str> = requests
        .iter()
        .filter(|r| r.speaking_rate == 0.7)
        .map(|r| r.text.as_str())
        .collect();
    assert_eq!(slow, vec!["Jūsų pasas?"]);
    Ok(())
}

#[tokio::test]
async fn test_run_roles_withScenarioFilter_shouldOnlyTouchThatScenario() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::write_role_pack(temp_dir.path())?;
    let controller = controller(temp_dir.path(), RunOptions::default())?;
    let target = ContentTarget::Roles { pack: None, scenario: Some("hotel".to_string()) };

    let stats = controller.run_with(&target, mock(MockSynthesizer::working())).await?;

    assert_eq!(stats.generated, 1);
    assert!(!temp_dir.path().join("assets/audio/roles/traveler/airport").exists());
    Ok(())
}
