/*!
 * # lietucoach-tts - batch speech generation for LietuCoach content
 *
 * A Rust library and CLI that renders course content to audio files with
 * Google Cloud Text-to-Speech.
 *
 * ## Features
 *
 * - Vocabulary units (`content/a1/unit_NN/unit.json`) with derived
 *   `{audioId}_normal.ogg` / `{audioId}_slow.ogg` targets
 * - Role-play packs (scenarios, dialogues, turns and takeaways) with explicit
 *   audio paths
 * - Existing files are skipped unless forced; writes are atomic so an
 *   interrupted run never leaves a truncated file behind
 * - Fixed delay between provider calls
 * - Dry-run mode that makes no network calls and writes nothing
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration defaults, file loading, env overrides, validation
 * - `content`: Content discovery and parsing:
 *   - `content::units`: Vocabulary unit manifests
 *   - `content::roles`: Role-play packs
 * - `tts`: Text-to-speech client:
 *   - `tts::google`: Google Cloud Text-to-Speech REST client
 *   - `tts::auth`: Credential discovery and OAuth access tokens
 * - `generator`: Cache-checked sequential generation and run statistics
 * - `app_controller`: Main application controller
 * - `file_utils`: File system operations
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod content;
pub mod errors;
pub mod file_utils;
pub mod generator;
pub mod tts;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{ContentTarget, Controller};
pub use content::{ContentItem, ContentSource};
pub use errors::{AppError, ConfigError, ContentError, ProviderError};
pub use generator::{AudioGenerator, RunOptions, RunStats};
