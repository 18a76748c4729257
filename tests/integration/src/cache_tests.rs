//! Binding Cache Tests
//!
//! Locator behaviour across several search directories:
//! - Directory precedence independent of file age
//! - Corrupt candidates never hide later valid ones
//! - The module version floor
//! - Repeated calls reuse the cached artifact

mod common;

use std::path::PathBuf;

use common::*;
use vdesk_interop::artifact::artifact_file_name;
use vdesk_interop::{BuildNumber, Locator, ModuleVersion, Origin, MIN_REQUIRED_VERSION, MODULE_VERSION};

fn dirs(paths: &[&std::path::Path]) -> Vec<PathBuf> {
    paths.iter().map(|p| p.to_path_buf()).collect()
}

#[test]
fn idempotent_get_binding() {
    init_tracing();

    let cache = tempfile::tempdir().unwrap();
    let provider = provider(cache.path(), &[], 22631, synthesizer());

    let first = provider.binding().unwrap();
    let second = provider.binding().unwrap();
    let third = provider.binding().unwrap();

    assert_eq!(first.origin, Origin::Synthesized);
    assert_eq!(second.origin, Origin::Cached);
    assert_eq!(third.origin, Origin::Cached);
    assert_eq!(first.module, second.module);
    assert_eq!(second.artifact, third.artifact);
    assert_eq!(files_in(cache.path()).len(), 1);
}

#[test]
fn higher_priority_directory_wins_regardless_of_age() {
    init_tracing();

    let preferred = tempfile::tempdir().unwrap();
    let fallback = tempfile::tempdir().unwrap();

    // Preferred is written first and is therefore the older file
    let older = write_artifact(preferred.path(), 22631, MODULE_VERSION);
    std::thread::sleep(std::time::Duration::from_millis(20));
    let newer = write_artifact(fallback.path(), 22631, ModuleVersion::new(1, 3));

    let found = Locator::new()
        .find_existing(BuildNumber(22631), &dirs(&[preferred.path(), fallback.path()]))
        .unwrap();
    assert_eq!(found.path, older);

    let found = Locator::new()
        .find_existing(BuildNumber(22631), &dirs(&[fallback.path(), preferred.path()]))
        .unwrap();
    assert_eq!(found.path, newer);
}

#[test]
fn override_directory_beats_cache_directory() {
    init_tracing();

    let override_dir = tempfile::tempdir().unwrap();
    let default_dir = tempfile::tempdir().unwrap();
    let in_default = write_artifact(default_dir.path(), 22631, MODULE_VERSION);
    let in_override = write_artifact(override_dir.path(), 22631, MODULE_VERSION);

    let provider = provider(
        override_dir.path(),
        &[override_dir.path(), default_dir.path()],
        22631,
        synthesizer(),
    );
    let binding = provider.binding().unwrap();
    assert_eq!(binding.origin, Origin::Cached);
    assert_eq!(binding.artifact.path, in_override);
    assert_ne!(binding.artifact.path, in_default);
}

#[test]
fn corrupt_file_does_not_hide_later_artifact() {
    init_tracing();

    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let name = artifact_file_name(BuildNumber(22631));

    // Garbage, a truncated artifact, and an empty file in earlier positions
    std::fs::write(first.path().join(&name), b"MZ\x90\x00 not a binding").unwrap();
    let valid = write_artifact(second.path(), 22631, MODULE_VERSION);
    let bytes = std::fs::read(&valid).unwrap();
    std::fs::write(first.path().join("VirtualDesktop.022631.generated.binding"), &bytes[..bytes.len() / 2]).unwrap();
    std::fs::write(first.path().join("VirtualDesktop.0022631.generated.binding"), b"").unwrap();

    let found = Locator::new()
        .find_existing(BuildNumber(22631), &dirs(&[first.path(), second.path()]))
        .unwrap();
    assert_eq!(found.path, valid);
}

#[test]
fn corrupt_file_is_skipped_within_a_directory() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let valid = write_artifact(dir.path(), 22631, MODULE_VERSION);

    // Sorts before the valid file
    let corrupt = dir.path().join("VirtualDesktop.022631.generated.binding");
    std::fs::write(&corrupt, b"VDBN\x01\x00garbage").unwrap();

    let found = Locator::new()
        .find_existing(BuildNumber(22631), &dirs(&[dir.path()]))
        .unwrap();
    assert_eq!(found.path, valid);
    assert!(corrupt.exists());
}

#[test]
fn artifact_below_version_floor_is_never_a_hit() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let stale = write_artifact(dir.path(), 22631, ModuleVersion::new(0, 9));
    assert!(ModuleVersion::new(0, 9) < MIN_REQUIRED_VERSION);

    assert!(Locator::new()
        .find_existing(BuildNumber(22631), &dirs(&[dir.path()]))
        .is_none());

    // The provider replaces it with a current artifact
    let provider = provider(dir.path(), &[], 22631, synthesizer());
    let binding = provider.binding().unwrap();
    assert_eq!(binding.origin, Origin::Synthesized);
    assert_eq!(binding.artifact.path, stale);
    assert_eq!(binding.artifact.module_version, MODULE_VERSION);
}

#[test]
fn artifacts_for_other_builds_are_ignored() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    write_artifact(dir.path(), 22000, MODULE_VERSION);
    write_artifact(dir.path(), 22621, MODULE_VERSION);

    assert!(Locator::new()
        .find_existing(BuildNumber(22631), &dirs(&[dir.path()]))
        .is_none());

    let provider = provider(dir.path(), &[], 22631, synthesizer());
    assert_eq!(provider.binding().unwrap().origin, Origin::Synthesized);
    assert_eq!(files_in(dir.path()).len(), 3);
}

#[test]
fn missing_directories_are_skipped() {
    init_tracing();

    let root = tempfile::tempdir().unwrap();
    let missing = root.path().join("missing");
    let cache = root.path().join("cache");
    let valid = write_artifact(&cache, 22631, MODULE_VERSION);

    let found = Locator::new()
        .find_existing(BuildNumber(22631), &[missing.clone(), cache])
        .unwrap();
    assert_eq!(found.path, valid);
    assert!(!missing.exists());
}
