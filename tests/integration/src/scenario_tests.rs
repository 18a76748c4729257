//! End-to-end Scenarios
//!
//! - A: a build between boundaries resolves to the lower boundary
//! - B: a build below the floor is rejected
//! - C: a clean cache is filled once and then reused
//! - D: a broken template reports diagnostics and writes nothing

mod common;

use common::*;
use vdesk_interop::templates::{MemoryTemplates, DESCRIPTOR};
use vdesk_interop::{
    artifact, BuildNumber, EmbeddedTemplates, InteropError, InterfaceVersion, Locator,
    Origin, TemplateStore, VersionResolver, MODULE_VERSION,
};

#[test]
fn scenario_a_resolves_to_lower_boundary() {
    init_tracing();

    let resolver = VersionResolver::new(vec![10240, 20231, 21313, 22449]).unwrap();
    assert_eq!(resolver.resolve(BuildNumber(21500)).unwrap(), InterfaceVersion(21313));

    // The synthesized module records the same choice
    let module = synthesizer().compile(BuildNumber(21500)).unwrap();
    assert_eq!(module.descriptor.interface_version, 21313);
    assert_eq!(module.descriptor.os_build, 21500);
}

#[test]
fn scenario_b_below_floor_is_unsupported() {
    init_tracing();

    let resolver = VersionResolver::default();
    let err = resolver.resolve(BuildNumber(9000)).unwrap_err();
    assert!(matches!(err, InteropError::NoSupportedVersion { build: 9000 }));

    let cache = tempfile::tempdir().unwrap();
    let provider = provider(cache.path(), &[], 9000, synthesizer());
    assert!(matches!(
        provider.binding(),
        Err(InteropError::NoSupportedVersion { build: 9000 })
    ));
    assert!(files_in(cache.path()).is_empty());
}

#[test]
fn scenario_c_fills_empty_cache_once() {
    init_tracing();

    let cache = tempfile::tempdir().unwrap();
    let provider = provider(cache.path(), &[], 22631, synthesizer());

    let first = provider.binding().unwrap();
    assert_eq!(first.origin, Origin::Synthesized);
    assert_eq!(first.module.interfaces.len(), 2);
    assert_eq!(
        first.module.interface("IVirtualDesktop").unwrap().iid,
        iid(IID_VIRTUAL_DESKTOP)
    );

    // Exactly one file, named with the literal build number
    let expected = cache.path().join("VirtualDesktop.22631.generated.binding");
    assert_eq!(files_in(cache.path()), vec![expected.clone()]);
    assert_eq!(first.artifact.path, expected);
    assert_eq!(first.artifact.module_version, MODULE_VERSION);

    // The locate step alone finds the same file
    let found = Locator::new()
        .find_existing(BuildNumber(22631), &[cache.path().to_path_buf()])
        .unwrap();
    assert_eq!(found.path, expected);

    let before = std::fs::read(&expected).unwrap();
    let second = provider.binding().unwrap();
    assert_eq!(second.origin, Origin::Cached);
    assert_eq!(second.artifact.path, expected);
    assert_eq!(second.module, first.module);
    assert_eq!(std::fs::read(&expected).unwrap(), before);
}

#[test]
fn scenario_d_failed_compile_leaves_nothing() {
    init_tracing();

    let mut templates = MemoryTemplates::from_store(&EmbeddedTemplates);
    // Substitution succeeds but the method declaration is cut short
    templates.insert(
        "Build22449.IVirtualDesktopPinnedApps.idl",
        "[object, uuid(00000000-0000-0000-0000-000000000000)]\n\
         interface IVirtualDesktopPinnedApps : IUnknown {\n\
             HRESULT IsAppIdPinned([in] HSTRING appId, [out] BOOL* pinned\n\
         }\n",
    );
    assert!(templates.get(DESCRIPTOR).is_some());

    let cache = tempfile::tempdir().unwrap();
    let provider = provider(cache.path(), &[], 22631, synthesizer_with(templates));

    match provider.binding() {
        Err(InteropError::CompilationFailed { diagnostics }) => {
            assert!(!diagnostics.is_empty());
            assert!(diagnostics
                .iter()
                .any(|d| d.starts_with("IVirtualDesktopPinnedApps: ")));
        }
        other => panic!("expected a compilation failure, got {:?}", other.map(|b| b.origin)),
    }

    assert!(files_in(cache.path()).is_empty());
    assert!(Locator::new()
        .find_existing(BuildNumber(22631), &[cache.path().to_path_buf()])
        .is_none());
}

#[test]
fn scenario_d_failed_compile_keeps_peer_artifact() {
    init_tracing();

    let cache = tempfile::tempdir().unwrap();
    // Written by another process sharing the cache directory
    let peer = synthesizer().synthesize(BuildNumber(22631), cache.path()).unwrap();
    let before = std::fs::read(&peer.path).unwrap();

    let mut templates = MemoryTemplates::from_store(&EmbeddedTemplates);
    templates.insert("Build22449.IVirtualDesktop.idl", "interface IVirtualDesktop : IUnknown {");

    let err = synthesizer_with(templates)
        .synthesize(BuildNumber(22631), cache.path())
        .unwrap_err();
    assert!(matches!(err, InteropError::CompilationFailed { .. }));

    assert_eq!(files_in(cache.path()), vec![peer.path.clone()]);
    assert_eq!(std::fs::read(&peer.path).unwrap(), before);
    let found = Locator::new()
        .find_existing(BuildNumber(22631), &[cache.path().to_path_buf()])
        .unwrap();
    assert_eq!(found.path, peer.path);
}

#[test]
fn encoded_artifact_matches_synthesized_file() {
    init_tracing();

    let cache = tempfile::tempdir().unwrap();
    let path = write_artifact(cache.path(), 22631, MODULE_VERSION);
    let module = synthesizer().compile(BuildNumber(22631)).unwrap();

    assert_eq!(std::fs::read(path).unwrap(), artifact::encode(&module).unwrap().to_vec());
}
