//! Concurrency Tests - First-run Synthesis Races
//!
//! Two callers asking for a binding on an empty cache at the same time:
//! - Within one provider, synthesis runs once and the other caller reuses it
//! - Independent providers (standing in for separate processes) race on the
//!   write and converge on byte-identical output

mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use common::*;
use vdesk_interop::{Locator, BuildNumber, Origin};

#[test]
fn shared_provider_synthesizes_once() {
    init_tracing();

    let cache = tempfile::tempdir().unwrap();
    let provider = Arc::new(provider(cache.path(), &[], 22631, synthesizer()));
    let barrier = Arc::new(Barrier::new(4));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let provider = Arc::clone(&provider);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                provider.binding().unwrap()
            })
        })
        .collect();

    let bindings: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let synthesized = bindings.iter().filter(|b| b.origin == Origin::Synthesized).count();
    assert_eq!(synthesized, 1);
    assert!(bindings.iter().all(|b| b.module == bindings[0].module));
    assert_eq!(files_in(cache.path()).len(), 1);
}

#[test]
fn independent_writers_converge() {
    init_tracing();

    let cache = tempfile::tempdir().unwrap();
    let barrier = Barrier::new(2);

    let results: Vec<Vec<u8>> = thread::scope(|s| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let barrier = &barrier;
                let dir = cache.path();
                s.spawn(move || {
                    let synth = synthesizer();
                    barrier.wait();
                    let loaded = synth.synthesize(BuildNumber(22631), dir).unwrap();
                    std::fs::read(&loaded.path).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results[0], results[1]);

    // Only the final artifact remains; no temporary files leak
    let files = files_in(cache.path());
    assert_eq!(files.len(), 1);
    assert_eq!(std::fs::read(&files[0]).unwrap(), results[0]);

    let found = Locator::new()
        .find_existing(BuildNumber(22631), &[cache.path().to_path_buf()])
        .unwrap();
    assert_eq!(found.path, files[0]);
}

#[test]
fn separate_providers_both_succeed() {
    init_tracing();

    let cache = tempfile::tempdir().unwrap();
    let barrier = Barrier::new(2);

    let bindings: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let barrier = &barrier;
                let dir = cache.path();
                s.spawn(move || {
                    let provider = provider(dir, &[], 22631, synthesizer());
                    barrier.wait();
                    provider.binding().unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(bindings[0].module, bindings[1].module);
    assert_eq!(bindings[0].artifact.path, bindings[1].artifact.path);
    assert_eq!(files_in(cache.path()).len(), 1);
}
