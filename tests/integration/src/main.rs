//! Integration Test Harness
//!
//! Runs every integration test category and prints a summary.
//!
//! # Usage
//!
//! Run all tests:
//! ```text
//! cargo run -p integration-tests
//! ```
//!
//! Run specific test categories:
//! ```text
//! cargo test -p integration-tests --test scenario_tests
//! cargo test -p integration-tests --test cache_tests
//! cargo test -p integration-tests --test concurrency_tests
//! ```
//!
//! Run with increased logging:
//! ```text
//! RUST_LOG=vdesk_interop=debug cargo run -p integration-tests
//! ```

use std::process::Command;
use std::time::{Duration, Instant};

/// Test category
#[derive(Debug, Clone)]
struct TestCategory {
    name: &'static str,
    description: &'static str,
    test_name: &'static str,
}

const TEST_CATEGORIES: &[TestCategory] = &[
    TestCategory {
        name: "Scenario Tests",
        description: "Version resolution, first synthesis, failed compilation",
        test_name: "scenario_tests",
    },
    TestCategory {
        name: "Cache Tests",
        description: "Directory precedence, corruption tolerance, version floor",
        test_name: "cache_tests",
    },
    TestCategory {
        name: "Concurrency Tests",
        description: "Concurrent first-run synthesis into one cache directory",
        test_name: "concurrency_tests",
    },
];

fn run_test_category(category: &TestCategory) -> (bool, Duration, String) {
    println!("\n{}", "=".repeat(80));
    println!("Running: {} - {}", category.name, category.description);
    println!("{}", "=".repeat(80));

    let start = Instant::now();
    let output = Command::new("cargo")
        .args(["test", "-p", "integration-tests", "--test", category.test_name, "--", "--nocapture"])
        .output();
    let duration = start.elapsed();

    match output {
        Ok(output) => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stdout.is_empty() {
                println!("{}", stdout);
            }
            if !stderr.is_empty() {
                eprintln!("{}", stderr);
            }

            let success = output.status.success();
            let summary = if success {
                "PASSED".to_string()
            } else {
                format!("FAILED (exit code: {:?})", output.status.code())
            };
            (success, duration, summary)
        }
        Err(e) => (false, duration, format!("Failed to execute: {}", e)),
    }
}

fn main() {
    let total_start = Instant::now();
    let results: Vec<_> = TEST_CATEGORIES
        .iter()
        .map(|category| {
            let (success, duration, summary) = run_test_category(category);
            (category.name, success, duration, summary)
        })
        .collect();
    let total_duration = total_start.elapsed();

    let failed = results.iter().filter(|(_, s, _, _)| !*s).count();

    println!("\n{}", "=".repeat(80));
    println!("SUMMARY: {} categories, {} failed, {:?}", results.len(), failed, total_duration);
    println!("{}", "-".repeat(80));
    for (name, success, duration, summary) in &results {
        let status = if *success { "PASS" } else { "FAIL" };
        println!("{:<30} {:<10} {:<15?} {}", name, status, duration, summary);
    }

    std::process::exit(if failed > 0 { 1 } else { 0 });
}
