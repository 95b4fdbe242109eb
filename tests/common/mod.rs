//! Shared fixtures and fakes for the integration tests.
#![allow(dead_code)]

pub mod mocks;

use std::path::PathBuf;
use std::sync::Once;
use tracing::Level;

static INIT: Once = Once::new();

/// Routes crate logs to the test writer, once per test binary.
pub fn init() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_test_writer()
            .init();
    });
}

/// Get the path to test fixtures directory
pub fn fixtures_path() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("common");
    path.push("fixtures");
    path
}

pub fn fixture(name: &str) -> String {
    let path = fixtures_path().join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e))
}

/// A database file of its own under the system temp dir, removed on drop.
pub struct ScratchDb(pub PathBuf);

impl ScratchDb {
    pub fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "suroibot-{}-{}.db",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        Self(path)
    }
}

impl Drop for ScratchDb {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}
