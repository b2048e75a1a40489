//! Process-wide settings, built once from CLI arguments. Grounded on
//! `rari-types/src/settings.rs` + `globals.rs`'s `OnceLock<Settings>` /
//! `settings()` accessor pattern (see SPEC_FULL.md §A.3).

use std::path::PathBuf;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Settings {
    pub out_root: PathBuf,
    pub gzip_pages: bool,
    pub write_toc_json: Option<PathBuf>,
    pub write_issues: Option<PathBuf>,
    pub extractor: PathBuf,
    pub jobs: usize,
    pub deny_warnings: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            out_root: PathBuf::from("."),
            gzip_pages: false,
            write_toc_json: None,
            write_issues: None,
            extractor: PathBuf::from("7z"),
            jobs: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            deny_warnings: false,
        }
    }
}

static SETTINGS: OnceLock<Settings> = OnceLock::new();

/// Installs the process-wide settings. Must be called exactly once, before
/// any call to `settings()`; subsequent calls are ignored (mirrors
/// `rari-cli`'s `let _ = SETTINGS.set(settings);`).
pub fn init_settings(settings: Settings) {
    let _ = SETTINGS.set(settings);
}

pub fn settings() -> &'static Settings {
    SETTINGS.get_or_init(Settings::default)
}
