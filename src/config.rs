//! Ambient configuration: library root for `import` resolution and REPL
//! display flags. Three-tier precedence: defaults, then an optional
//! `nougaro.json` config file, then CLI flags. The config file is JSON
//! (via `serde`/`serde_json`) rather than TOML, keeping the dependency
//! list to what the CLI stack already needs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct InterpreterConfig {
    pub lib_root: PathBuf,
    pub color: bool,
}

impl Default for InterpreterConfig {
    fn default() -> InterpreterConfig {
        InterpreterConfig { lib_root: PathBuf::from("."), color: true }
    }
}

/// On-disk shape of `nougaro.json`, every field optional so a config file
/// only needs to override what it cares about.
#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    lib_root: Option<PathBuf>,
    color: Option<bool>,
}

impl InterpreterConfig {
    /// Looks for `nougaro.json` next to `entry_script` and merges it over
    /// the defaults. A missing file is not an error; a malformed one is
    /// logged and ignored, matching the "warn on recoverable situations"
    /// logging discipline.
    pub fn discover(entry_dir: &Path) -> InterpreterConfig {
        let mut config = InterpreterConfig::default();
        config.lib_root = entry_dir.to_path_buf();

        let candidate = entry_dir.join("nougaro.json");
        let Ok(text) = fs::read_to_string(&candidate) else {
            return config;
        };
        match serde_json::from_str::<ConfigFile>(&text) {
            Ok(file) => {
                if let Some(root) = file.lib_root {
                    config.lib_root = entry_dir.join(root);
                }
                if let Some(color) = file.color {
                    config.color = color;
                }
            }
            Err(e) => log::warn!("ignoring malformed {}: {e}", candidate.display()),
        }
        config
    }

    pub fn apply_cli_overrides(&mut self, lib_root: Option<PathBuf>, no_color: bool) {
        if let Some(root) = lib_root {
            self.lib_root = root;
        }
        if no_color {
            self.color = false;
        }
    }
}
