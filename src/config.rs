//! Specs Location Configuration
//!
//! Decides where the document corpus and the trigger document live.
//!
//! # Resolution Priority
//!
//! The specs root is resolved in the following order:
//! 1. Explicit path (`--specs-dir`)
//! 2. `WORKFLOW_SPECS_DIR` environment variable
//! 3. `./specs` in the current directory, if it exists
//! 4. `$HOME/.workflow-specs/specs`, if it exists
//! 5. Falls back to `./specs`
//!
//! Explicit and environment values are taken as given, even when the
//! directory does not exist; loading then yields an empty collection.

use std::path::{Path, PathBuf};

use log::{debug, info};
use once_cell::sync::Lazy;

/// Environment variable overriding the specs root.
pub const SPECS_DIR_ENV: &str = "WORKFLOW_SPECS_DIR";

/// Trigger document location relative to the specs root.
pub const TRIGGERS_RELATIVE_PATH: &str = "_common/workflow-triggers.toml";

const DEFAULT_SPECS_DIR_NAME: &str = "specs";
const HOME_SPECS_DIR: &str = ".workflow-specs";

/// Lazily-resolved specs root for the current process.
pub static DEFAULT_SPECS_DIR: Lazy<PathBuf> = Lazy::new(|| {
    let env_value = std::env::var_os(SPECS_DIR_ENV).map(PathBuf::from);
    let home = std::env::var_os("HOME").map(PathBuf::from);
    resolve_specs_dir(None, env_value.as_deref(), home.as_deref())
});

/// Resolves the specs root from the explicit path, the environment value
/// and the home directory.
pub fn resolve_specs_dir(
    explicit: Option<&Path>,
    env_value: Option<&Path>,
    home: Option<&Path>,
) -> PathBuf {
    if let Some(path) = explicit {
        debug!("Using explicit specs dir: {}", path.display());
        return path.to_path_buf();
    }

    if let Some(path) = env_value.filter(|p| !p.as_os_str().is_empty()) {
        info!("Using specs dir from {}: {}", SPECS_DIR_ENV, path.display());
        return path.to_path_buf();
    }

    let cwd_path = PathBuf::from(DEFAULT_SPECS_DIR_NAME);
    if cwd_path.is_dir() {
        debug!("Using specs dir in current directory");
        return cwd_path;
    }

    if let Some(home) = home {
        let home_path = home.join(HOME_SPECS_DIR).join(DEFAULT_SPECS_DIR_NAME);
        if home_path.is_dir() {
            info!("Using home specs dir: {}", home_path.display());
            return home_path;
        }
    }

    debug!("No specs dir found, defaulting to ./{}", DEFAULT_SPECS_DIR_NAME);
    cwd_path
}

/// Where documents and the trigger document are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecsConfig {
    pub specs_dir: PathBuf,
    pub triggers_file: PathBuf,
}

impl SpecsConfig {
    /// Config rooted at `specs_dir`, with the trigger document in its
    /// usual place.
    pub fn new(specs_dir: impl Into<PathBuf>) -> Self {
        let specs_dir = specs_dir.into();
        Self {
            triggers_file: specs_dir.join(TRIGGERS_RELATIVE_PATH),
            specs_dir,
        }
    }

    /// Config for an explicit root, or the process default when `None`.
    pub fn resolve(explicit: Option<&Path>) -> Self {
        match explicit {
            Some(dir) => Self::new(dir),
            None => Self::new(DEFAULT_SPECS_DIR.clone()),
        }
    }

    pub fn with_triggers_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.triggers_file = path.into();
        self
    }
}

impl Default for SpecsConfig {
    fn default() -> Self {
        Self::resolve(None)
    }
}
