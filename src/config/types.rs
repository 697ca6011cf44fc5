//! Configuration type definitions.
//!
//! These types are pure data - no I/O. Loading and layering live in `load`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Name of the optional project config file, looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "folio.yaml";

/// Fully resolved settings for one run.
///
/// ```yaml
/// out: ./dist
/// base_url: https://example.com/
/// hooks: ./hooks
/// highlight: true
/// highlight_theme: dracula
/// hard_wrap: false
/// port: 8080
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Project root containing `pages/`, `public/` and the hooks directory
    #[serde(default = "default_path")]
    pub path: PathBuf,
    /// Output root
    #[serde(default = "default_out")]
    pub out: PathBuf,
    /// Base URL exposed to templates as `Meta.BaseURL`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Hooks directory, relative to `path`
    #[serde(default = "default_hooks")]
    pub hooks: PathBuf,
    /// Highlight fenced code blocks
    #[serde(default)]
    pub highlight: bool,
    #[serde(default = "default_highlight_theme")]
    pub highlight_theme: String,
    /// Turn every soft line break into `<br />`
    #[serde(default = "default_true")]
    pub hard_wrap: bool,
    /// Start the preview server after building
    #[serde(default)]
    pub serve: bool,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Open the served site in the default browser
    #[serde(default)]
    pub open: bool,
}

pub(super) fn default_path() -> PathBuf {
    PathBuf::from(".")
}

pub(super) fn default_out() -> PathBuf {
    PathBuf::from("./dist")
}

pub(super) fn default_base_url() -> String {
    "/".to_string()
}

pub(super) fn default_hooks() -> PathBuf {
    PathBuf::from("./hooks")
}

pub(super) fn default_highlight_theme() -> String {
    "dracula".to_string()
}

fn default_true() -> bool {
    true
}

pub(super) fn default_port() -> u16 {
    3000
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            out: default_out(),
            base_url: default_base_url(),
            hooks: default_hooks(),
            highlight: false,
            highlight_theme: default_highlight_theme(),
            hard_wrap: true,
            serve: false,
            port: default_port(),
            open: false,
        }
    }
}

impl BuildConfig {
    /// Documents subtree.
    pub fn pages_dir(&self) -> PathBuf {
        self.path.join("pages")
    }

    /// Static assets copied verbatim into the output root.
    pub fn public_dir(&self) -> PathBuf {
        self.path.join("public")
    }

    pub fn hooks_dir(&self) -> PathBuf {
        self.path.join(&self.hooks)
    }
}

/// Values given on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub path: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub base_url: Option<String>,
    pub hooks: Option<PathBuf>,
    pub highlight: Option<bool>,
    pub highlight_theme: Option<String>,
    pub hard_wrap: Option<bool>,
    pub serve: Option<bool>,
    pub port: Option<u16>,
    pub open: Option<bool>,
}
