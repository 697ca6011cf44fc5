//! Configuration loading.
//!
//! Layers, lowest precedence first: built-in defaults, `folio.yaml` in the
//! project root, `FOLIO_*` environment variables, command-line flags.
//!
//! `folio.yaml` is looked up in the root named by `--path`, else `FOLIO_PATH`,
//! else the current directory.

use std::path::PathBuf;

use super::types::{
    BuildConfig, CONFIG_FILE_NAME, ConfigOverrides, default_base_url, default_highlight_theme,
    default_hooks, default_out, default_path, default_port,
};
use super::ConfigError;

const ENV_PREFIX: &str = "FOLIO";

impl BuildConfig {
    /// Resolve the config for this run.
    pub fn load(overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        Self::load_with_env(overrides, None)
    }

    /// Resolve the config, reading `FOLIO_*` variables from `env` instead of
    /// the process environment when given.
    fn load_with_env(
        overrides: &ConfigOverrides,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let env_path = match &env {
            Some(vars) => vars.get("FOLIO_PATH").map(PathBuf::from),
            None => std::env::var_os("FOLIO_PATH").map(PathBuf::from),
        };
        let root = overrides
            .path
            .clone()
            .or(env_path)
            .unwrap_or_else(default_path);
        let config_file = root.join(CONFIG_FILE_NAME);

        let builder = config::Config::builder()
            .set_default("path", path_value(&default_path())?)?
            .set_default("out", path_value(&default_out())?)?
            .set_default("base_url", default_base_url())?
            .set_default("hooks", path_value(&default_hooks())?)?
            .set_default("highlight", false)?
            .set_default("highlight_theme", default_highlight_theme())?
            .set_default("hard_wrap", true)?
            .set_default("serve", false)?
            .set_default("port", i64::from(default_port()))?
            .set_default("open", false)?
            .add_source(config::File::from(config_file).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(env),
            )
            .set_override_option("path", overrides.path.as_deref().map(path_value).transpose()?)?
            .set_override_option("out", overrides.out.as_deref().map(path_value).transpose()?)?
            .set_override_option("base_url", overrides.base_url.clone())?
            .set_override_option(
                "hooks",
                overrides.hooks.as_deref().map(path_value).transpose()?,
            )?
            .set_override_option("highlight", overrides.highlight)?
            .set_override_option("highlight_theme", overrides.highlight_theme.clone())?
            .set_override_option("hard_wrap", overrides.hard_wrap)?
            .set_override_option("serve", overrides.serve)?
            .set_override_option("port", overrides.port.map(i64::from))?
            .set_override_option("open", overrides.open)?;

        Ok(builder.build()?.try_deserialize::<BuildConfig>()?)
    }
}

fn path_value(path: &std::path::Path) -> Result<String, ConfigError> {
    path.to_str()
        .map(str::to_string)
        .ok_or_else(|| ConfigError::EncodePath(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(vars: &[(&str, &str)]) -> Option<config::Map<String, String>> {
        Some(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_load_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = ConfigOverrides {
            path: Some(dir.path().to_path_buf()),
            ..ConfigOverrides::default()
        };

        let config = BuildConfig::load_with_env(&overrides, env(&[])).unwrap();
        assert_eq!(config.path, dir.path());
        assert_eq!(config.out, PathBuf::from("./dist"));
        assert_eq!(config.port, 3000);
        assert!(config.hard_wrap);
        assert!(!config.highlight);
    }

    #[test]
    fn test_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "base_url: https://from-file.dev/\nport: 4000\nhard_wrap: false\n",
        )
        .unwrap();

        let overrides = ConfigOverrides {
            path: Some(dir.path().to_path_buf()),
            port: Some(5000),
            ..ConfigOverrides::default()
        };

        let config = BuildConfig::load_with_env(&overrides, env(&[])).unwrap();
        assert_eq!(config.base_url, "https://from-file.dev/");
        assert_eq!(config.port, 5000);
        assert!(!config.hard_wrap);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "port: [not, a, port]\n").unwrap();

        let overrides = ConfigOverrides {
            path: Some(dir.path().to_path_buf()),
            ..ConfigOverrides::default()
        };

        assert!(BuildConfig::load_with_env(&overrides, env(&[])).is_err());
    }

    #[test]
    fn test_env_path_locates_config_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "port: 4000\n").unwrap();
        let root = dir.path().to_str().unwrap();

        let config = BuildConfig::load_with_env(
            &ConfigOverrides::default(),
            env(&[("FOLIO_PATH", root), ("FOLIO_BASE_URL", "https://env.dev/")]),
        )
        .unwrap();
        assert_eq!(config.path, dir.path());
        assert_eq!(config.port, 4000);
        assert_eq!(config.base_url, "https://env.dev/");
    }

    #[test]
    fn test_path_flag_beats_env() {
        let flagged = tempfile::tempdir().unwrap();
        let overrides = ConfigOverrides {
            path: Some(flagged.path().to_path_buf()),
            ..ConfigOverrides::default()
        };

        let config = BuildConfig::load_with_env(&overrides, env(&[("FOLIO_PATH", "/elsewhere")])).unwrap();
        assert_eq!(config.path, flagged.path());
    }

    #[test]
    fn test_path_key_in_file_is_layered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "path: site\n").unwrap();
        let root = dir.path().to_str().unwrap();

        let config =
            BuildConfig::load_with_env(&ConfigOverrides::default(), env(&[("FOLIO_PATH", root)])).unwrap();
        assert_eq!(config.path, PathBuf::from("site"));
    }
}
