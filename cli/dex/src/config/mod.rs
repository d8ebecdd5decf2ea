use std::collections::HashMap;
use std::env;
use std::num::NonZeroU32;
use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config as HierarchicalConfig, Environment};
use dex_catalog::DEFAULT_CATALOG_URL;
use dex_rust_sdk::models::query::{DEFAULT_PAGE_SIZE, DEFAULT_TRIGGER_PAGE_SIZE};
use log::debug;
use serde::{Deserialize, Serialize};
use xdg::BaseDirectories;

/// Name of dex managed directories
const DEX_DIR_NAME: &str = "dex";
const DEX_CONFIG_DIR_VAR: &str = "DEX_CONFIG_DIR";
pub const DEX_CONFIG_FILE: &str = "dex.toml";
const DEX_ENV_PREFIX: &str = "DEX_";

/// Describes the configuration of the explorer
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    /// The base url of the catalog API
    // A String rather than a Url, so the path is kept as configured
    pub catalog_url: String,

    /// How many Pokémon `dex list` shows per page by default
    pub page_size: NonZeroU32,

    /// How many evolution triggers `dex triggers` shows per page by default
    pub trigger_page_size: NonZeroU32,

    /// User agent sent with catalog requests
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Directory the user configuration file is read from (default: `$XDG_CONFIG_HOME/dex`)
    ///
    /// Set from `$DEX_CONFIG_DIR`, configuration files cannot change it.
    #[serde(default)]
    pub config_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            trigger_page_size: DEFAULT_TRIGGER_PAGE_SIZE,
            user_agent: None,
            config_dir: None,
        }
    }
}

impl Config {
    /// Read the layered configuration
    ///
    /// Later sources override earlier ones:
    /// 1. defaults
    /// 2. `/etc/dex.toml`
    /// 3. `dex.toml` in the XDG config directories
    /// 4. `$DEX_CONFIG_DIR/dex.toml`
    /// 5. `DEX_*` environment variables
    fn raw_config() -> Result<HierarchicalConfig> {
        let dex_dirs = BaseDirectories::with_prefix(DEX_DIR_NAME);

        let config_dir: Option<PathBuf> = match env::var(DEX_CONFIG_DIR_VAR) {
            Ok(v) => {
                debug!("`${DEX_CONFIG_DIR_VAR}` set: {v}");
                Some(v.into())
            },
            Err(_) => {
                let config_dir = dex_dirs.get_config_home();
                debug!("`${DEX_CONFIG_DIR_VAR}` not set, using {config_dir:?}");
                config_dir
            },
        };

        let mut builder = HierarchicalConfig::builder()
            .set_default("catalog_url", DEFAULT_CATALOG_URL)?
            .set_default("page_size", i64::from(DEFAULT_PAGE_SIZE.get()))?
            .set_default("trigger_page_size", i64::from(DEFAULT_TRIGGER_PAGE_SIZE.get()))?;

        // read from /etc
        builder = builder.add_source(
            config::File::from(PathBuf::from("/etc").join(DEX_CONFIG_FILE))
                .format(config::FileFormat::Toml)
                .required(false),
        );

        // look for files in XDG_CONFIG_DIRS locations
        for file in dex_dirs.find_config_files(DEX_CONFIG_FILE) {
            builder = builder.add_source(config::File::from(file).format(config::FileFormat::Toml));
        }

        if let Some(config_dir) = &config_dir {
            // Add explicit DEX_CONFIG_DIR file last
            builder = builder
                .add_source(
                    config::File::from(config_dir.join(DEX_CONFIG_FILE))
                        .format(config::FileFormat::Toml)
                        .required(false),
                )
                // Config dir is added to the config for completeness;
                // the config file cannot change the config dir.
                .set_override("config_dir", config_dir.to_string_lossy().into_owned())?;
        }

        // override via env variables
        let dex_envs = env::vars()
            .filter_map(|(k, v)| k.strip_prefix(DEX_ENV_PREFIX).map(|k| (k.to_owned(), v)))
            .filter(|(k, _)| k != "CONFIG_DIR")
            .collect::<HashMap<_, _>>();

        let builder = builder.add_source(
            Environment::default()
                .source(Some(dex_envs))
                .try_parsing(true),
        );

        Ok(builder.build()?)
    }

    /// Creates a [Config] from the environment and config files
    pub fn parse() -> Result<Config> {
        let raw_config = Self::raw_config()?;
        let config: Config = raw_config
            .try_deserialize()
            .context("Could not parse config")?;
        debug!("parsed config: {config:?}");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use serial_test::serial;
    use tempfile::TempDir;

    use super::*;

    /// Run `f` with an isolated XDG environment and `DEX_CONFIG_DIR` pointing at `config_dir`
    fn with_isolated_env<R>(
        config_dir: &TempDir,
        vars: &[(&str, &str)],
        f: impl FnOnce() -> R,
    ) -> R {
        let home = tempfile::tempdir().unwrap();
        let mut all_vars: Vec<(String, Option<String>)> = vec![
            ("HOME".to_string(), Some(home.path().to_string_lossy().into_owned())),
            (
                "XDG_CONFIG_HOME".to_string(),
                Some(home.path().join(".config").to_string_lossy().into_owned()),
            ),
            (
                "XDG_CONFIG_DIRS".to_string(),
                Some(home.path().join("etc-xdg").to_string_lossy().into_owned()),
            ),
            (
                DEX_CONFIG_DIR_VAR.to_string(),
                Some(config_dir.path().to_string_lossy().into_owned()),
            ),
            ("DEX_CATALOG_URL".to_string(), None),
            ("DEX_PAGE_SIZE".to_string(), None),
            ("DEX_TRIGGER_PAGE_SIZE".to_string(), None),
            ("DEX_USER_AGENT".to_string(), None),
        ];
        for (key, value) in vars {
            let value = Some(value.to_string());
            match all_vars.iter_mut().find(|(k, _)| k.as_str() == *key) {
                Some(entry) => entry.1 = value,
                None => all_vars.push((key.to_string(), value)),
            }
        }
        temp_env::with_vars(all_vars, f)
    }

    #[test]
    #[serial]
    fn defaults_without_config_files() {
        let config_dir = tempfile::tempdir().unwrap();
        let config = with_isolated_env(&config_dir, &[], || Config::parse().unwrap());

        assert_eq!(config.catalog_url, "https://pokeapi.co/api/v2");
        assert_eq!(config.page_size.get(), 20);
        assert_eq!(config.trigger_page_size.get(), 10);
        assert_eq!(config.user_agent, None);
        assert_eq!(config.config_dir.as_deref(), Some(config_dir.path()));
    }

    #[test]
    #[serial]
    fn config_file_overrides_defaults() {
        let config_dir = tempfile::tempdir().unwrap();
        fs::write(config_dir.path().join(DEX_CONFIG_FILE), indoc! {r#"
            catalog_url = "http://localhost:8080/api/v2"
            page_size = 50
        "#})
        .unwrap();

        let config = with_isolated_env(&config_dir, &[], || Config::parse().unwrap());

        assert_eq!(config.catalog_url, "http://localhost:8080/api/v2");
        assert_eq!(config.page_size.get(), 50);
        assert_eq!(config.trigger_page_size.get(), 10);
    }

    #[test]
    #[serial]
    fn env_overrides_config_file() {
        let config_dir = tempfile::tempdir().unwrap();
        fs::write(config_dir.path().join(DEX_CONFIG_FILE), indoc! {"
            page_size = 50
        "})
        .unwrap();

        let config = with_isolated_env(
            &config_dir,
            &[("DEX_PAGE_SIZE", "30"), ("DEX_USER_AGENT", "dex-test")],
            || Config::parse().unwrap(),
        );

        assert_eq!(config.page_size.get(), 30);
        assert_eq!(config.user_agent.as_deref(), Some("dex-test"));
    }

    #[test]
    #[serial]
    fn xdg_config_file_is_read() {
        let config_dir = tempfile::tempdir().unwrap();
        let xdg_home = tempfile::tempdir().unwrap();
        fs::create_dir_all(xdg_home.path().join(DEX_DIR_NAME)).unwrap();
        fs::write(
            xdg_home.path().join(DEX_DIR_NAME).join(DEX_CONFIG_FILE),
            "trigger_page_size = 5\n",
        )
        .unwrap();

        let xdg_config_home = xdg_home.path().to_string_lossy().into_owned();

        let config = with_isolated_env(
            &config_dir,
            &[("XDG_CONFIG_HOME", xdg_config_home.as_str())],
            || Config::parse().unwrap(),
        );

        assert_eq!(config.trigger_page_size.get(), 5);
    }

    #[test]
    #[serial]
    fn zero_page_size_is_rejected() {
        let config_dir = tempfile::tempdir().unwrap();
        let result = with_isolated_env(&config_dir, &[("DEX_PAGE_SIZE", "0")], Config::parse);
        assert!(result.is_err());
    }
}
