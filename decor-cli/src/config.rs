use anyhow::{Context, Result};
use clap::ArgMatches;
use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "./decor.toml";

/// Command line settings merged from defaults, the `[build]` table of the
/// config file, `DECOR_*` environment variables and CLI arguments.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DecorConfig {
    pub build: BuildConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BuildConfig {
    /// Directory with the Markdown page sources
    pub source: String,
    /// Directory the decorated pages are written to
    pub output: String,
    /// Theme directory with an optional page.html and stylesheets
    pub theme: String,
    /// Site configuration file
    pub config: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source: "./site".to_string(),
            output: "./out".to_string(),
            theme: "./theme".to_string(),
            config: DEFAULT_CONFIG_FILE.to_string(),
        }
    }
}

impl DecorConfig {
    /// Load configuration with cascading precedence:
    /// 1. CLI arguments (highest priority)
    /// 2. Environment variables (DECOR_*)
    /// 3. Configuration file
    /// 4. Defaults (lowest priority)
    pub fn load(args: &ArgMatches) -> Result<Self> {
        let config_file = args
            .try_get_one::<String>("config")
            .unwrap_or(None)
            .cloned()
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

        let mut builder = ConfigBuilder::builder();

        builder = builder.add_source(config::Config::try_from(&Self::default())?);

        if Path::new(&config_file).exists() {
            builder = builder.add_source(File::with_name(&config_file));
        }

        builder = builder.add_source(
            Environment::with_prefix("DECOR")
                .prefix_separator("_")
                .separator("__"),
        );

        let mut cli_overrides = std::collections::HashMap::new();
        for key in ["source", "output", "theme", "config"] {
            // Not every subcommand defines every argument.
            if let Some(value) = args.try_get_one::<String>(key).unwrap_or(None) {
                cli_overrides.insert(format!("build.{key}"), value.clone());
            }
        }
        if !cli_overrides.is_empty() {
            builder = builder.add_source(config::Config::try_from(&cli_overrides)?);
        }

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Reads the site description named by `build.config`.
    pub fn site_config(&self) -> Result<decor_core::Config> {
        decor_core::Config::read(&self.build.config)
            .with_context(|| format!("Failed to read {}", self.build.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{Arg, Command};

    #[test]
    fn test_default_config() {
        let config = DecorConfig::default();
        assert_eq!(config.build.source, "./site");
        assert_eq!(config.build.output, "./out");
        assert_eq!(config.build.theme, "./theme");
        assert_eq!(config.build.config, "./decor.toml");
    }

    #[test]
    fn test_cli_args_override() {
        let app = Command::new("test")
            .arg(Arg::new("source").long("source").value_name("DIR"))
            .arg(Arg::new("output").long("output").value_name("DIR"))
            .arg(Arg::new("config").long("config").value_name("FILE"));

        let matches = app
            .try_get_matches_from(vec![
                "test",
                "--source",
                "/custom/source",
                "--output",
                "/custom/output",
                "--config",
                "/nonexistent/decor.toml",
            ])
            .unwrap();

        let config = DecorConfig::load(&matches).unwrap();
        assert_eq!(config.build.source, "/custom/source");
        assert_eq!(config.build.output, "/custom/output");
        assert_eq!(config.build.config, "/nonexistent/decor.toml");
        // Should still have defaults for non-overridden values
        assert_eq!(config.build.theme, "./theme");
    }

    #[test]
    fn test_missing_site_config() {
        let mut config = DecorConfig::default();
        config.build.config = "/nonexistent/decor.toml".into();
        let err = config.site_config().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/decor.toml"));
    }
}
