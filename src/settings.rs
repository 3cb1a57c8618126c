use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

use crate::source::SourceFormat;

pub const DEFAULT_URL: &str = "https://raw.githubusercontent.com/alar-dict/data/master/alar.yml";
pub const DEFAULT_OUT_DIR: &str = "data";
pub const DEFAULT_DB_FILE: &str = "alar.sqlite";
const ENV_PREFIX: &str = "ALAR";

/// Where the dataset comes from and where the store is written.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub url: String,
    /// Overrides the format inferred from `url`.
    #[serde(default)]
    pub format: Option<SourceFormat>,
    pub out_dir: PathBuf,
    pub db_file: String,
}

/// Command-line values that take precedence over everything else.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub format: Option<SourceFormat>,
    pub out_dir: Option<PathBuf>,
    pub db_file: Option<String>,
}

impl Settings {
    /// Built-in defaults, then `ALAR_*` environment variables, then `overrides`.
    pub fn load(overrides: Overrides) -> Result<Self> {
        Self::layered(Environment::with_prefix(ENV_PREFIX), overrides)
    }

    fn layered(env: Environment, overrides: Overrides) -> Result<Self> {
        let settings: Settings = Config::builder()
            .set_default("url", DEFAULT_URL)?
            .set_default("out_dir", DEFAULT_OUT_DIR)?
            .set_default("db_file", DEFAULT_DB_FILE)?
            .add_source(env)
            .build()
            .and_then(Config::try_deserialize)
            .context("Failed to load settings")?;
        Ok(settings.apply(overrides))
    }

    fn apply(self, overrides: Overrides) -> Self {
        Self {
            url: overrides.url.unwrap_or(self.url),
            format: overrides.format.or(self.format),
            out_dir: overrides.out_dir.unwrap_or(self.out_dir),
            db_file: overrides.db_file.unwrap_or(self.db_file),
        }
    }

    pub fn source_format(&self) -> SourceFormat {
        self.format.unwrap_or_else(|| SourceFormat::from_url(&self.url))
    }

    pub fn db_path(&self) -> PathBuf {
        self.out_dir.join(&self.db_file)
    }
}
