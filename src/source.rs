use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Structured-text formats the dataset can be published in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Yaml,
    Json,
}

impl SourceFormat {
    /// Infer the format from a URL's path; anything that isn't `.json` is YAML.
    pub fn from_url(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        if path.to_ascii_lowercase().ends_with(".json") {
            Self::Json
        } else {
            Self::Yaml
        }
    }

    /// File suffix used for the downloaded copy.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Yaml => ".yml",
            Self::Json => ".json",
        }
    }

    fn feature(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
        }
    }

    fn is_available(self) -> bool {
        match self {
            Self::Yaml => cfg!(feature = "yaml"),
            Self::Json => cfg!(feature = "json"),
        }
    }

    /// Fail early when this build has no decoder for the format.
    pub fn ensure_available(self) -> Result<(), SourceError> {
        if self.is_available() {
            Ok(())
        } else {
            Err(SourceError::MissingDecoder {
                format: self,
                feature: self.feature(),
            })
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Yaml => "YAML",
            Self::Json => "JSON",
        })
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{format} decoding is not available in this build; rebuild with `--features {feature}`")]
    MissingDecoder {
        format: SourceFormat,
        feature: &'static str,
    },
    #[error("failed to read source document")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "yaml")]
    #[error("malformed YAML document")]
    Yaml(#[from] serde_yaml::Error),
    #[cfg(feature = "json")]
    #[error("malformed JSON document")]
    Json(#[from] serde_json::Error),
}

/// One headword as published, before any normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SourceEntry {
    #[serde(default, deserialize_with = "lenient")]
    pub entry: String,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub defs: Vec<Definition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Definition {
    #[serde(default, deserialize_with = "lenient")]
    pub entry: String,
}

/// Either a well-typed value or anything else, which reads as the default.
#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Value(T),
    Other(IgnoredAny),
}

impl<T: Default> Lenient<T> {
    fn into_inner(self) -> T {
        match self {
            Self::Value(v) => v,
            Self::Other(_) => T::default(),
        }
    }
}

fn lenient<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Lenient::deserialize(de).map(Lenient::into_inner)
}

fn lenient_seq<'de, D, T>(de: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let items: Vec<Lenient<T>> = lenient(de)?;
    Ok(items.into_iter().map(Lenient::into_inner).collect())
}

/// Decode the document at `path`.
pub fn read_entries(path: &Path, format: SourceFormat) -> Result<Vec<SourceEntry>, SourceError> {
    format.ensure_available()?;
    let file = File::open(path)?;
    from_reader(BufReader::new(file), format)
}

/// Decode a whole document. The top level must be a sequence; elements that
/// aren't mappings become empty entries.
#[allow(unused_variables)]
pub fn from_reader<R: Read>(
    reader: R,
    format: SourceFormat,
) -> Result<Vec<SourceEntry>, SourceError> {
    let slots: Vec<Lenient<SourceEntry>> = match format {
        #[cfg(feature = "yaml")]
        SourceFormat::Yaml => serde_yaml::from_reader(reader)?,
        #[cfg(feature = "json")]
        SourceFormat::Json => serde_json::from_reader(reader)?,
        #[allow(unreachable_patterns)]
        other => {
            other.ensure_available()?;
            Vec::new()
        }
    };
    Ok(slots.into_iter().map(Lenient::into_inner).collect())
}
