//! Load the static unit table from TOML or JSON

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::LoadError;
use crate::units::schema::UnitTables;

/// Where the static unit table comes from
#[derive(Debug, Clone)]
pub enum UnitSource {
    /// File on disk; `.json` is parsed as JSON, anything else as TOML
    Path(PathBuf),
    /// Inline TOML document
    Toml(String),
    /// Inline JSON document
    Json(String),
    /// Already-built tables (tests, embedding callers)
    Tables(UnitTables),
}

impl UnitSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        UnitSource::Path(path.into())
    }

    /// Produce validated tables, or fail with a load error
    pub fn load(&self) -> Result<UnitTables, LoadError> {
        let tables = match self {
            UnitSource::Path(path) => load_file(path)?,
            UnitSource::Toml(content) => parse_toml(content)?,
            UnitSource::Json(content) => parse_json(content)?,
            UnitSource::Tables(tables) => tables.clone(),
        };
        tables.validate()?;
        Ok(tables)
    }
}

fn load_file(path: &Path) -> Result<UnitTables, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        parse_json(&content)
    } else {
        parse_toml(&content)
    }
}

fn parse_toml(content: &str) -> Result<UnitTables, LoadError> {
    Ok(toml::from_str(content)?)
}

fn parse_json(content: &str) -> Result<UnitTables, LoadError> {
    Ok(serde_json::from_str(content)?)
}
