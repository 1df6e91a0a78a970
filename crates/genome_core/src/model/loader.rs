//! Base-document loader.
//!
//! # Responsibility
//! - Turn the nested-map document format into a typed `GenomeTree`.
//! - Normalize collection-key aliases through the level table.
//!
//! # Invariants
//! - The level table is validated before any document is accepted.
//! - A collection key is only accepted directly under its parent level;
//!   anything else (including children under an `Atome`) is rejected.

use crate::model::level::{validate_level_table, Level};
use crate::model::tree::GenomeTree;
use log::{error, info};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub type LoadResult<T> = Result<T, LoadError>;

#[derive(Debug)]
pub enum LoadError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json(serde_json::Error),
    /// Level key table failed its consistency check.
    LevelTable(String),
    /// Document structure does not match the four-level layout.
    InvalidShape(String),
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read genome `{}`: {source}", path.display())
            }
            Self::Json(err) => write!(f, "invalid genome json: {err}"),
            Self::LevelTable(message) => write!(f, "invalid level table: {message}"),
            Self::InvalidShape(message) => write!(f, "invalid genome shape: {message}"),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json(err) => Some(err),
            Self::LevelTable(_) | Self::InvalidShape(_) => None,
        }
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Loads a genome document from a JSON file.
pub fn load_genome_file(path: impl AsRef<Path>) -> LoadResult<GenomeTree> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_genome_str(&raw)
}

/// Loads a genome document from JSON text.
pub fn load_genome_str(raw: &str) -> LoadResult<GenomeTree> {
    let value: Value = serde_json::from_str(raw)?;
    load_genome_value(value)
}

/// Loads a genome document from an already parsed JSON value.
pub fn load_genome_value(document: Value) -> LoadResult<GenomeTree> {
    validate_level_table().map_err(LoadError::LevelTable)?;

    let normalized = match normalize_node(document, None, "genome") {
        Ok(value) => value,
        Err(err) => {
            error!("event=genome_load module=loader status=error error={err}");
            return Err(err);
        }
    };
    let tree: GenomeTree = serde_json::from_value(normalized)?;
    info!(
        "event=genome_load module=loader status=ok roots={} nodes={}",
        tree.corps.len(),
        tree.node_count()
    );
    Ok(tree)
}

/// Rewrites collection keys to canonical form below `level` (`None` = document root).
fn normalize_node(value: Value, level: Option<Level>, location: &str) -> LoadResult<Value> {
    let Value::Object(fields) = value else {
        return Err(LoadError::InvalidShape(format!(
            "`{location}` must be an object"
        )));
    };

    let expected_child = match level {
        None => Some(Level::Corps),
        Some(level) => level.child(),
    };

    let mut normalized = Map::with_capacity(fields.len());
    for (key, field) in fields {
        let Some(collection_level) = Level::from_key(&key) else {
            normalized.insert(key, field);
            continue;
        };

        if Some(collection_level) != expected_child {
            let owner = level.map_or("the document root".to_string(), |l| l.to_string());
            return Err(LoadError::InvalidShape(format!(
                "collection `{key}` at `{location}` is not allowed under {owner}"
            )));
        }

        let canonical = collection_level.collection_key();
        if normalized.contains_key(canonical) {
            return Err(LoadError::InvalidShape(format!(
                "`{location}` declares `{canonical}` more than once"
            )));
        }

        let Value::Array(items) = field else {
            return Err(LoadError::InvalidShape(format!(
                "collection `{key}` at `{location}` must be an array"
            )));
        };
        let children = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                let child_location = format!("{location}.{}[{index}]", collection_level.path_key());
                normalize_node(item, Some(collection_level), &child_location)
            })
            .collect::<LoadResult<Vec<_>>>()?;
        normalized.insert(canonical.to_string(), Value::Array(children));
    }
    Ok(Value::Object(normalized))
}

#[cfg(test)]
mod tests {
    use super::{load_genome_value, LoadError};
    use serde_json::json;

    #[test]
    fn short_keys_are_normalized() {
        let tree = load_genome_value(json!({
            "version": "1",
            "n0": [{ "name": "Frontend", "n1": [{ "name": "Header", "n2": [] }] }]
        }))
        .unwrap();
        assert_eq!(tree.corps.len(), 1);
        assert_eq!(tree.corps[0].organes.len(), 1);
        assert_eq!(tree.metadata.get("version"), Some(&json!("1")));
    }

    #[test]
    fn children_under_atome_are_rejected() {
        let err = load_genome_value(json!({
            "n0_phases": [{ "n1_sections": [{ "n2_features": [{
                "n3_ui_elements": [{ "name": "leaf", "n1_sections": [] }]
            }]}]}]
        }))
        .unwrap_err();
        assert!(matches!(err, LoadError::InvalidShape(_)));
    }

    #[test]
    fn skipped_level_is_rejected() {
        let err = load_genome_value(json!({
            "n0_phases": [{ "n2_features": [] }]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("n2_features"));
    }

    #[test]
    fn duplicate_alias_is_rejected() {
        let err = load_genome_value(json!({
            "n0": [],
            "n0_phases": []
        }))
        .unwrap_err();
        assert!(matches!(err, LoadError::InvalidShape(_)));
    }
}
