//! Display-id → storage-id overrides for spine assets.
//!
//! A handful of enemies ship their skeleton under a different id than the one
//! the game data reports. The table is read once at start-up and never
//! mutated afterwards.

use std::collections::HashMap;
use std::path::Path;

use hellabot_domain::SubjectKind;

#[derive(Debug, thiserror::Error)]
pub enum OverrideError {
    #[error("Failed to read override table {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid override table {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Immutable identifier override table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdOverrides {
    map: HashMap<String, String>,
}

impl IdOverrides {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            map: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Load a flat JSON object of `"display_id": "storage_id"` pairs.
    pub fn load(path: &Path) -> Result<Self, OverrideError> {
        let raw = std::fs::read_to_string(path).map_err(|source| OverrideError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let map: HashMap<String, String> =
            serde_json::from_str(&raw).map_err(|source| OverrideError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        tracing::info!(path = %path.display(), entries = map.len(), "Loaded spine id overrides");
        Ok(Self { map })
    }

    /// Storage id for `id`; ids without an override map to themselves.
    pub fn apply<'a>(&'a self, id: &'a str) -> &'a str {
        self.map.get(id).map(String::as_str).unwrap_or(id)
    }

    /// Storage id for a subject. Only enemy ids are remapped.
    pub fn storage_id<'a>(&'a self, kind: SubjectKind, id: &'a str) -> &'a str {
        match kind {
            SubjectKind::Enemy => self.apply(id),
            SubjectKind::Operator => id,
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn unmapped_ids_pass_through() {
        let overrides = IdOverrides::from_pairs([("enemy_1536_ncrmcr", "enemy_1536_ncrmcr_2")]);
        assert_eq!(overrides.apply("enemy_1536_ncrmcr"), "enemy_1536_ncrmcr_2");
        assert_eq!(overrides.apply("enemy_1000_gopro"), "enemy_1000_gopro");
        assert_eq!(IdOverrides::empty().apply("x"), "x");
    }

    #[test]
    fn operator_ids_are_never_remapped() {
        let overrides = IdOverrides::from_pairs([("char_1012_skadi2", "enemy_1536_ncrmcr")]);
        assert_eq!(
            overrides.storage_id(SubjectKind::Operator, "char_1012_skadi2"),
            "char_1012_skadi2"
        );
        assert_eq!(
            overrides.storage_id(SubjectKind::Enemy, "char_1012_skadi2"),
            "enemy_1536_ncrmcr"
        );
    }

    #[test]
    fn loads_json_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"enemy_a": "enemy_a_2", "enemy_b": "enemy_b_x"}}"#).unwrap();

        let overrides = IdOverrides::load(file.path()).unwrap();
        assert_eq!(overrides.len(), 2);
        assert_eq!(overrides.apply("enemy_b"), "enemy_b_x");
    }

    #[test]
    fn rejects_non_object_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2, 3]").unwrap();

        assert!(matches!(
            IdOverrides::load(file.path()),
            Err(OverrideError::Parse { .. })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = IdOverrides::load(Path::new("/nonexistent/overrides.json"));
        assert!(matches!(result, Err(OverrideError::Io { .. })));
    }
}
