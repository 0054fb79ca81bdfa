use crate::errors::CoreError;
use crate::model::DatasetItem;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct DatasetFile {
    items: Vec<DatasetItem>,
}

/// Loads `{"items": [...]}` from disk. Items are addressed by position.
pub fn load_dataset(path: &Path) -> Result<Vec<DatasetItem>, CoreError> {
    if !path.exists() {
        return Err(CoreError::DatasetMissing {
            path: path.to_path_buf(),
        });
    }
    let raw = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_dataset(&raw).map_err(|e| CoreError::DatasetParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

pub fn parse_dataset(raw: &str) -> Result<Vec<DatasetItem>, serde_json::Error> {
    let file: DatasetFile = serde_json::from_str(raw)?;
    Ok(file.items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_fatal() {
        let dir = tempdir().unwrap();
        let err = load_dataset(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, CoreError::DatasetMissing { .. }));
    }

    #[test]
    fn loads_items_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("input_data.json");
        std::fs::write(
            &path,
            r#"{"items": [
                {"question": "Q1", "relevant_docs": ["a"], "irrelevant_docs": ["b"], "gold_answer": "A1"},
                {"question": "Q2", "relevant_docs": [], "irrelevant_docs": [], "gold_answer": "A2"}
            ]}"#,
        )
        .unwrap();

        let items = load_dataset(&path).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].question, "Q1");
        assert_eq!(items[1].gold_answer, "A2");
    }

    #[test]
    fn missing_items_key_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"rows": []}"#).unwrap();
        let err = load_dataset(&path).unwrap_err();
        assert!(matches!(err, CoreError::DatasetParse { .. }));
    }
}
