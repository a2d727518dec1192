//! Parser for the JSON store dataset.
//!
//! A dataset directory holds two documents:
//! - stores.json: array of `Store`
//! - reviews.json: array of `Review`

use crate::error::{DataError, Result};
use crate::types::{Review, Store};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

fn parse_json_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    if !path.exists() {
        return Err(DataError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| DataError::ParseError {
        file: file_name,
        reason: e.to_string(),
    })
}

/// Parse the stores.json file
pub fn parse_stores(path: &Path) -> Result<Vec<Store>> {
    let stores: Vec<Store> = parse_json_array(path)?;
    for store in &stores {
        if !store.coordinates.is_valid() {
            return Err(DataError::InvalidValue {
                field: format!("stores[{}].coordinates", store.id),
                value: format!("{:?}", store.coordinates),
            });
        }
        if let Some(level) = store.price_level
            && !(1..=4).contains(&level)
        {
            return Err(DataError::InvalidValue {
                field: format!("stores[{}].price_level", store.id),
                value: level.to_string(),
            });
        }
    }
    Ok(stores)
}

/// Parse the reviews.json file
pub fn parse_reviews(path: &Path) -> Result<Vec<Review>> {
    parse_json_array(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("store-data-parser-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_parse_stores() {
        let path = write_temp(
            "stores_ok.json",
            r#"[{"id":1,"name":"Mapo Galbi","category":"korean",
                "coordinates":{"lat":37.55,"lon":126.95},"tags":["grill"],"price_level":2}]"#,
        );
        let stores = parse_stores(&path).unwrap();
        assert_eq!(stores.len(), 1);
        assert_eq!(stores[0].tags, vec!["grill".to_string()]);
    }

    #[test]
    fn test_parse_stores_rejects_bad_price() {
        let path = write_temp(
            "stores_bad.json",
            r#"[{"id":1,"name":"X","category":"cafe",
                "coordinates":{"lat":37.55,"lon":126.95},"price_level":9}]"#,
        );
        assert!(matches!(parse_stores(&path), Err(DataError::InvalidValue { .. })));
    }

    #[test]
    fn test_missing_file() {
        let result = parse_reviews(Path::new("/definitely/not/here/reviews.json"));
        assert!(matches!(result, Err(DataError::FileNotFound { .. })));
    }
}
