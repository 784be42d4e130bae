//! Database metadata
//!
//! Stamps the schema version and embedding dimension into a fresh database
//! and refuses to open one written with a different layout or dimension.

use crate::error::{Result, VectorError};
use rocksdb::DB;

/// Schema version stored in metadata
const SCHEMA_VERSION_KEY: &[u8] = b"meta:schema_version";
/// Embedding dimension the stored vectors were written with
const DIMENSION_KEY: &[u8] = b"meta:dimension";
pub(crate) const CURRENT_VERSION: u32 = 1;

/// Validate or initialize database metadata
pub fn ensure(db: &DB, dimension: usize) -> Result<()> {
    match read_u32(db, SCHEMA_VERSION_KEY)? {
        None => {
            log::debug!("Stamping schema version {}", CURRENT_VERSION);
            db.put(SCHEMA_VERSION_KEY, CURRENT_VERSION.to_le_bytes())?;
        }
        Some(version) if version == CURRENT_VERSION => {}
        Some(version) => {
            return Err(VectorError::invalid_path(format!(
                "Unsupported schema version {} (expected {})",
                version, CURRENT_VERSION
            )));
        }
    }

    match stored_dimension(db)? {
        None => {
            log::info!("Initializing store for {}d embeddings", dimension);
            db.put(DIMENSION_KEY, (dimension as u64).to_le_bytes())?;
        }
        Some(stored) if stored == dimension => {}
        Some(stored) => {
            log::error!(
                "Store holds {}d embeddings but {}d is configured",
                stored,
                dimension
            );
            return Err(VectorError::dimension(dimension, stored));
        }
    }

    db.flush()?;
    Ok(())
}

/// Dimension recorded in the database, if stamped
pub fn stored_dimension(db: &DB) -> Result<Option<usize>> {
    Ok(read_u64(db, DIMENSION_KEY)?.map(|d| d as usize))
}

fn read_u32(db: &DB, key: &[u8]) -> Result<Option<u32>> {
    match db.get(key)? {
        Some(bytes) => {
            let raw: [u8; 4] = bytes
                .as_slice()
                .try_into()
                .map_err(|_| VectorError::parse("Invalid metadata format"))?;
            Ok(Some(u32::from_le_bytes(raw)))
        }
        None => Ok(None),
    }
}

fn read_u64(db: &DB, key: &[u8]) -> Result<Option<u64>> {
    match db.get(key)? {
        Some(bytes) => {
            let raw: [u8; 8] = bytes
                .as_slice()
                .try_into()
                .map_err(|_| VectorError::parse("Invalid metadata format"))?;
            Ok(Some(u64::from_le_bytes(raw)))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open(path: &std::path::Path) -> DB {
        DB::open_default(path).unwrap()
    }

    #[test]
    fn test_fresh_database_is_stamped() {
        let temp_dir = TempDir::new().unwrap();
        let db = open(temp_dir.path());

        ensure(&db, 384).unwrap();

        assert_eq!(stored_dimension(&db).unwrap(), Some(384));
        assert_eq!(
            read_u32(&db, SCHEMA_VERSION_KEY).unwrap(),
            Some(CURRENT_VERSION)
        );
    }

    #[test]
    fn test_reopen_with_same_dimension() {
        let temp_dir = TempDir::new().unwrap();
        let db = open(temp_dir.path());
        ensure(&db, 384).unwrap();
        ensure(&db, 384).unwrap();
    }

    #[test]
    fn test_reopen_with_other_dimension_fails() {
        let temp_dir = TempDir::new().unwrap();
        let db = open(temp_dir.path());
        ensure(&db, 384).unwrap();

        match ensure(&db, 256) {
            Err(VectorError::DimensionMismatch { expected, actual }) => {
                assert_eq!(expected, 256);
                assert_eq!(actual, 384);
            }
            other => panic!("expected DimensionMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_future_schema_version_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let db = open(temp_dir.path());
        db.put(SCHEMA_VERSION_KEY, 99u32.to_le_bytes()).unwrap();

        let err = ensure(&db, 384).unwrap_err();
        assert!(err.to_string().contains("Unsupported schema version 99"));
    }

    #[test]
    fn test_corrupt_dimension_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let db = open(temp_dir.path());
        db.put(DIMENSION_KEY, b"abc").unwrap();

        let err = ensure(&db, 384).unwrap_err();
        assert!(matches!(err, VectorError::Parse(_)));
        assert!(err.is_store_io());
    }
}
