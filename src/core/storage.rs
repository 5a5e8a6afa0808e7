use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use uuid::Uuid;

use crate::core::config::StorageConfig;
use crate::core::AppError;

/// Local-disk blob store. The engine only ever sees the relative
/// `file_path` it hands back; resource rows store that path plus the
/// file metadata.
pub struct BlobStore {
    root: PathBuf,
    max_file_size: usize,
}

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub file_path: String,
    pub file_name: String,
    pub file_size: i64,
    pub mime_type: String,
}

impl BlobStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: PathBuf::from(&config.root_dir),
            max_file_size: config.max_file_size_mb * 1024 * 1024,
        }
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    pub fn put_file(
        &self,
        owner_id: Uuid,
        original_name: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<StoredFile, AppError> {
        if bytes.len() > self.max_file_size {
            return Err(AppError::invalid_operation(format!(
                "File size exceeds maximum limit ({}MB)",
                self.max_file_size / (1024 * 1024)
            )));
        }

        let owner_dir = self.root.join(owner_id.to_string());
        fs::create_dir_all(&owner_dir).map_err(AppError::storage_error)?;

        let file_extension = Path::new(original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("bin");
        let unique_filename = format!(
            "{}_{}.{}",
            Uuid::new_v4(),
            chrono::Utc::now().timestamp(),
            file_extension
        );

        let full_path = owner_dir.join(&unique_filename);
        let mut file = fs::File::create(&full_path).map_err(AppError::storage_error)?;
        file.write_all(bytes).map_err(|e| {
            // Half-written blobs must not leak into the store
            let _ = fs::remove_file(&full_path);
            AppError::storage_error(e)
        })?;

        Ok(StoredFile {
            file_path: format!("{}/{}", owner_id, unique_filename),
            file_name: original_name.to_string(),
            file_size: bytes.len() as i64,
            mime_type: mime_type.to_string(),
        })
    }

    pub fn get_file(&self, file_path: &str) -> Result<Vec<u8>, AppError> {
        let relative = Path::new(file_path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(AppError::not_found("File not found"));
        }

        fs::read(self.root.join(relative)).map_err(|e| {
            tracing::error!("Failed to read blob {}: {:?}", file_path, e);
            AppError::storage_error(e)
        })
    }

    pub fn remove_file(&self, file_path: &str) {
        let _ = fs::remove_file(self.root.join(file_path));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claim::{assert_err, assert_ok};

    fn temp_store() -> BlobStore {
        let dir = std::env::temp_dir().join(format!("study_vault_test_{}", Uuid::new_v4()));
        BlobStore {
            root: dir,
            max_file_size: 1024,
        }
    }

    #[test]
    fn put_then_get_round_trips_bytes() {
        let store = temp_store();
        let stored = assert_ok!(store.put_file(
            Uuid::new_v4(),
            "notes.pdf",
            "application/pdf",
            b"hello"
        ));
        assert_eq!(stored.file_name, "notes.pdf");
        assert_eq!(stored.file_size, 5);
        let bytes = assert_ok!(store.get_file(&stored.file_path));
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn oversized_file_is_rejected_before_write() {
        let store = temp_store();
        let bytes = vec![0u8; 2048];
        assert_err!(store.put_file(Uuid::new_v4(), "big.bin", "application/octet-stream", &bytes));
    }

    #[test]
    fn arbitrary_binary_content_survives_storage() {
        use rand::Rng;

        let store = temp_store();
        let mut rng = rand::thread_rng();
        let bytes: Vec<u8> = (0..512).map(|_| rng.gen()).collect();

        let stored = assert_ok!(store.put_file(
            Uuid::new_v4(),
            "scan.pdf",
            "application/pdf",
            &bytes
        ));
        assert_eq!(assert_ok!(store.get_file(&stored.file_path)), bytes);
    }

    #[test]
    fn path_traversal_is_rejected() {
        let store = temp_store();
        assert_err!(store.get_file("../../etc/passwd"));
    }

    #[test]
    fn remove_makes_file_unreadable() {
        let store = temp_store();
        let stored = assert_ok!(store.put_file(
            Uuid::new_v4(),
            "notes.txt",
            "text/plain",
            b"bye"
        ));
        store.remove_file(&stored.file_path);
        assert_err!(store.get_file(&stored.file_path));
    }
}
