use crate::spreadsheet::{SpreadsheetError, SpreadsheetFormat};
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Directory holding uploaded spreadsheets between the upload and preview
/// steps of an import.
///
/// Each file is stored as `<uuid>.<ext>` and that file name is handed to the
/// client as its `fileToken`. Tokens are checked against a strict pattern
/// before they touch the filesystem, so a token can never address anything
/// outside this directory.
#[derive(Debug, Clone)]
pub struct UploadDir {
    root: PathBuf,
}

impl UploadDir {
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Reserves a token for an upload named `original_name` and returns it
    /// with the path the bytes should be written to.
    pub fn reserve(&self, original_name: &str) -> Result<(String, PathBuf), SpreadsheetError> {
        let extension = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        SpreadsheetFormat::from_extension(&extension)?;

        let token = format!("{}.{}", Uuid::new_v4().simple(), extension);
        let path = self.root.join(&token);
        Ok((token, path))
    }

    /// Path of the stored upload named by `token`.
    pub fn resolve(&self, token: &str) -> Result<PathBuf, SpreadsheetError> {
        if !token_pattern()?.is_match(token) {
            return Err(SpreadsheetError::InvalidToken);
        }
        let path = self.root.join(token);
        if !path.is_file() {
            return Err(SpreadsheetError::UnknownToken);
        }
        Ok(path)
    }

    /// Removes a stored upload. Missing files are not an error.
    pub fn discard(&self, path: &Path) {
        if let Err(e) = fs::remove_file(path) {
            if e.kind() != io::ErrorKind::NotFound {
                log::warn!("could not remove upload {}: {}", path.display(), e);
            }
        }
    }
}

fn token_pattern() -> Result<Regex, SpreadsheetError> {
    let pattern = format!(
        r"^[0-9a-f]{{32}}\.({})$",
        SpreadsheetFormat::EXTENSIONS.join("|")
    );
    Regex::new(&pattern).map_err(|e| io::Error::other(format!("Regex error: {}", e)).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn reserved_tokens_resolve_once_written() {
        let dir = TempDir::new().unwrap();
        let uploads = UploadDir::open(dir.path().join("uploads")).unwrap();

        let (token, path) = uploads.reserve("Leads March.XLSX").unwrap();
        assert!(token.ends_with(".xlsx"));
        assert_eq!(token.len(), 32 + ".xlsx".len());
        assert!(matches!(
            uploads.resolve(&token),
            Err(SpreadsheetError::UnknownToken)
        ));

        fs::write(&path, b"placeholder").unwrap();
        assert_eq!(uploads.resolve(&token).unwrap(), path);

        uploads.discard(&path);
        assert!(!path.exists());
    }

    #[test]
    fn unsupported_uploads_get_no_token() {
        let dir = TempDir::new().unwrap();
        let uploads = UploadDir::open(dir.path()).unwrap();
        assert!(matches!(
            uploads.reserve("notes.docx"),
            Err(SpreadsheetError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            uploads.reserve("no_extension"),
            Err(SpreadsheetError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn malformed_tokens_are_refused_before_touching_disk() {
        let dir = TempDir::new().unwrap();
        let uploads = UploadDir::open(dir.path()).unwrap();
        for token in [
            "../leads.sqlite",
            "0123456789abcdef0123456789abcdef.exe",
            "0123456789ABCDEF0123456789ABCDEF.csv",
            "",
        ] {
            assert!(
                matches!(uploads.resolve(token), Err(SpreadsheetError::InvalidToken)),
                "token {token:?} should be invalid"
            );
        }
    }
}
