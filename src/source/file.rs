use async_trait::async_trait;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::LoaderError;

use super::SourceRef;

/// Script source read from a local file. Only absolute paths are accepted —
/// rejecting relative paths up front avoids ambiguity as the host's working
/// directory changes over the process lifetime (spec §9 Design Note).
pub struct FileSource {
    path: PathBuf,
    origin: String,
}

impl FileSource {
    pub fn new(path: &Path) -> Result<Self, LoaderError> {
        let as_str = path.to_string_lossy();
        if as_str.is_empty() {
            return Err(LoaderError::InputEmpty);
        }
        if let Some((scheme, _)) = as_str.split_once("://") {
            if scheme != "file" {
                return Err(LoaderError::UnsupportedScheme(scheme.to_string()));
            }
        }
        let stripped = as_str.strip_prefix("file://").unwrap_or(&as_str);
        let resolved = PathBuf::from(stripped);
        if !resolved.is_absolute() {
            return Err(LoaderError::UnsupportedScheme(format!(
                "relative path not allowed: {}",
                resolved.display()
            )));
        }
        let origin = format!("file://{}", resolved.display());
        Ok(Self {
            path: resolved,
            origin,
        })
    }
}

#[async_trait]
impl SourceRef for FileSource {
    fn origin(&self) -> &str {
        &self.origin
    }

    async fn open(&self) -> Result<Box<dyn Read + Send>, LoaderError> {
        let path = self.path.clone();
        let bytes = tokio::task::spawn_blocking(move || std::fs::read(&path))
            .await
            .map_err(|e| LoaderError::Io(anyhow::anyhow!(e)))?
            .map_err(|e| LoaderError::Io(anyhow::anyhow!(e)))?;
        Ok(Box::new(std::io::Cursor::new(bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_relative_path() {
        assert!(FileSource::new(Path::new("relative/script.risor")).is_err());
    }

    #[test]
    fn rejects_empty_path() {
        assert!(FileSource::new(Path::new("")).is_err());
    }

    #[test]
    fn rejects_non_file_scheme() {
        assert!(FileSource::new(Path::new("http://example.com/script")).is_err());
    }

    #[test]
    fn accepts_absolute_path() {
        let src = FileSource::new(Path::new("/tmp/script.risor")).unwrap();
        assert_eq!(src.origin(), "file:///tmp/script.risor");
    }
}
