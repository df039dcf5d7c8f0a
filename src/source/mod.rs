//! Loader: produces a fresh byte stream for script source from a named origin.
//!
//! Four variants, each with its own identity-URI scheme (spec §6):
//! `string://inline/<sha8>`, `file://<abs-path>`, `reader://<name>/<sha8>`,
//! and `http(s)://...`. `open()` is async because the HTTP variant suspends
//! on a network round-trip; the other three resolve immediately but share
//! the same signature so `ExecutableUnit::build` doesn't need to special-case
//! any one of them (spec §4.4 step 1).

mod file;
mod http;
mod inline;
mod reader;

pub use file::FileSource;
pub use http::{HttpAuth, HttpLoaderOptions, HttpSource};
pub use inline::InlineSource;
pub use reader::ReaderSource;

use async_trait::async_trait;
use std::io::Read;

use crate::error::LoaderError;

/// An origin descriptor plus a factory that yields a fresh readable byte
/// stream. Invariant: repeated `open()` calls yield identical bytes for the
/// lifetime of the reference (spec §3).
#[async_trait]
pub trait SourceRef: Send + Sync {
    /// A URI-like identifier for this source, stable across `open()` calls.
    fn origin(&self) -> &str;

    /// Produce a fresh byte stream. The caller fully consumes and closes it.
    async fn open(&self) -> Result<Box<dyn Read + Send>, LoaderError>;
}

/// The four supported loader variants, as a closed enum rather than open
/// trait-object polymorphism — hosts needing a fifth variant implement
/// [`SourceRef`] directly and wrap it in an `Arc<dyn SourceRef>` themselves.
pub enum Loader {
    Inline(InlineSource),
    File(FileSource),
    Reader(ReaderSource),
    Http(HttpSource),
}

impl Loader {
    pub fn from_string(content: impl Into<String>) -> Result<Self, LoaderError> {
        Ok(Loader::Inline(InlineSource::new(content.into())?))
    }

    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, LoaderError> {
        Ok(Loader::File(FileSource::new(path.as_ref())?))
    }

    pub fn from_reader(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, LoaderError> {
        Ok(Loader::Reader(ReaderSource::new(name.into(), bytes)?))
    }

    pub fn from_http(url: impl Into<String>, options: HttpLoaderOptions) -> Result<Self, LoaderError> {
        Ok(Loader::Http(HttpSource::new(url.into(), options)?))
    }
}

#[async_trait]
impl SourceRef for Loader {
    fn origin(&self) -> &str {
        match self {
            Loader::Inline(s) => s.origin(),
            Loader::File(s) => s.origin(),
            Loader::Reader(s) => s.origin(),
            Loader::Http(s) => s.origin(),
        }
    }

    async fn open(&self) -> Result<Box<dyn Read + Send>, LoaderError> {
        match self {
            Loader::Inline(s) => s.open().await,
            Loader::File(s) => s.open().await,
            Loader::Reader(s) => s.open().await,
            Loader::Http(s) => s.open().await,
        }
    }
}

/// Shared helper: first 8 hex chars of SHA-256 over `bytes`, used to build
/// deterministic identity URIs for the inline/reader variants.
pub(crate) fn short_sha256(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(bytes);
    hex::encode(&digest[..4])
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn read_all(stream: Box<dyn Read + Send>) -> Vec<u8> {
        // Loader streams are plain `std::io::Read`; drain them on a blocking
        // thread the way the rest of the pipeline would.
        tokio::task::spawn_blocking(move || {
            let mut s = stream;
            let mut buf = Vec::new();
            std::io::Read::read_to_end(&mut s, &mut buf).unwrap();
            buf
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn inline_open_is_repeatable() {
        let loader = Loader::from_string("name := 1").unwrap();
        let a = read_all(loader.open().await.unwrap()).await;
        let b = read_all(loader.open().await.unwrap()).await;
        assert_eq!(a, b);
        assert_eq!(a, b"name := 1");
    }

    #[tokio::test]
    async fn inline_rejects_empty() {
        assert!(Loader::from_string("").is_err());
        assert!(Loader::from_string("   \n\t  ").is_err());
    }

    #[test]
    fn origin_schemes_are_distinct() {
        let inline = Loader::from_string("x").unwrap();
        assert!(inline.origin().starts_with("string://inline/"));

        let reader = Loader::from_reader("fixture", b"x".to_vec()).unwrap();
        assert!(reader.origin().starts_with("reader://fixture/"));
    }
}
