use async_trait::async_trait;
use std::io::{Cursor, Read};

use crate::error::LoaderError;

use super::{short_sha256, SourceRef};

/// Script source held as raw bytes under a caller-supplied name — the
/// in-memory-reader loader variant (spec §4.1).
pub struct ReaderSource {
    bytes: Vec<u8>,
    origin: String,
}

impl ReaderSource {
    pub fn new(name: String, bytes: Vec<u8>) -> Result<Self, LoaderError> {
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(LoaderError::InputEmpty);
        }
        let origin = format!("reader://{}/{}", name, short_sha256(&bytes));
        Ok(Self { bytes, origin })
    }
}

#[async_trait]
impl SourceRef for ReaderSource {
    fn origin(&self) -> &str {
        &self.origin
    }

    async fn open(&self) -> Result<Box<dyn Read + Send>, LoaderError> {
        Ok(Box::new(Cursor::new(self.bytes.clone())))
    }
}
