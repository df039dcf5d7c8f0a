use async_trait::async_trait;
use std::io::{Cursor, Read};

use crate::error::LoaderError;

use super::{short_sha256, SourceRef};

/// Script source held directly as a string, e.g. for tests or scripts built
/// by the host at runtime rather than loaded from disk or the network.
pub struct InlineSource {
    content: String,
    origin: String,
}

impl InlineSource {
    pub fn new(content: String) -> Result<Self, LoaderError> {
        if content.trim().is_empty() {
            return Err(LoaderError::InputEmpty);
        }
        let origin = format!("string://inline/{}", short_sha256(content.as_bytes()));
        Ok(Self { content, origin })
    }
}

#[async_trait]
impl SourceRef for InlineSource {
    fn origin(&self) -> &str {
        &self.origin
    }

    async fn open(&self) -> Result<Box<dyn Read + Send>, LoaderError> {
        Ok(Box::new(Cursor::new(self.content.clone().into_bytes())))
    }
}
