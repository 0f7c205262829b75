use std::fmt;

use thiserror::Error;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Reasons a piece of input cannot be turned into a [`Message`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("message is empty")]
    EmptyInput,
    #[error("message is not valid UTF-8 (invalid byte at offset {valid_up_to})")]
    InvalidEncoding { valid_up_to: usize },
    #[error("message is {len} bytes, the limit is {limit}")]
    TooLarge { len: usize, limit: usize },
}

/// Raw email text handed to the vectorizer. Never blank.
#[derive(Clone, PartialEq, Eq)]
pub struct Message {
    text: String,
}

impl Message {
    pub fn new(text: impl Into<String>) -> Result<Self, TransformError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(TransformError::EmptyInput);
        }
        Ok(Self { text })
    }

    /// Joins an optional subject line and a body the way the mail is shown to a reader.
    pub fn compose(subject: Option<&str>, body: &str) -> Result<Self, TransformError> {
        match subject.map(str::trim).filter(|s| !s.is_empty()) {
            Some(subject) => Self::new(format!("Subject: {subject}\n{body}")),
            None => Self::new(body),
        }
    }

    /// Decodes an uploaded text file. A leading byte-order mark is dropped.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransformError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let text = std::str::from_utf8(bytes).map_err(|err| TransformError::InvalidEncoding {
            valid_up_to: err.valid_up_to(),
        })?;
        Self::new(text)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn byte_len(&self) -> usize {
        self.text.len()
    }
}

// Mail bodies stay out of logs and panics.
impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message").field("len", &self.text.len()).finish()
    }
}
