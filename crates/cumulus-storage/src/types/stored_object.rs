//! Retrieved objects and upload options.

use bytes::Bytes;

/// An object retrieved from a bucket. Relayed to the caller, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Key the object was stored under.
    pub key: String,
    /// Raw bytes of the object.
    pub data: Bytes,
    /// Declared length of the object, if the backend reports one.
    pub content_length: Option<u64>,
    /// MIME content-type, if the backend reports one.
    pub content_type: Option<String>,
}

impl StoredObject {
    /// Creates an object whose declared length is the payload length.
    pub fn new(key: impl Into<String>, data: Bytes) -> Self {
        let content_length = Some(data.len() as u64);
        Self {
            key: key.into(),
            data,
            content_length,
            content_type: None,
        }
    }

    /// Attaches a content-type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Returns a byte-slice view of the payload.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Options applied to a single upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutOptions {
    /// Request server-side encryption with the store's managed key.
    pub encrypted: bool,
    /// Length declared to the receiving store.
    pub content_length: Option<u64>,
    /// MIME content-type stored with the object.
    pub content_type: Option<String>,
}

impl PutOptions {
    /// Options for an encrypted upload.
    pub fn encrypted() -> Self {
        Self {
            encrypted: true,
            ..Self::default()
        }
    }

    /// Options carrying the metadata of an object being relayed.
    pub fn relay(object: &StoredObject) -> Self {
        Self {
            encrypted: false,
            content_length: object.content_length,
            content_type: object.content_type.clone(),
        }
    }
}
