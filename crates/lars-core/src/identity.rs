//! # Identifier Newtypes
//!
//! Asset and attachment ids are assigned by the repository backend. Keeping
//! them as distinct types means an attachment id can never be passed where
//! an asset id is expected.

use serde::{Deserialize, Serialize};

/// Backend-assigned identifier of an asset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

/// Backend-assigned identifier of an attachment, unique within its asset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentId(String);

impl AssetId {
    /// Wrap a backend-issued id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Access the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AttachmentId {
    /// Wrap a backend-issued id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Access the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<&str> for AttachmentId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_id_serializes_as_bare_string() {
        let id = AssetId::new("5f1c0de");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"5f1c0de\"");
        let back: AssetId = serde_json::from_str("\"5f1c0de\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn display_is_raw_id() {
        assert_eq!(AttachmentId::from("att-1").to_string(), "att-1");
    }
}
