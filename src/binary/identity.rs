// Mon Oct 19 2026 - Alex

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySource {
    /// `NT_GNU_BUILD_ID` note of an ELF file.
    BuildId,
    /// `LC_UUID` load command of a Mach-O file.
    Uuid,
    ContentHash,
}

/// Stable name of one concrete binary, used to key persisted snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BinaryIdentity {
    pub source: IdentitySource,
    pub value: String,
    pub content_hash: String,
}

impl BinaryIdentity {
    /// Identity from the raw file bytes, preferring a build id embedded by the linker.
    pub fn from_bytes(bytes: &[u8], build_id: Option<String>) -> Self {
        let content_hash = hex::encode(Sha256::digest(bytes));
        match build_id {
            Some(value) if !value.is_empty() => Self {
                source: IdentitySource::BuildId,
                value,
                content_hash,
            },
            _ => Self {
                source: IdentitySource::ContentHash,
                value: content_hash.clone(),
                content_hash,
            },
        }
    }

    pub fn with_source(mut self, source: IdentitySource) -> Self {
        if self.source != IdentitySource::ContentHash {
            self.source = source;
        }
        self
    }

    /// File-system safe key.
    pub fn key(&self) -> String {
        self.value
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect()
    }
}

impl fmt::Display for BinaryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.source {
            IdentitySource::BuildId => "build-id",
            IdentitySource::Uuid => "uuid",
            IdentitySource::ContentHash => "sha256",
        };
        write!(f, "{}:{}", label, self.value)
    }
}
