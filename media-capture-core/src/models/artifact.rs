use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Kind of media an artifact contains. Doubles as the destination note type
/// on upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Photo,
    Video,
    Audio,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

/// A finalized binary media buffer.
///
/// Immutable once constructed: the payload is a shared `Bytes` buffer and no
/// mutators exist, so a handle given to the upload path can never see
/// further writes. Compression produces a *new* artifact rather than
/// touching the original.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaArtifact {
    id: Uuid,
    kind: ArtifactKind,
    mime_type: String,
    data: Bytes,
    checksum: String,
    created_at: DateTime<Utc>,
}

impl MediaArtifact {
    pub fn new(kind: ArtifactKind, mime_type: impl Into<String>, data: Bytes) -> Self {
        let checksum = sha256_hex(&data);
        Self {
            id: Uuid::new_v4(),
            kind,
            mime_type: mime_type.into(),
            data,
            checksum,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// SHA-256 hex digest of the payload, computed at finalization.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Stable file name used for the multipart upload part.
    pub fn file_name(&self) -> String {
        format!("{}_{}.{}", self.kind.as_str(), self.id, self.extension())
    }

    fn extension(&self) -> &'static str {
        // The subtype after any codec parameters, mapped to the usual file
        // extension.
        match self.mime_type.split(';').next().unwrap_or_default() {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "video/mp4" => "mp4",
            "video/webm" => "webm",
            "audio/webm" => "weba",
            "audio/wav" | "audio/x-wav" => "wav",
            "audio/mpeg" | "audio/mp3" => "mp3",
            _ => "bin",
        }
    }
}

fn sha256_hex(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_is_sha256_hex() {
        let artifact = MediaArtifact::new(
            ArtifactKind::Photo,
            "image/jpeg",
            Bytes::from_static(b"abc"),
        );
        // Known SHA-256 of "abc".
        assert_eq!(
            artifact.checksum(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn clone_shares_payload() {
        let artifact = MediaArtifact::new(
            ArtifactKind::Video,
            "video/webm",
            Bytes::from(vec![0u8; 1024]),
        );
        let copy = artifact.clone();
        assert_eq!(copy.len(), 1024);
        assert_eq!(copy.checksum(), artifact.checksum());
        assert_eq!(copy.id(), artifact.id());
    }

    #[test]
    fn file_name_reflects_kind_and_mime() {
        let artifact = MediaArtifact::new(
            ArtifactKind::Photo,
            "image/jpeg",
            Bytes::from_static(b"x"),
        );
        let name = artifact.file_name();
        assert!(name.starts_with("photo_"));
        assert!(name.ends_with(".jpg"));
    }

    #[test]
    fn codec_parameters_ignored_for_extension() {
        let artifact = MediaArtifact::new(
            ArtifactKind::Video,
            "video/webm;codecs=vp9",
            Bytes::from_static(b"x"),
        );
        assert!(artifact.file_name().ends_with(".webm"));
    }

    #[test]
    fn empty_artifact() {
        let artifact = MediaArtifact::new(ArtifactKind::Audio, "audio/webm", Bytes::new());
        assert!(artifact.is_empty());
        assert_eq!(artifact.len(), 0);
    }
}
