use std::sync::Arc;

use serde::Serialize;

use crate::models::artifact::MediaArtifact;
use crate::models::error::CaptureError;
use crate::models::metadata::AiMetadata;

/// Byte-level upload progress sink, reported as a fraction in 0.0..=1.0.
pub type ProgressSink = Arc<dyn Fn(f32) + Send + Sync>;

/// Everything the backend needs to create a media note.
#[derive(Debug)]
pub struct UploadRequest<'a> {
    pub artifact: &'a MediaArtifact,
    pub project_id: &'a str,
    /// Optional subsection the note belongs to.
    pub subarea_id: Option<&'a str>,
}

/// Receipt returned by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub note_id: String,
    pub media_url: Option<String>,
    pub file_name: String,
    pub mime_type: String,
    pub file_size: u64,
    /// AI output for this note type, parsed into the matching variant.
    pub ai: AiMetadata,
}

/// User-editable fields accepted by the update endpoint.
///
/// AI fields are deliberately not representable here, so the update path
/// structurally cannot overwrite them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NoteDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subarea: Option<String>,
}

/// Note persistence collaborator.
///
/// `upload` performs no automatic retry: the server may have partially
/// applied a failed request (a duplicate note), so retrying is always an
/// explicit caller decision.
pub trait NoteBackend: Send + Sync {
    fn upload(
        &self,
        request: &UploadRequest<'_>,
        progress: ProgressSink,
    ) -> Result<UploadReceipt, CaptureError>;

    fn update_details(&self, note_id: &str, details: &NoteDetails) -> Result<(), CaptureError>;
}

/// Speech-to-text collaborator for voice notes.
pub trait Transcriber: Send + Sync {
    fn transcribe(&self, artifact: &MediaArtifact) -> Result<String, CaptureError>;
}

/// Credential collaborator. A missing credential surfaces as
/// [`CaptureError::AuthRequired`] before any upload attempt starts.
pub trait AuthTokenProvider: Send + Sync {
    fn bearer_token(&self) -> Result<String, CaptureError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn details_serialize_sparsely() {
        let details = NoteDetails {
            comment: Some("ok".into()),
            subarea: None,
        };
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["comment"], "ok");
        assert!(json.get("subarea").is_none());
    }
}
