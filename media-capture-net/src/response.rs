use media_capture_core::{AiMetadata, ArtifactKind, CaptureError, UploadReceipt};
use serde::Deserialize;

/// Raw upload response. Which of the optional fields are present depends on
/// the note type, so this shape only exists at the wire boundary; it is
/// folded into the typed [`UploadReceipt`] immediately.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponseDto {
    note_id: String,
    #[serde(default)]
    media_url: Option<String>,
    #[serde(default)]
    file_name: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    file_size: Option<u64>,
    #[serde(default)]
    transcription: Option<String>,
    #[serde(default)]
    image_label: Option<String>,
}

/// Parses a 2xx body into the receipt for the uploaded note type. A
/// malformed body counts as a server failure.
pub(crate) fn parse_receipt(kind: ArtifactKind, body: &str) -> Result<UploadReceipt, CaptureError> {
    let dto: UploadResponseDto =
        serde_json::from_str(body).map_err(|e| CaptureError::ServerError {
            status: 200,
            message: format!("malformed upload response: {}", e),
        })?;

    let ai = match kind {
        ArtifactKind::Photo => AiMetadata::Photo {
            label: dto.image_label.unwrap_or_default(),
        },
        ArtifactKind::Video => AiMetadata::Video {
            transcription: dto.transcription.unwrap_or_default(),
        },
        ArtifactKind::Audio => AiMetadata::Text,
    };

    Ok(UploadReceipt {
        note_id: dto.note_id,
        media_url: dto.media_url,
        file_name: dto.file_name.unwrap_or_default(),
        mime_type: dto.mime_type.unwrap_or_default(),
        file_size: dto.file_size.unwrap_or_default(),
        ai,
    })
}

/// Maps a non-success status to the error taxonomy. 401 stays
/// distinguishable from generic server failures so callers can prompt
/// re-authentication instead of retrying blindly.
pub(crate) fn classify_failure(status: u16, body: &str) -> CaptureError {
    if status == 401 {
        return CaptureError::AuthExpired;
    }
    CaptureError::ServerError {
        status,
        message: extract_message(body),
    }
}

/// Best-effort human-readable message from an error body.
fn extract_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error", "detail"] {
            if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
                return message.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no response body".to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn photo_receipt_carries_the_label() {
        let body = r#"{
            "noteId": "n-17",
            "mediaUrl": "https://cdn/x.jpg",
            "fileName": "x.jpg",
            "mimeType": "image/jpeg",
            "fileSize": 1234,
            "imageLabel": "rusted railing"
        }"#;
        let receipt = parse_receipt(ArtifactKind::Photo, body).unwrap();
        assert_eq!(receipt.note_id, "n-17");
        assert_eq!(
            receipt.ai,
            AiMetadata::Photo {
                label: "rusted railing".into()
            }
        );
        assert_eq!(receipt.file_size, 1234);
    }

    #[test]
    fn video_receipt_carries_the_transcription() {
        let body = r#"{"noteId": "n-2", "transcription": "leak near the window"}"#;
        let receipt = parse_receipt(ArtifactKind::Video, body).unwrap();
        assert_eq!(
            receipt.ai,
            AiMetadata::Video {
                transcription: "leak near the window".into()
            }
        );
        // Fields absent for this note type default instead of failing.
        assert!(receipt.media_url.is_none());
        assert_eq!(receipt.file_name, "");
    }

    #[test]
    fn absent_ai_fields_default_to_empty() {
        let body = r#"{"noteId": "n-3"}"#;
        let receipt = parse_receipt(ArtifactKind::Photo, body).unwrap();
        assert_eq!(receipt.ai, AiMetadata::Photo { label: String::new() });
    }

    #[test]
    fn malformed_body_is_a_server_error() {
        let err = parse_receipt(ArtifactKind::Photo, "<html>gateway</html>").unwrap_err();
        match err {
            CaptureError::ServerError { message, .. } => {
                assert!(message.contains("malformed"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn unauthorized_is_auth_expired() {
        assert_eq!(classify_failure(401, ""), CaptureError::AuthExpired);
    }

    #[test]
    fn server_failure_extracts_json_message() {
        let err = classify_failure(500, r#"{"message": "database unavailable"}"#);
        assert_eq!(
            err,
            CaptureError::ServerError {
                status: 500,
                message: "database unavailable".into()
            }
        );
    }

    #[test]
    fn server_failure_falls_back_to_raw_body() {
        let err = classify_failure(502, "Bad Gateway");
        assert_eq!(
            err,
            CaptureError::ServerError {
                status: 502,
                message: "Bad Gateway".into()
            }
        );
    }

    #[test]
    fn empty_error_body_gets_a_placeholder() {
        match classify_failure(503, "") {
            CaptureError::ServerError { message, .. } => {
                assert_eq!(message, "no response body");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
