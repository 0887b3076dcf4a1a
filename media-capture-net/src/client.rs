use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use media_capture_core::{
    AuthTokenProvider, CaptureError, MediaArtifact, NoteBackend, NoteDetails, ProgressSink,
    Transcriber, UploadReceipt, UploadRequest,
};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use serde::Serialize;

use crate::progress::ProgressReader;
use crate::response::{classify_failure, parse_receipt};

const UPLOAD_PATH: &str = "/api/notes/media";
const DETAILS_PATH: &str = "/api/notes/details";
const TRANSCRIBE_PATH: &str = "/api/transcribe";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Update-details wire body. The endpoint accepts user fields only; AI
/// output is not representable here.
#[derive(Debug, Serialize)]
struct UpdateDetailsDto<'a> {
    #[serde(rename = "noteId")]
    note_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    kommentar: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delomrade: Option<&'a str>,
}

/// Blocking HTTP implementation of the core's note-persistence and
/// transcription collaborators.
///
/// Streams uploads as multipart bodies with byte-level progress, attaches
/// the bearer credential from the auth collaborator, and classifies
/// failures into the typed taxonomy (401 → `AuthExpired`, 5xx/malformed →
/// `ServerError`, transport → `NetworkError`). Never retries on its own.
pub struct NoteApiClient {
    base_url: String,
    http: Client,
    auth: Arc<dyn AuthTokenProvider>,
}

impl NoteApiClient {
    pub fn new(
        base_url: impl Into<String>,
        auth: Arc<dyn AuthTokenProvider>,
    ) -> Result<Self, CaptureError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| CaptureError::NetworkError(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            base_url,
            http,
            auth,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl NoteBackend for NoteApiClient {
    fn upload(
        &self,
        request: &UploadRequest<'_>,
        progress: ProgressSink,
    ) -> Result<UploadReceipt, CaptureError> {
        let token = self.auth.bearer_token()?;
        let artifact = request.artifact;
        let total = artifact.len();

        // The counting reader drives progress from bytes actually handed to
        // the transport.
        let reader = ProgressReader::new(Cursor::new(artifact.data().clone()), total, progress);
        let part = Part::reader_with_length(reader, total)
            .file_name(artifact.file_name())
            .mime_str(artifact.mime_type())
            .map_err(|e| CaptureError::NetworkError(e.to_string()))?;

        let mut form = Form::new()
            .part("file", part)
            .text("projectId", request.project_id.to_string())
            .text("noteType", artifact.kind().as_str());
        if let Some(subarea) = request.subarea_id {
            form = form.text("delomrade", subarea.to_string());
        }

        debug!(
            "uploading {} bytes ({}) to {}",
            total,
            artifact.mime_type(),
            self.endpoint(UPLOAD_PATH)
        );
        let response = self
            .http
            .post(self.endpoint(UPLOAD_PATH))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .map_err(|e| CaptureError::NetworkError(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| CaptureError::NetworkError(e.to_string()))?;
        if !(200..300).contains(&status) {
            return Err(classify_failure(status, &body));
        }

        let receipt = parse_receipt(artifact.kind(), &body)?;
        info!("upload complete: note {}", receipt.note_id);
        Ok(receipt)
    }

    fn update_details(&self, note_id: &str, details: &NoteDetails) -> Result<(), CaptureError> {
        let token = self.auth.bearer_token()?;
        let body = UpdateDetailsDto {
            note_id,
            kommentar: details.comment.as_deref(),
            delomrade: details.subarea.as_deref(),
        };

        let response = self
            .http
            .post(self.endpoint(DETAILS_PATH))
            .bearer_auth(token)
            .json(&body)
            .send()
            .map_err(|e| CaptureError::NetworkError(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let text = response.text().unwrap_or_default();
            return Err(classify_failure(status, &text));
        }
        debug!("details updated for note {}", note_id);
        Ok(())
    }
}

impl Transcriber for NoteApiClient {
    fn transcribe(&self, artifact: &MediaArtifact) -> Result<String, CaptureError> {
        let token = self.auth.bearer_token()?;

        let part = Part::bytes(artifact.data().to_vec())
            .file_name(artifact.file_name())
            .mime_str(artifact.mime_type())
            .map_err(|e| CaptureError::TranscriptionFailed(e.to_string()))?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(self.endpoint(TRANSCRIBE_PATH))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .map_err(|e| CaptureError::NetworkError(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| CaptureError::NetworkError(e.to_string()))?;
        if status == 401 {
            return Err(CaptureError::AuthExpired);
        }
        if !(200..300).contains(&status) {
            return Err(CaptureError::TranscriptionFailed(format!(
                "status {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }
        Ok(body.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use media_capture_core::sim::SimAuth;
    use media_capture_core::ArtifactKind;
    use parking_lot::Mutex;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack
            .windows(needle.len())
            .position(|window| window == needle)
    }

    /// Reads one HTTP request, honoring Content-Length or a chunked
    /// terminator.
    fn read_request(stream: &mut TcpStream) -> Vec<u8> {
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let mut buf = Vec::new();
        let mut tmp = [0u8; 8192];
        loop {
            let n = match stream.read(&mut tmp) {
                Ok(0) => break,
                Ok(n) => n,
                Err(_) => break,
            };
            buf.extend_from_slice(&tmp[..n]);
            if let Some(pos) = find_subslice(&buf, b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buf[..pos]).to_ascii_lowercase();
                let content_length = headers.lines().find_map(|line| {
                    line.strip_prefix("content-length:")
                        .and_then(|v| v.trim().parse::<usize>().ok())
                });
                match content_length {
                    Some(len) if buf.len() >= pos + 4 + len => break,
                    None if buf.ends_with(b"0\r\n\r\n") => break,
                    _ => {}
                }
            }
        }
        buf
    }

    /// Serves exactly one canned response and hands back the raw request.
    fn serve_once(
        status_line: &'static str,
        content_type: &'static str,
        body: &'static str,
    ) -> (String, thread::JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                content_type,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            let _ = stream.flush();
            request
        });
        (format!("http://{}", addr), handle)
    }

    fn client(base_url: &str) -> NoteApiClient {
        NoteApiClient::new(base_url, Arc::new(SimAuth::signed_in())).unwrap()
    }

    fn photo_artifact() -> MediaArtifact {
        MediaArtifact::new(
            ArtifactKind::Photo,
            "image/jpeg",
            Bytes::from(vec![0xAB; 4096]),
        )
    }

    #[test]
    fn upload_round_trip() {
        let (base_url, server) = serve_once(
            "200 OK",
            "application/json",
            r#"{"noteId": "n-9", "mediaUrl": "https://cdn/n-9.jpg", "imageLabel": "broken tile"}"#,
        );
        let artifact = photo_artifact();
        let request = UploadRequest {
            artifact: &artifact,
            project_id: "project-7",
            subarea_id: Some("basement"),
        };

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink: ProgressSink = {
            let seen = Arc::clone(&seen);
            Arc::new(move |f| seen.lock().push(f))
        };
        let receipt = client(&base_url).upload(&request, sink).unwrap();

        assert_eq!(receipt.note_id, "n-9");
        assert_eq!(receipt.ai.image_label(), Some("broken tile"));

        let seen = seen.lock();
        assert!(seen.windows(2).all(|pair| pair[1] >= pair[0]));
        assert_eq!(*seen.last().unwrap(), 1.0);

        let raw = server.join().unwrap();
        let text = String::from_utf8_lossy(&raw);
        assert!(text.contains("POST /api/notes/media"));
        assert!(text
            .to_ascii_lowercase()
            .contains("authorization: bearer sim-bearer-token"));
        assert!(text.contains("name=\"projectId\""));
        assert!(text.contains("project-7"));
        assert!(text.contains("name=\"noteType\""));
        assert!(text.contains("photo"));
        assert!(text.contains("name=\"delomrade\""));
        assert!(text.contains("basement"));
        assert!(text.contains("image/jpeg"));
    }

    #[test]
    fn unauthorized_upload_is_auth_expired() {
        let (base_url, server) = serve_once("401 Unauthorized", "application/json", "{}");
        let artifact = photo_artifact();
        let request = UploadRequest {
            artifact: &artifact,
            project_id: "p",
            subarea_id: None,
        };

        let err = client(&base_url)
            .upload(&request, Arc::new(|_| {}))
            .unwrap_err();
        assert_eq!(err, CaptureError::AuthExpired);
        server.join().unwrap();
    }

    #[test]
    fn server_failure_carries_the_message() {
        let (base_url, server) = serve_once(
            "500 Internal Server Error",
            "application/json",
            r#"{"message": "storage offline"}"#,
        );
        let artifact = photo_artifact();
        let request = UploadRequest {
            artifact: &artifact,
            project_id: "p",
            subarea_id: None,
        };

        let err = client(&base_url)
            .upload(&request, Arc::new(|_| {}))
            .unwrap_err();
        assert_eq!(
            err,
            CaptureError::ServerError {
                status: 500,
                message: "storage offline".into()
            }
        );
        server.join().unwrap();
    }

    #[test]
    fn malformed_success_body_is_a_server_error() {
        let (base_url, server) = serve_once("200 OK", "text/html", "<html>proxy page</html>");
        let artifact = photo_artifact();
        let request = UploadRequest {
            artifact: &artifact,
            project_id: "p",
            subarea_id: None,
        };

        let err = client(&base_url)
            .upload(&request, Arc::new(|_| {}))
            .unwrap_err();
        assert!(matches!(err, CaptureError::ServerError { .. }));
        server.join().unwrap();
    }

    #[test]
    fn refused_connection_is_a_network_error() {
        // Bind then drop, so the port is closed.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let artifact = photo_artifact();
        let request = UploadRequest {
            artifact: &artifact,
            project_id: "p",
            subarea_id: None,
        };

        let err = client(&format!("http://127.0.0.1:{}", port))
            .upload(&request, Arc::new(|_| {}))
            .unwrap_err();
        assert!(matches!(err, CaptureError::NetworkError(_)));
    }

    #[test]
    fn update_details_posts_user_fields_only() {
        let (base_url, server) = serve_once("200 OK", "application/json", "{}");
        let details = NoteDetails {
            comment: Some("repainted in 2024".into()),
            subarea: Some("facade".into()),
        };

        client(&base_url).update_details("n-4", &details).unwrap();

        let raw = server.join().unwrap();
        let text = String::from_utf8_lossy(&raw);
        assert!(text.contains("POST /api/notes/details"));
        let body_start = find_subslice(&raw, b"\r\n\r\n").unwrap() + 4;
        let body: serde_json::Value = serde_json::from_slice(&raw[body_start..]).unwrap();
        assert_eq!(body["noteId"], "n-4");
        assert_eq!(body["kommentar"], "repainted in 2024");
        assert_eq!(body["delomrade"], "facade");
        // The wire shape has no AI fields at all.
        assert!(body.get("transcription").is_none());
        assert!(body.get("imageLabel").is_none());
    }

    #[test]
    fn transcribe_returns_plain_text() {
        let (base_url, server) = serve_once("200 OK", "text/plain", "damp smell in the hallway\n");
        let artifact = MediaArtifact::new(
            ArtifactKind::Audio,
            "audio/webm",
            Bytes::from(vec![0u8; 256]),
        );

        let text = client(&base_url).transcribe(&artifact).unwrap();
        assert_eq!(text, "damp smell in the hallway");

        let raw = server.join().unwrap();
        let request_text = String::from_utf8_lossy(&raw);
        assert!(request_text.contains("POST /api/transcribe"));
        assert!(request_text.contains("audio/webm"));
    }

    #[test]
    fn transcription_http_failure_is_recoverable() {
        let (base_url, server) = serve_once("503 Service Unavailable", "text/plain", "busy");
        let artifact = MediaArtifact::new(
            ArtifactKind::Audio,
            "audio/webm",
            Bytes::from(vec![0u8; 256]),
        );

        let err = client(&base_url).transcribe(&artifact).unwrap_err();
        assert!(matches!(err, CaptureError::TranscriptionFailed(_)));
        assert!(err.is_recoverable());
        server.join().unwrap();
    }

    #[test]
    fn signed_out_client_never_reaches_the_wire() {
        let client = NoteApiClient::new(
            "http://127.0.0.1:1", // unroutable on purpose; must not be contacted
            Arc::new(SimAuth::signed_out()),
        )
        .unwrap();
        let artifact = photo_artifact();
        let request = UploadRequest {
            artifact: &artifact,
            project_id: "p",
            subarea_id: None,
        };

        let err = client.upload(&request, Arc::new(|_| {})).unwrap_err();
        assert_eq!(err, CaptureError::AuthRequired);
    }
}
