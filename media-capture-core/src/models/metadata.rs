use serde::{Deserialize, Serialize};

/// AI-generated metadata returned by the backend, tagged per note type.
///
/// Write-once: captured from the upload response and never altered
/// afterwards. Which variant applies depends on the note type, so absent
/// fields are impossible to observe rather than `None`-checked everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AiMetadata {
    Photo { label: String },
    Video { transcription: String },
    Text,
}

impl AiMetadata {
    /// The default text a user starts editing from.
    pub fn seed_comment(&self) -> &str {
        match self {
            Self::Photo { label } => label,
            Self::Video { transcription } => transcription,
            Self::Text => "",
        }
    }

    pub fn image_label(&self) -> Option<&str> {
        match self {
            Self::Photo { label } => Some(label),
            _ => None,
        }
    }

    pub fn transcription(&self) -> Option<&str> {
        match self {
            Self::Video { transcription } => Some(transcription),
            _ => None,
        }
    }
}

/// Note-level metadata: write-once AI output plus user-editable fields.
///
/// The AI fields live behind read accessors with no mutators; every edit
/// path goes through `user_comment`/`user_subarea`, so the original AI
/// output stays queryable no matter how often the visible comment changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteMetadata {
    note_id: String,
    media_url: Option<String>,
    ai: AiMetadata,
    user_comment: String,
    user_subarea: Option<String>,
}

impl NoteMetadata {
    /// Builds the editable note from a fresh upload response, pre-seeding
    /// the comment from the AI output as a convenience default.
    pub fn new(note_id: impl Into<String>, media_url: Option<String>, ai: AiMetadata) -> Self {
        let user_comment = ai.seed_comment().to_string();
        Self {
            note_id: note_id.into(),
            media_url,
            ai,
            user_comment,
            user_subarea: None,
        }
    }

    pub fn note_id(&self) -> &str {
        &self.note_id
    }

    pub fn media_url(&self) -> Option<&str> {
        self.media_url.as_deref()
    }

    /// The original AI output, unaffected by user edits.
    pub fn ai(&self) -> &AiMetadata {
        &self.ai
    }

    pub fn user_comment(&self) -> &str {
        &self.user_comment
    }

    pub fn user_subarea(&self) -> Option<&str> {
        self.user_subarea.as_deref()
    }

    pub fn set_comment(&mut self, text: impl Into<String>) {
        self.user_comment = text.into();
    }

    pub fn set_subarea(&mut self, subarea: Option<String>) {
        self.user_subarea = subarea;
    }

    /// Appends a voice-note transcription to the comment, separated by a
    /// blank line. Multiple voice notes accumulate; existing text is never
    /// replaced.
    pub fn append_voice_transcription(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if self.user_comment.is_empty() {
            self.user_comment = text.to_string();
        } else {
            self.user_comment = format!("{}\n\n{}", self.user_comment, text);
        }
    }
}
