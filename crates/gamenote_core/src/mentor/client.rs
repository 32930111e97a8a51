//! Mentor client: credential gate, transport and response decoding.
//!
//! # Responsibility
//! - Refuse to call the endpoint without a usable API key.
//! - Send feedback/chat requests and decode `candidates[0]` text.
//! - Map upstream failures onto [`MentorError`].
//! - Reject a second request for the same target while one is outstanding.
//!
//! # Invariants
//! - The transport is never invoked when the key is missing or a placeholder.
//! - The API key is never logged.
//! - No timeout is configured; the transport default applies.

use super::prompt::{build_chat_request, build_feedback_request, GenerateRequest, Part};
use super::response::{parse_mentor_response, ParsedMentorResponse};
use crate::config::MentorSettings;
use crate::model::chat::ChatMessage;
use crate::model::note::{Note, NoteId};
use log::{error, info, warn};
use serde::Deserialize;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Mutex;
use std::time::Instant;

/// Values shipped in sample configs that are not real keys.
const PLACEHOLDER_KEYS: &[&str] = &[
    "YOUR_API_KEY",
    "YOUR_GEMINI_API_KEY",
    "SUA_API_KEY_AQUI",
    "SUA_CHAVE_AQUI",
    "CHANGE_ME",
];

/// Identity of an outstanding request, used by the in-flight guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKey {
    Feedback(NoteId),
    Chat,
}

impl Display for RequestKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Feedback(id) => write!(f, "feedback:{id}"),
            Self::Chat => write!(f, "chat"),
        }
    }
}

/// Mentor feature errors. All are recoverable; the user may retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MentorError {
    /// Missing or placeholder API key. Scoped to the mentor feature.
    Configuration(String),
    /// Non-success HTTP status, with the upstream message when available.
    Api { status: u16, message: Option<String> },
    /// Success status but no text at `candidates[0].content.parts[0].text`.
    EmptyResponse,
    /// Success status but the body is not a `generateContent` response.
    InvalidResponse(String),
    /// Network or client construction failure.
    Transport(String),
    /// A request for the same target is still outstanding.
    AlreadyInFlight(RequestKey),
}

impl MentorError {
    /// Message shown inline in the mentor panel.
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration(_) => {
                "Configure sua chave da API do Gemini para usar o mentor.".to_string()
            }
            Self::Api {
                message: Some(message),
                ..
            } => format!("Erro da API do mentor: {message}"),
            Self::Api { message: None, .. } | Self::InvalidResponse(_) | Self::Transport(_) => {
                "Não foi possível obter resposta do mentor. Tente novamente.".to_string()
            }
            Self::EmptyResponse => "O mentor não retornou resposta. Tente novamente.".to_string(),
            Self::AlreadyInFlight(_) => "Aguarde a resposta anterior do mentor.".to_string(),
        }
    }
}

impl Display for MentorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(details) => write!(f, "mentor not configured: {details}"),
            Self::Api {
                status,
                message: Some(message),
            } => write!(f, "mentor API error {status}: {message}"),
            Self::Api {
                status,
                message: None,
            } => write!(f, "mentor API error {status}"),
            Self::EmptyResponse => write!(f, "mentor returned an empty response"),
            Self::InvalidResponse(details) => write!(f, "invalid mentor response: {details}"),
            Self::Transport(details) => write!(f, "mentor transport failure: {details}"),
            Self::AlreadyInFlight(key) => write!(f, "mentor request already in flight: {key}"),
        }
    }
}

impl Error for MentorError {}

/// Raw HTTP outcome handed back by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Sends one `generateContent` request.
pub trait MentorTransport {
    fn send(&self, api_key: &str, request: &GenerateRequest)
        -> Result<TransportResponse, MentorError>;
}

/// Blocking reqwest transport for the Gemini REST API.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
    base_url: String,
    model: String,
}

impl ReqwestTransport {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self, MentorError> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|err| MentorError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    /// Endpoint URL without the key query parameter.
    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

impl MentorTransport for ReqwestTransport {
    fn send(
        &self,
        api_key: &str,
        request: &GenerateRequest,
    ) -> Result<TransportResponse, MentorError> {
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(request)
            .send()
            .map_err(|err| MentorError::Transport(err.without_url().to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|err| MentorError::Transport(err.without_url().to_string()))?;
        Ok(TransportResponse { status, body })
    }
}

/// Feedback text plus its parsed sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentorFeedback {
    pub text: String,
    pub parsed: ParsedMentorResponse,
}

/// Mentor client over a transport.
pub struct MentorClient<T: MentorTransport> {
    api_key: String,
    transport: T,
    in_flight: Mutex<HashSet<RequestKey>>,
}

impl MentorClient<ReqwestTransport> {
    /// Builds a client against the configured Gemini endpoint.
    pub fn from_settings(settings: &MentorSettings) -> Result<Self, MentorError> {
        let transport = ReqwestTransport::new(settings.base_url.as_str(), settings.model.as_str())?;
        Ok(Self::new(settings.api_key.as_str(), transport))
    }
}

impl<T: MentorTransport> MentorClient<T> {
    pub fn new(api_key: impl Into<String>, transport: T) -> Self {
        Self {
            api_key: api_key.into(),
            transport,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Whether a usable key is configured.
    pub fn is_configured(&self) -> bool {
        !is_placeholder_key(&self.api_key)
    }

    /// Requests structured feedback on `note`, with recent notes as context.
    pub fn request_feedback(
        &self,
        note: &Note,
        recent_notes: &[Note],
    ) -> Result<MentorFeedback, MentorError> {
        let request = build_feedback_request(note, recent_notes);
        let text = self.generate(RequestKey::Feedback(note.id), &request)?;
        let parsed = parse_mentor_response(&text);
        if parsed.is_fallback() {
            info!("event=mentor_parse module=mentor status=fallback note_id={}", note.id);
        }
        Ok(MentorFeedback { text, parsed })
    }

    /// Sends the chat transcript and returns the mentor's reply.
    pub fn send_chat(
        &self,
        history: &[ChatMessage],
        recent_notes: &[Note],
    ) -> Result<String, MentorError> {
        let request = build_chat_request(history, recent_notes);
        self.generate(RequestKey::Chat, &request)
    }

    fn generate(&self, key: RequestKey, request: &GenerateRequest) -> Result<String, MentorError> {
        self.ensure_configured()?;
        let _guard = InFlightGuard::acquire(&self.in_flight, key)?;

        let started_at = Instant::now();
        info!(
            "event=mentor_request module=mentor status=start request={key} turns={}",
            request.contents.len()
        );
        let result = self
            .transport
            .send(&self.api_key, request)
            .and_then(|response| extract_text(&response));
        match &result {
            Ok(text) => info!(
                "event=mentor_request module=mentor status=ok request={key} duration_ms={} chars={}",
                started_at.elapsed().as_millis(),
                text.chars().count()
            ),
            Err(err) => error!(
                "event=mentor_request module=mentor status=error request={key} duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            ),
        }
        result
    }

    fn ensure_configured(&self) -> Result<(), MentorError> {
        if self.is_configured() {
            return Ok(());
        }
        warn!("event=mentor_request module=mentor status=error error_code=missing_api_key");
        Err(MentorError::Configuration(
            "GAMENOTE_GEMINI_API_KEY is missing or a placeholder".to_string(),
        ))
    }
}

/// True for empty keys, sample placeholders and `<...>` templates.
pub fn is_placeholder_key(api_key: &str) -> bool {
    let trimmed = api_key.trim();
    trimmed.is_empty()
        || (trimmed.starts_with('<') && trimmed.ends_with('>'))
        || PLACEHOLDER_KEYS
            .iter()
            .any(|placeholder| trimmed.eq_ignore_ascii_case(placeholder))
}

struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<RequestKey>>,
    key: RequestKey,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(in_flight: &'a Mutex<HashSet<RequestKey>>, key: RequestKey) -> Result<Self, MentorError> {
        let mut keys = in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !keys.insert(key) {
            warn!("event=mentor_request module=mentor status=rejected request={key} reason=in_flight");
            return Err(MentorError::AlreadyInFlight(key));
        }
        Ok(Self { in_flight, key })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut keys = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        keys.remove(&self.key);
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

fn extract_text(response: &TransportResponse) -> Result<String, MentorError> {
    if !(200..300).contains(&response.status) {
        let message = serde_json::from_str::<ApiErrorEnvelope>(&response.body)
            .ok()
            .and_then(|envelope| envelope.error.message)
            .filter(|message| !message.trim().is_empty());
        return Err(MentorError::Api {
            status: response.status,
            message,
        });
    }

    let decoded: GenerateResponse = serde_json::from_str(&response.body)
        .map_err(|err| MentorError::InvalidResponse(err.to_string()))?;
    decoded
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .map(|part| part.text)
        .filter(|text| !text.trim().is_empty())
        .ok_or(MentorError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::{extract_text, is_placeholder_key, MentorError, TransportResponse};

    fn response(status: u16, body: &str) -> TransportResponse {
        TransportResponse {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn placeholder_keys_are_detected() {
        assert!(is_placeholder_key(""));
        assert!(is_placeholder_key("   "));
        assert!(is_placeholder_key("your_gemini_api_key"));
        assert!(is_placeholder_key("<gemini-key>"));
        assert!(!is_placeholder_key("AIzaSyA-real-looking-key"));
    }

    #[test]
    fn extract_text_reads_first_candidate_part() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"olá"},{"text":"x"}]}}]}"#;
        assert_eq!(extract_text(&response(200, body)).expect("text"), "olá");
    }

    #[test]
    fn extract_text_maps_missing_text_to_empty_response() {
        assert_eq!(
            extract_text(&response(200, r#"{"candidates":[]}"#)),
            Err(MentorError::EmptyResponse)
        );
        assert_eq!(
            extract_text(&response(200, r#"{"candidates":[{"finishReason":"SAFETY"}]}"#)),
            Err(MentorError::EmptyResponse)
        );
    }

    #[test]
    fn extract_text_carries_upstream_error_message() {
        let body = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(
            extract_text(&response(400, body)),
            Err(MentorError::Api {
                status: 400,
                message: Some("API key not valid".to_string())
            })
        );
        assert_eq!(
            extract_text(&response(503, "upstream down")),
            Err(MentorError::Api {
                status: 503,
                message: None
            })
        );
    }
}
