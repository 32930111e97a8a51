//! AI mentor: prompt building, response parsing and the Gemini client.
//!
//! # Responsibility
//! - Turn a note (feedback) or a transcript (chat) into a `generateContent`
//!   request with the mentor persona.
//! - Extract the four feedback sections from loosely structured output.
//! - Surface configuration and upstream failures as recoverable errors.
//!
//! # See also
//! - `crate::config::MentorSettings`

pub mod chat;
pub mod client;
pub mod prompt;
pub mod response;

pub use chat::ChatSession;
pub use client::{
    is_placeholder_key, MentorClient, MentorError, MentorFeedback, MentorTransport, RequestKey,
    ReqwestTransport, TransportResponse,
};
pub use prompt::{build_chat_request, build_feedback_request, GenerateRequest, GenerationConfig};
pub use response::{parse_mentor_response, ParsedMentorResponse, Section};
