//! Telephony webhook

use super::AppState;
use crate::application::{TurnRequest, TurnResponse};
use crate::infrastructure::telephony::{final_response, gather_response};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form,
};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

/// Call statuses after which the provider sends no further speech
const ENDED_STATUSES: [&str; 5] = ["completed", "busy", "no-answer", "failed", "canceled"];

/// Fields of the provider's voice webhook form we care about
#[derive(Debug, Deserialize)]
pub struct VoiceWebhook {
    #[serde(rename = "CallSid")]
    pub call_sid: String,
    #[serde(rename = "From", default)]
    pub from: Option<String>,
    #[serde(rename = "SpeechResult", default)]
    pub speech_result: Option<String>,
    #[serde(rename = "Digits", default)]
    pub digits: Option<String>,
}

impl VoiceWebhook {
    /// Recognized speech, or keypad digits when there is none
    pub fn utterance(&self) -> String {
        self.speech_result
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or_else(|| self.digits.as_deref().map(str::trim))
            .unwrap_or_default()
            .to_string()
    }
}

pub async fn voice_webhook(State(state): State<AppState>, Form(form): Form<VoiceWebhook>) -> Response {
    let utterance = form.utterance();
    info!("Voice: call {} said {:?}", form.call_sid, utterance);

    let mut request = TurnRequest::new(form.call_sid.clone(), utterance);
    if let Some(from) = form.from.as_deref().filter(|f| !f.trim().is_empty()) {
        request = request.with_caller_number(from);
    }

    let response = match state.engine.handle_turn(request).await {
        Ok(response) => response,
        Err(e) => {
            error!("Voice: call {} failed: {}", form.call_sid, e);
            state.engine.unavailable(None)
        }
    };

    if response.is_final {
        state.schedule_cleanup(form.call_sid);
    }

    twiml(render(&state, &response))
}

/// Call progress callback
#[derive(Debug, Deserialize)]
pub struct CallStatusCallback {
    #[serde(rename = "CallSid")]
    pub call_sid: String,
    #[serde(rename = "CallStatus", default)]
    pub call_status: String,
}

impl CallStatusCallback {
    pub fn has_ended(&self) -> bool {
        ENDED_STATUSES.contains(&self.call_status.trim().to_ascii_lowercase().as_str())
    }
}

/// Drops the session as soon as the provider reports the call is over, so
/// callers who hang up mid-dialogue do not leave it behind
pub async fn call_status(State(state): State<AppState>, Form(form): Form<CallStatusCallback>) -> StatusCode {
    info!("Voice: call {} status {}", form.call_sid, form.call_status);
    if form.has_ended() {
        match state.engine.sessions().delete(&form.call_sid).await {
            Ok(true) => debug!("Session {} released on {}", form.call_sid, form.call_status),
            Ok(false) => {}
            Err(e) => warn!("Failed to release session {}: {}", form.call_sid, e),
        }
    }
    StatusCode::NO_CONTENT
}

fn render(state: &AppState, response: &TurnResponse) -> String {
    let voice = &state.engine.lexicon().pack(response.language).voice;
    if response.is_final {
        final_response(&response.text, voice)
    } else {
        gather_response(&response.text, voice, &state.gather)
    }
}

fn twiml(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/xml")], body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utterance_prefers_speech() {
        let form = VoiceWebhook {
            call_sid: "CA1".into(),
            from: None,
            speech_result: Some(" para cuatro ".into()),
            digits: Some("4".into()),
        };
        assert_eq!(form.utterance(), "para cuatro");
    }

    #[test]
    fn test_utterance_falls_back_to_digits() {
        let form = VoiceWebhook {
            call_sid: "CA1".into(),
            from: None,
            speech_result: Some("  ".into()),
            digits: Some("4".into()),
        };
        assert_eq!(form.utterance(), "4");

        let silent = VoiceWebhook {
            call_sid: "CA1".into(),
            from: None,
            speech_result: None,
            digits: None,
        };
        assert_eq!(silent.utterance(), "");
    }

    #[test]
    fn test_ended_call_statuses() {
        let status = |s: &str| CallStatusCallback {
            call_sid: "CA1".into(),
            call_status: s.into(),
        };
        assert!(status("completed").has_ended());
        assert!(status("no-answer").has_ended());
        assert!(status("Canceled").has_ended());
        assert!(!status("in-progress").has_ended());
        assert!(!status("ringing").has_ended());
        assert!(!status("").has_ended());
    }
}
