//! TwiML documents returned to the voice webhook
//!
//! Every non-final turn speaks the reply inside a speech `<Gather>` that posts
//! the next utterance back to the webhook. When the caller says nothing the
//! gather times out and the call is redirected to the webhook with an empty
//! utterance, so the engine alone decides what a silence sounds like.

use crate::domain::lexicon::VoiceProfile;
use std::fmt::Write;

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

#[derive(Debug, Clone, PartialEq)]
pub struct GatherSettings {
    /// Webhook path the gathered speech is posted to
    pub action: String,
    /// `auto` or a number of seconds of silence that ends the utterance
    pub speech_timeout: String,
    /// Seconds to wait for the caller to start speaking
    pub timeout_secs: u32,
}

impl Default for GatherSettings {
    fn default() -> Self {
        Self {
            action: "/voice".to_string(),
            speech_timeout: "auto".to_string(),
            timeout_secs: 5,
        }
    }
}

pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn say(out: &mut String, text: &str, voice: &VoiceProfile) {
    let _ = write!(
        out,
        r#"<Say voice="{}" language="{}">{}</Say>"#,
        escape_xml(&voice.voice),
        escape_xml(&voice.locale),
        escape_xml(text)
    );
}

/// Speak `text` and listen for the next utterance
pub fn gather_response(text: &str, voice: &VoiceProfile, settings: &GatherSettings) -> String {
    let action = escape_xml(&settings.action);
    let mut out = String::from(XML_HEADER);
    out.push_str("<Response>");
    let _ = write!(
        out,
        r#"<Gather input="speech" speechTimeout="{}" timeout="{}" action="{}" method="POST" language="{}">"#,
        escape_xml(&settings.speech_timeout),
        settings.timeout_secs,
        action,
        escape_xml(&voice.locale)
    );
    say(&mut out, text, voice);
    out.push_str("</Gather>");
    let _ = write!(out, r#"<Redirect method="POST">{}</Redirect>"#, action);
    out.push_str("</Response>");
    out
}

/// Speak the last utterance and hang up
pub fn final_response(text: &str, voice: &VoiceProfile) -> String {
    let mut out = String::from(XML_HEADER);
    out.push_str("<Response>");
    say(&mut out, text, voice);
    out.push_str(r#"<Pause length="1"/><Hangup/></Response>"#);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice() -> VoiceProfile {
        VoiceProfile {
            voice: "Google.es-ES-Neural2-B".into(),
            locale: "es-ES".into(),
        }
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml(r#"Tom & "Jerry" <3 'ok'"#), "Tom &amp; &quot;Jerry&quot; &lt;3 &apos;ok&apos;");
        assert_eq!(escape_xml("¿Para cuántas personas?"), "¿Para cuántas personas?");
    }

    #[test]
    fn test_gather_response() {
        let xml = gather_response("¿Para cuántas personas?", &voice(), &GatherSettings::default());
        assert!(xml.starts_with(XML_HEADER));
        assert!(xml.contains(r#"<Gather input="speech" speechTimeout="auto" timeout="5" action="/voice" method="POST" language="es-ES">"#));
        assert!(xml.contains(r#"<Say voice="Google.es-ES-Neural2-B" language="es-ES">¿Para cuántas personas?</Say></Gather>"#));
        assert!(xml.contains(r#"</Gather><Redirect method="POST">"#));
        assert_eq!(xml.matches("<Say ").count(), 1);
        assert!(xml.ends_with(r#"<Redirect method="POST">/voice</Redirect></Response>"#));
    }

    #[test]
    fn test_final_response_hangs_up() {
        let xml = final_response("Hasta pronto & gracias", &voice());
        assert!(xml.contains("Hasta pronto &amp; gracias"));
        assert!(xml.ends_with(r#"<Pause length="1"/><Hangup/></Response>"#));
        assert!(!xml.contains("<Gather"));
    }
}
