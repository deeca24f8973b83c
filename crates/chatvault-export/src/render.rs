use chrono::{DateTime, Utc};

/// Closed set of message-content kinds, one renderer arm per kind plus
/// a fallback for anything the platform adds later.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    Text(String),
    Photo { caption: Option<String> },
    Video { caption: Option<String> },
    Voice { duration_secs: u32, transcription: Option<String> },
    Audio { title: Option<String> },
    Document { file_name: Option<String>, caption: Option<String> },
    Sticker { emoji: Option<String> },
    Location { latitude: f64, longitude: f64 },
    Contact { name: String, phone: String },
    Poll { question: String },
    /// Join/leave/pin notices; skipped from exports.
    Service,
    Unsupported,
}

#[derive(Debug, Clone)]
pub struct ExportMessage {
    pub id: i64,
    pub sender: String,
    pub sent_at: DateTime<Utc>,
    pub content: MessageContent,
}

/// Render one message as an export line, or None when the message
/// carries nothing worth exporting (service messages).
pub fn render_message(msg: &ExportMessage) -> Option<String> {
    let body = render_content(&msg.content)?;
    Some(format!(
        "[{}] {}: {}",
        msg.sent_at.format("%Y-%m-%d %H:%M:%S"),
        msg.sender,
        body
    ))
}

fn render_content(content: &MessageContent) -> Option<String> {
    let with_caption = |label: &str, caption: &Option<String>| match caption {
        Some(c) => format!("{label} {c}"),
        None => label.to_string(),
    };

    match content {
        MessageContent::Text(text) => Some(text.clone()),
        MessageContent::Photo { caption } => Some(with_caption("[Photo]", caption)),
        MessageContent::Video { caption } => Some(with_caption("[Video]", caption)),
        MessageContent::Voice { duration_secs, transcription } => {
            let mut line = format!("[Voice {duration_secs}s]");
            if let Some(text) = transcription {
                line.push_str(&format!(" (transcript: {text})"));
            }
            Some(line)
        }
        MessageContent::Audio { title } => Some(match title {
            Some(t) => format!("[Audio: {t}]"),
            None => "[Audio]".to_string(),
        }),
        MessageContent::Document { file_name, caption } => {
            let label = match file_name {
                Some(name) => format!("[File: {name}]"),
                None => "[File]".to_string(),
            };
            Some(with_caption(&label, caption))
        }
        MessageContent::Sticker { emoji } => Some(match emoji {
            Some(e) => format!("[Sticker {e}]"),
            None => "[Sticker]".to_string(),
        }),
        MessageContent::Location { latitude, longitude } => {
            Some(format!("[Location {latitude}, {longitude}]"))
        }
        MessageContent::Contact { name, phone } => Some(format!("[Contact: {name}, {phone}]")),
        MessageContent::Poll { question } => Some(format!("[Poll: {question}]")),
        MessageContent::Service => None,
        MessageContent::Unsupported => Some("[Unsupported message]".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn msg(content: MessageContent) -> ExportMessage {
        ExportMessage {
            id: 1,
            sender: "Ada".into(),
            sent_at: Utc.with_ymd_and_hms(2024, 4, 1, 12, 30, 0).unwrap(),
            content,
        }
    }

    #[test]
    fn text_renders_with_timestamp_and_sender() {
        let line = render_message(&msg(MessageContent::Text("hello".into()))).unwrap();
        assert_eq!(line, "[2024-04-01 12:30:00] Ada: hello");
    }

    #[test]
    fn service_messages_are_skipped() {
        assert_eq!(render_message(&msg(MessageContent::Service)), None);
    }

    #[test]
    fn voice_includes_transcript_when_present() {
        let line = render_message(&msg(MessageContent::Voice {
            duration_secs: 12,
            transcription: Some("call me back".into()),
        }))
        .unwrap();
        assert!(line.contains("[Voice 12s]"));
        assert!(line.contains("call me back"));
    }

    #[test]
    fn captions_are_appended() {
        let line = render_message(&msg(MessageContent::Photo {
            caption: Some("sunset".into()),
        }))
        .unwrap();
        assert!(line.ends_with("[Photo] sunset"));
    }

    #[test]
    fn unknown_kinds_fall_back() {
        let line = render_message(&msg(MessageContent::Unsupported)).unwrap();
        assert!(line.contains("[Unsupported message]"));
    }
}
