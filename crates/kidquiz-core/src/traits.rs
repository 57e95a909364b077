//! Collaborator traits for remote services and device audio.
//!
//! Implemented by the `kidquiz-providers` crate. The core never talks to the
//! network or the sound card directly, so tests can substitute doubles.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::audio::PcmBuffer;

// ---------------------------------------------------------------------------
// Remote assessment
// ---------------------------------------------------------------------------

/// Trait for remote text generators that write the post-quiz assessment.
#[async_trait]
pub trait AssessmentProvider: Send + Sync {
    /// Human-readable provider name (e.g. "gemini").
    fn name(&self) -> &str;

    /// Ask the remote model for an assessment of a finished session.
    async fn assess(&self, request: &AssessmentRequest) -> anyhow::Result<RemoteAssessment>;
}

/// What the remote generator is told about the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentRequest {
    pub topic: String,
    pub score: u32,
    pub total: u32,
}

/// Assessment fields returned by a remote generator. Any may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAssessment {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub teacher_comment: Option<String>,
    #[serde(default)]
    pub assessment_level: Option<String>,
    #[serde(default)]
    pub reward_emoji: Option<String>,
    #[serde(default)]
    pub reward_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Remote speech synthesis
// ---------------------------------------------------------------------------

/// Base64-encoded raw PCM (16-bit signed LE, 24000 Hz, mono).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedAudio(pub String);

impl EncodedAudio {
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// Trait for remote text-to-speech services.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Synthesize `text`. `Ok(None)` means the service answered without audio.
    async fn synthesize(&self, text: &str) -> anyhow::Result<Option<EncodedAudio>>;
}

// ---------------------------------------------------------------------------
// Device audio
// ---------------------------------------------------------------------------

/// A voice offered by the local speech engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceInfo {
    pub name: String,
    /// Language tag, e.g. "vi" or "en-US".
    pub language: String,
}

/// A fire-and-forget request to the local speech engine.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrationRequest {
    pub text: String,
    /// Target locale, e.g. "vi-VN".
    pub locale: String,
    /// Speaking rate relative to normal (1.0).
    pub rate: f32,
    pub pitch: f32,
    /// Preferred voice; `None` leaves the device default.
    pub voice: Option<String>,
}

/// Local device speech. Completion is not observable.
pub trait LocalNarrator: Send + Sync {
    fn name(&self) -> &str;

    /// Voices the device offers.
    fn voices(&self) -> Vec<VoiceInfo>;

    /// Start speaking. Returns once the request is handed to the device.
    fn narrate(&self, request: &NarrationRequest) -> anyhow::Result<()>;

    /// Cancel any local speech. Safe to call when idle.
    fn cancel(&self);
}

/// Plays decoded audio.
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Play the buffer to completion. Dropping the future stops playback.
    async fn play(&self, buffer: PcmBuffer) -> anyhow::Result<()>;
}

// ---------------------------------------------------------------------------
// Prompting
// ---------------------------------------------------------------------------

/// System instruction for assessment generators.
pub const ASSESSMENT_SYSTEM_PROMPT: &str = "Bạn đóng vai Thầy Duy - một giáo viên tiểu học miền Nam tận tâm, vui tính. Chỉ trả lời bằng một đối tượng JSON với các khóa: message, teacherComment, assessmentLevel, rewardEmoji, rewardName.";

/// Build the user prompt for an assessment request.
pub fn build_assessment_prompt(request: &AssessmentRequest) -> String {
    format!(
        "Viết nhận xét TT27 cho bài trắc nghiệm: \"{}\". Điểm: {}/{}.\n\
         Yêu cầu: Nhận xét sâu sắc, chân thành, dùng từ miền Nam (nhen, nè, nha, con).\n\
         Các mức: \"Hoàn thành tốt\" (>=80%), \"Hoàn thành\" (>=50%), \"Chưa hoàn thành\" (<50%).",
        request.topic, request.score, request.total
    )
}

/// Extract a JSON object from a model reply.
///
/// Handles replies wrapped in ```json fences or surrounded by prose; returns
/// the substring from the first `{` to the last `}`.
pub fn extract_json_object(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (end > start).then(|| &response[start..=end])
}

/// Parse a model reply into assessment fields.
pub fn parse_remote_assessment(response: &str) -> anyhow::Result<RemoteAssessment> {
    let json = extract_json_object(response)
        .ok_or_else(|| anyhow::anyhow!("no JSON object in model reply"))?;
    let parsed: RemoteAssessment = serde_json::from_str(json)?;
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_mentions_topic_and_score() {
        let prompt = build_assessment_prompt(&AssessmentRequest {
            topic: "Đi xe đạp".into(),
            score: 3,
            total: 5,
        });
        assert!(prompt.contains("\"Đi xe đạp\""));
        assert!(prompt.contains("3/5"));
        assert!(prompt.contains("Hoàn thành tốt"));
    }

    #[test]
    fn extract_fenced_json() {
        let reply = "```json\n{\"message\": \"Giỏi!\"}\n```";
        assert_eq!(extract_json_object(reply), Some("{\"message\": \"Giỏi!\"}"));
    }

    #[test]
    fn extract_without_object() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} {"), None);
    }

    #[test]
    fn parse_partial_assessment() {
        let parsed =
            parse_remote_assessment(r#"Sure! {"message": "Hay lắm", "rewardEmoji": "🎉"}"#)
                .unwrap();
        assert_eq!(parsed.message.as_deref(), Some("Hay lắm"));
        assert_eq!(parsed.reward_emoji.as_deref(), Some("🎉"));
        assert!(parsed.teacher_comment.is_none());
    }

    #[test]
    fn parse_malformed_assessment() {
        assert!(parse_remote_assessment("{not json}").is_err());
        assert!(parse_remote_assessment("").is_err());
    }

    #[test]
    fn empty_encoded_audio() {
        assert!(EncodedAudio(String::new()).is_empty());
        assert!(EncodedAudio("  ".into()).is_empty());
        assert!(!EncodedAudio("AAAA".into()).is_empty());
    }
}
