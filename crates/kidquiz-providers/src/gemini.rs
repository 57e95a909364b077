//! Google Gemini provider: assessment text and speech synthesis.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use kidquiz_core::traits::{
    build_assessment_prompt, parse_remote_assessment, AssessmentProvider, AssessmentRequest,
    EncodedAudio, RemoteAssessment, SpeechProvider, ASSESSMENT_SYSTEM_PROMPT,
};

use crate::error::ProviderError;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_TEXT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const DEFAULT_VOICE: &str = "Charon";

/// Gemini API provider.
pub struct GeminiProvider {
    api_key: String,
    base_url: String,
    text_model: String,
    tts_model: String,
    voice: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: &str, base_url: Option<String>) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ProviderError::NetworkError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key: api_key.to_string(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            tts_model: DEFAULT_TTS_MODEL.to_string(),
            voice: DEFAULT_VOICE.to_string(),
            client,
        })
    }

    pub fn with_text_model(mut self, model: Option<String>) -> Self {
        if let Some(model) = model {
            self.text_model = model;
        }
        self
    }

    pub fn with_tts_model(mut self, model: Option<String>) -> Self {
        if let Some(model) = model {
            self.tts_model = model;
        }
        self
    }

    pub fn with_voice(mut self, voice: Option<String>) -> Self {
        if let Some(voice) = voice {
            self.voice = voice;
        }
        self
    }

    async fn generate_content(
        &self,
        model: &str,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ProviderError> {
        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, DEFAULT_TIMEOUT_SECS))?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30)
                .saturating_mul(1000);
            return Err(ProviderError::RateLimited {
                retry_after_ms: retry_after,
            });
        }
        if status == 401 || status == 403 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::AuthenticationFailed(error_message(body)));
        }
        if status == 404 {
            return Err(ProviderError::ModelNotFound(model.to_string()));
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status,
                message: error_message(body),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("failed to parse response: {e}")))
    }
}

fn error_message(body: String) -> String {
    serde_json::from_str::<GeminiError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn text(role: Option<&str>, text: String) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part {
                text: Some(text),
                inline_data: None,
            }],
        }
    }
}

#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: String,
    data: String,
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<SpeechConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig {
    voice_config: VoiceConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

impl GenerateContentResponse {
    fn first_parts(&self) -> &[Part] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or_default()
    }

    fn text(&self) -> String {
        self.first_parts()
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect()
    }

    fn audio(self) -> Option<String> {
        let candidate = self.candidates.into_iter().next()?;
        let part = candidate.content?.parts.into_iter().next()?;
        part.inline_data.map(|d| d.data)
    }
}

#[derive(Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Deserialize)]
struct GeminiErrorBody {
    message: String,
}

fn assessment_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "message": { "type": "STRING", "description": "Lời nói vui nhộn của Mascot" },
            "teacherComment": { "type": "STRING", "description": "Nhận xét theo TT 27/BGDĐT" },
            "assessmentLevel": { "type": "STRING", "description": "Mức đánh giá" },
            "rewardEmoji": { "type": "STRING", "description": "Emoji phần thưởng" },
            "rewardName": { "type": "STRING", "description": "Tên phần thưởng" }
        },
        "propertyOrdering": ["message", "teacherComment", "assessmentLevel", "rewardEmoji", "rewardName"]
    })
}

#[async_trait]
impl AssessmentProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    #[instrument(skip(self, request), fields(model = %self.text_model))]
    async fn assess(&self, request: &AssessmentRequest) -> anyhow::Result<RemoteAssessment> {
        let body = GenerateContentRequest {
            contents: vec![Content::text(Some("user"), build_assessment_prompt(request))],
            system_instruction: Some(Content::text(None, ASSESSMENT_SYSTEM_PROMPT.to_string())),
            generation_config: GenerationConfig {
                response_mime_type: Some("application/json".into()),
                response_schema: Some(assessment_schema()),
                ..Default::default()
            },
        };

        let response = self.generate_content(&self.text_model, &body).await?;
        let text = response.text();
        debug!(chars = text.len(), "assessment reply received");

        let assessment = parse_remote_assessment(&text)
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
        Ok(assessment)
    }
}

#[async_trait]
impl SpeechProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    #[instrument(skip(self, text), fields(model = %self.tts_model, chars = text.chars().count()))]
    async fn synthesize(&self, text: &str) -> anyhow::Result<Option<EncodedAudio>> {
        let body = GenerateContentRequest {
            contents: vec![Content::text(None, format!("Đọc: {text}"))],
            system_instruction: None,
            generation_config: GenerationConfig {
                response_modalities: Some(vec!["AUDIO".into()]),
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: self.voice.clone(),
                        },
                    },
                }),
                ..Default::default()
            },
        };

        let response = self.generate_content(&self.tts_model, &body).await?;
        Ok(response
            .audio()
            .filter(|data| !data.is_empty())
            .map(EncodedAudio))
    }
}
