use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use super::{SpeechRecognizer, SpeechSynthesizer, Translator};
use crate::config::{RecognitionConfig, SynthesisConfig, TranslationConfig};
use crate::error::{DubError, RecognizeError, Result};

/// Google Cloud Speech-to-Text client
pub struct GoogleSpeechClient {
    config: RecognitionConfig,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechRequest {
    config: SpeechRequestConfig,
    audio: SpeechRequestAudio,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechRequestConfig {
    encoding: &'static str,
    sample_rate_hertz: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    language_code: Option<String>,
}

#[derive(Debug, Serialize)]
struct SpeechRequestAudio {
    content: String,
}

#[derive(Debug, Deserialize)]
struct SpeechResponse {
    #[serde(default)]
    results: Vec<SpeechResult>,
}

#[derive(Debug, Deserialize)]
struct SpeechResult {
    #[serde(default)]
    alternatives: Vec<SpeechAlternative>,
}

#[derive(Debug, Deserialize)]
struct SpeechAlternative {
    #[serde(default)]
    transcript: String,
}

impl GoogleSpeechClient {
    pub fn new(config: &RecognitionConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| DubError::Recognition(crate::error::RecognitionFailure::ServiceUnavailable(e.to_string())))?;

        Ok(Self {
            config: config.clone(),
            client,
        })
    }

    fn request_url(&self) -> String {
        match &self.config.api_key {
            Some(key) => format!("{}?key={}", self.config.endpoint, key),
            None => self.config.endpoint.clone(),
        }
    }
}

#[async_trait]
impl SpeechRecognizer for GoogleSpeechClient {
    async fn recognize(
        &self,
        audio: &Path,
        language: Option<&str>,
    ) -> std::result::Result<String, RecognizeError> {
        let bytes = tokio::fs::read(audio)
            .await
            .map_err(|e| RecognizeError::Service(format!("cannot read window file: {e}")))?;

        let request = SpeechRequest {
            config: SpeechRequestConfig {
                encoding: "LINEAR16",
                sample_rate_hertz: 16000,
                language_code: language.map(str::to_string),
            },
            audio: SpeechRequestAudio {
                content: general_purpose::STANDARD.encode(&bytes),
            },
        };

        debug!("Sending recognition request ({} bytes audio)", bytes.len());

        let response = self
            .client
            .post(self.request_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| RecognizeError::Service(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST {
            // The service rejects some hinted requests it would accept
            // unhinted; the caller retries once without the hint.
            let text = response.text().await.unwrap_or_default();
            return Err(RecognizeError::InvalidRequest(text));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RecognizeError::Service(format!("HTTP {status}: {text}")));
        }

        let speech_response: SpeechResponse = response
            .json()
            .await
            .map_err(|e| RecognizeError::Service(e.to_string()))?;

        let transcript = speech_response
            .results
            .iter()
            .filter_map(|r| r.alternatives.first())
            .map(|a| a.transcript.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if transcript.is_empty() {
            return Err(RecognizeError::NoSpeech);
        }

        Ok(transcript)
    }
}

/// Google Translate v2 client
pub struct GoogleTranslateClient {
    config: TranslationConfig,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    target: &'a str,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    translations: Vec<TranslationEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslationEntry {
    translated_text: String,
}

impl GoogleTranslateClient {
    pub fn new(config: &TranslationConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| DubError::Translation(e.to_string()))?;

        Ok(Self {
            config: config.clone(),
            client,
        })
    }
}

#[async_trait]
impl Translator for GoogleTranslateClient {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
        let url = match &self.config.api_key {
            Some(key) => format!("{}?key={}", self.config.endpoint, key),
            None => self.config.endpoint.clone(),
        };

        let request = TranslateRequest {
            q: text,
            target: target_language,
            format: "text",
        };

        debug!("Sending translation request to {}", self.config.endpoint);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DubError::Translation(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DubError::Translation(format!("HTTP {status}: {text}")));
        }

        let translate_response: TranslateResponse = response
            .json()
            .await
            .map_err(|e| DubError::Translation(e.to_string()))?;

        translate_response
            .data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or_else(|| DubError::Translation("empty translation response".to_string()))
    }
}

/// Google Cloud Text-to-Speech client
pub struct GoogleTtsClient {
    config: SynthesisConfig,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TtsRequest<'a> {
    input: TtsInput<'a>,
    voice: TtsVoice<'a>,
    audio_config: TtsAudioConfig,
}

#[derive(Debug, Serialize)]
struct TtsInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TtsVoice<'a> {
    language_code: &'a str,
    ssml_gender: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TtsAudioConfig {
    audio_encoding: &'static str,
    speaking_rate: f64,
    pitch: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TtsResponse {
    audio_content: String,
}

impl GoogleTtsClient {
    pub fn new(config: &SynthesisConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| DubError::Synthesis(e.to_string()))?;

        Ok(Self {
            config: config.clone(),
            client,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTtsClient {
    async fn synthesize(&self, text: &str, language: &str, out: &Path) -> Result<()> {
        let url = match &self.config.api_key {
            Some(key) => format!("{}?key={}", self.config.endpoint, key),
            None => self.config.endpoint.clone(),
        };

        let request = TtsRequest {
            input: TtsInput { text },
            voice: TtsVoice {
                language_code: language,
                ssml_gender: "NEUTRAL",
            },
            audio_config: TtsAudioConfig {
                audio_encoding: "LINEAR16",
                speaking_rate: self.config.speaking_rate,
                pitch: self.config.pitch,
            },
        };

        debug!("Sending synthesis request ({} bytes text)", text.len());

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DubError::Synthesis(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DubError::Synthesis(format!("HTTP {status}: {text}")));
        }

        let tts_response: TtsResponse = response
            .json()
            .await
            .map_err(|e| DubError::Synthesis(e.to_string()))?;

        let audio_bytes = general_purpose::STANDARD
            .decode(&tts_response.audio_content)
            .map_err(|e| DubError::Synthesis(format!("invalid audio payload: {e}")))?;

        tokio::fs::write(out, audio_bytes).await?;
        Ok(())
    }
}
