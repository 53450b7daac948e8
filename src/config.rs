use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the video dubbing pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Audio extraction and windowing settings
    pub audio: AudioConfig,

    /// Speech recognition service settings
    pub recognition: RecognitionConfig,

    /// Translation service settings
    pub translation: TranslationConfig,

    /// Text-to-speech settings
    pub synthesis: SynthesisConfig,

    /// Lip-sync rendering settings
    pub lipsync: LipSyncConfig,

    /// Remote video fetch settings
    pub fetch: FetchConfig,

    /// Output and scratch storage settings
    pub output: OutputConfig,

    /// HTTP API settings
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Target sample rate for extracted audio
    pub sample_rate: u32,

    /// Transcription window length in seconds
    pub window_seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionConfig {
    /// Recognition API endpoint
    pub endpoint: String,

    /// API key for the recognition service
    pub api_key: Option<String>,

    /// Language hint for the first recognition attempt
    pub language_hint: Option<String>,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Translation API endpoint
    pub endpoint: String,

    /// API key for the translation service
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Text-to-speech API endpoint
    pub endpoint: String,

    /// API key for the synthesis service
    pub api_key: Option<String>,

    /// Maximum UTF-8 bytes per synthesis request
    pub max_chunk_bytes: usize,

    /// Speaking rate (1.0 = natural)
    pub speaking_rate: f64,

    /// Pitch adjustment in semitones
    pub pitch: f64,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LipSyncConfig {
    /// Enable the lip-sync pass before falling back to a plain re-mux
    pub enabled: bool,

    /// Path to the Wav2Lip inference script
    pub script_path: PathBuf,

    /// Path to the model checkpoint
    pub checkpoint_path: PathBuf,

    /// Python interpreter used to run inference
    pub python: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Preferred download format selector
    pub format: String,

    /// Socket timeout per network operation in seconds
    pub socket_timeout_seconds: u64,

    /// Retry count for transient download failures
    pub retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for final output videos, one per successful job
    pub output_dir: PathBuf,

    /// Directory for uploaded source videos
    pub uploads_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP API listen port
    pub port: u16,
}

impl Config {
    /// Load configuration from file, falling back to environment overrides.
    pub fn load() -> Result<Self> {
        let config_paths = [
            "video-dubber.toml",
            "config/video-dubber.toml",
            "/etc/video-dubber/config.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Ok(Self::from_env())
    }

    /// Build configuration from defaults plus environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(key) = std::env::var("DUBBER_GOOGLE_API_KEY") {
            config.recognition.api_key = Some(key.clone());
            config.translation.api_key = Some(key.clone());
            config.synthesis.api_key = Some(key);
        }

        if let Ok(dir) = std::env::var("DUBBER_OUTPUT_DIR") {
            config.output.output_dir = PathBuf::from(dir);
        }

        if let Ok(hint) = std::env::var("DUBBER_LANGUAGE_HINT") {
            config.recognition.language_hint = Some(hint);
        }

        if let Ok(port) = std::env::var("DUBBER_PORT") {
            if let Ok(port) = port.parse() {
                config.server.port = port;
            }
        }

        config
    }

    /// Validate configuration before starting work.
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            return Err(anyhow!("audio.sample_rate must be greater than 0"));
        }
        if self.audio.window_seconds <= 0.0 {
            return Err(anyhow!("audio.window_seconds must be positive"));
        }
        if self.synthesis.max_chunk_bytes == 0 {
            return Err(anyhow!("synthesis.max_chunk_bytes must be greater than 0"));
        }
        if !self.output.output_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(&self.output.output_dir) {
                return Err(anyhow!("cannot create output directory: {}", e));
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            audio: AudioConfig {
                sample_rate: 16000, // what the recognition service expects
                window_seconds: 30.0,
            },
            recognition: RecognitionConfig {
                endpoint: "https://speech.googleapis.com/v1/speech:recognize".to_string(),
                api_key: None,
                language_hint: Some("en-US".to_string()),
                timeout_seconds: 60,
            },
            translation: TranslationConfig {
                endpoint: "https://translation.googleapis.com/language/translate/v2".to_string(),
                api_key: None,
                timeout_seconds: 60,
            },
            synthesis: SynthesisConfig {
                endpoint: "https://texttospeech.googleapis.com/v1/text:synthesize".to_string(),
                api_key: None,
                max_chunk_bytes: 4500, // single-request payload limit
                speaking_rate: 1.0,
                pitch: 0.0,
                timeout_seconds: 120,
            },
            lipsync: LipSyncConfig {
                enabled: true,
                script_path: PathBuf::from("Wav2Lip/inference.py"),
                checkpoint_path: PathBuf::from("Wav2Lip/checkpoints/wav2lip.pth"),
                python: "python".to_string(),
            },
            fetch: FetchConfig {
                format: "best[ext=mp4]".to_string(),
                socket_timeout_seconds: 30,
                retries: 3,
            },
            output: OutputConfig {
                output_dir: PathBuf::from("outputs"),
                uploads_dir: PathBuf::from("uploads"),
            },
            server: ServerConfig { port: 5000 },
        }
    }
}
