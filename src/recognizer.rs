//! Модуль интеграции с системой распознавания речи
//!
//! Этот модуль содержит трейт распознавателя и реализацию на основе
//! OpenAI API транскрипции с пословными временными метками.

use async_trait::async_trait;
use serde::Deserialize;
use crate::config::CaptionSyncConfig;
use crate::error::{CaptionSyncError, Result};

/// Распознанное слово с временными метками в секундах
#[derive(Debug, Clone, PartialEq)]
pub struct WordTiming {
    /// Текст слова
    pub text: String,
    /// Время начала в секундах
    pub start: f64,
    /// Время окончания в секундах
    pub end: f64,
}

/// Сегмент транскрипции
#[derive(Debug, Clone, Default)]
pub struct TranscriptSegment {
    /// Слова сегмента в хронологическом порядке
    pub words: Vec<WordTiming>,
}

/// Результат распознавания речи
///
/// Пустой список сегментов — корректный результат для тишины или
/// пустого аудио, а не ошибка.
#[derive(Debug, Clone, Default)]
pub struct Transcription {
    /// Сегменты транскрипции
    pub segments: Vec<TranscriptSegment>,
}

impl Transcription {
    /// Проверить, что транскрипция не содержит ни одного слова
    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(|segment| segment.words.is_empty())
    }
}

/// Трейт распознавателя речи
///
/// Реализации принимают путь к аудиофайлу и возвращают пословную
/// транскрипцию. Трейт позволяет подменять распознаватель в тестах.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Распознать речь в аудиофайле
    async fn transcribe(&self, audio_path: &str) -> Result<Transcription>;
}

/// Ответ API транскрипции в формате verbose_json
///
/// Разбор строгий: некорректная структура ответа приводит к ошибке
/// распознавания, содержимое ответа никогда не исполняется.
#[derive(Debug, Deserialize)]
struct VerboseTranscriptionResponse {
    #[serde(default)]
    words: Vec<ApiWord>,
}

/// Одно слово в ответе API
#[derive(Debug, Deserialize)]
struct ApiWord {
    word: String,
    start: f64,
    end: f64,
}

/// Распознаватель на основе OpenAI API
pub struct WhisperApiRecognizer {
    /// HTTP клиент
    client: reqwest::Client,
    /// API ключ
    api_key: String,
    /// Идентификатор модели распознавания
    model: String,
}

impl WhisperApiRecognizer {
    /// Создать распознаватель из конфигурации
    pub fn from_config(config: &CaptionSyncConfig) -> Result<Self> {
        if config.openai_api_key.trim().is_empty() {
            return Err(CaptionSyncError::Configuration(
                "OpenAI API key is required for speech recognition".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key: config.openai_api_key.clone(),
            model: config.recognition_model.clone(),
        })
    }

    /// Преобразовать ответ API во внутреннее представление
    fn convert_response(response: VerboseTranscriptionResponse) -> Result<Transcription> {
        let mut words = Vec::with_capacity(response.words.len());

        for api_word in response.words {
            if api_word.start < 0.0 || api_word.end < api_word.start {
                return Err(CaptionSyncError::Recognition(format!(
                    "Malformed word timing for '{}': start {}, end {}",
                    api_word.word, api_word.start, api_word.end
                )));
            }

            words.push(WordTiming {
                text: api_word.word,
                start: api_word.start,
                end: api_word.end,
            });
        }

        if words.is_empty() {
            log::info!("Transcription contains no words, treating as empty audio");
            return Ok(Transcription::default());
        }

        Ok(Transcription {
            segments: vec![TranscriptSegment { words }],
        })
    }
}

#[async_trait]
impl SpeechRecognizer for WhisperApiRecognizer {
    async fn transcribe(&self, audio_path: &str) -> Result<Transcription> {
        log::info!("Starting transcription for {}", audio_path);

        let audio_bytes = tokio::fs::read(audio_path).await.map_err(|e| {
            CaptionSyncError::FileNotFound(format!(
                "Failed to read audio file {}: {}",
                audio_path, e
            ))
        })?;

        let file_name = std::path::Path::new(audio_path)
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio.mp3".to_string());

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio_bytes).file_name(file_name),
            )
            .text("model", self.model.clone())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "word");

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/transcriptions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                log::error!("Transcription request failed: {}", e);
                CaptionSyncError::Recognition(format!("Transcription request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::error!("Transcription API returned status {}: {}", status, body);
            return Err(CaptionSyncError::Recognition(format!(
                "Transcription API returned status {}",
                status
            )));
        }

        let parsed: VerboseTranscriptionResponse = response.json().await.map_err(|e| {
            CaptionSyncError::Recognition(format!("Malformed transcription response: {}", e))
        })?;

        let transcription = Self::convert_response(parsed)?;
        log::info!(
            "Transcription completed with {} segments",
            transcription.segments.len()
        );
        Ok(transcription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_response_is_valid_empty_transcription() {
        let response = VerboseTranscriptionResponse { words: Vec::new() };
        let transcription = WhisperApiRecognizer::convert_response(response).unwrap();
        assert!(transcription.is_empty());
    }

    #[test]
    fn test_inverted_word_timing_is_recognition_error() {
        let response = VerboseTranscriptionResponse {
            words: vec![ApiWord {
                word: "bad".to_string(),
                start: 2.0,
                end: 1.0,
            }],
        };
        assert!(WhisperApiRecognizer::convert_response(response).is_err());
    }

    #[test]
    fn test_verbose_json_parsing_is_strict() {
        // Неизвестная форма ответа не превращается в слова
        let parsed: VerboseTranscriptionResponse =
            serde_json::from_str(r#"{"text": "hello", "language": "en"}"#).unwrap();
        assert!(parsed.words.is_empty());

        let malformed: std::result::Result<VerboseTranscriptionResponse, _> =
            serde_json::from_str(r#"{"words": [{"word": "hi", "start": "oops"}]}"#);
        assert!(malformed.is_err());
    }

    #[test]
    fn test_missing_api_key_is_configuration_error() {
        let config = CaptionSyncConfig::default();
        assert!(WhisperApiRecognizer::from_config(&config).is_err());
    }

    #[test]
    fn test_valid_words_become_one_segment() {
        let response = VerboseTranscriptionResponse {
            words: vec![
                ApiWord { word: "hello".to_string(), start: 0.0, end: 0.4 },
                ApiWord { word: "world".to_string(), start: 0.5, end: 0.9 },
            ],
        };
        let transcription = WhisperApiRecognizer::convert_response(response).unwrap();
        assert_eq!(transcription.segments.len(), 1);
        assert_eq!(transcription.segments[0].words.len(), 2);
        assert_eq!(transcription.segments[0].words[0].text, "hello");
    }
}
