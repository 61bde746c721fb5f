//! Модуль обработки ошибок библиотеки caption-sync
//!
//! Этот модуль содержит типы ошибок, которые могут возникнуть при работе библиотеки.

use thiserror::Error;

/// Ошибки библиотеки caption-sync
#[derive(Debug, Error)]
pub enum CaptionSyncError {
    /// Ошибка HTTP запроса
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Ошибка ввода-вывода
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Ошибка сериализации/десериализации JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Недопустимое значение времени
    #[error("Invalid time value: {0}")]
    InvalidTime(String),

    /// Ошибка распознавания речи
    #[error("Speech recognition error: {0}")]
    Recognition(String),

    /// Ошибка формата субтитров
    #[error("Subtitle format error: {0}")]
    SubtitleFormat(String),

    /// Ошибка компоновки субтитра
    #[error("Caption layout error: {0}")]
    Layout(String),

    /// Ошибка композиции таймлайна
    #[error("Composition error: {0}")]
    Composition(String),

    /// Ошибка рендеринга итогового видео
    #[error("Rendering error: {0}")]
    Rendering(String),

    /// Ошибка конфигурации
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Файл не найден
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Другая ошибка
    #[error("Other error: {0}")]
    Other(String),
}

impl From<&str> for CaptionSyncError {
    fn from(s: &str) -> Self {
        CaptionSyncError::Other(s.to_string())
    }
}

impl From<String> for CaptionSyncError {
    fn from(s: String) -> Self {
        CaptionSyncError::Other(s)
    }
}

/// Тип Result для библиотеки caption-sync
pub type Result<T> = std::result::Result<T, CaptionSyncError>;
