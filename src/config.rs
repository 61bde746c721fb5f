//! Модуль конфигурации библиотеки caption-sync
//!
//! Этот модуль содержит структуры и перечисления для настройки библиотеки.

use serde::{Deserialize, Serialize};

/// Политика группировки слов в субтитры
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum GroupingPolicy {
    /// Каждое слово становится отдельным субтитром
    PerWord,
    /// Накопление слов до порога по количеству или до паузы в речи
    Grouped {
        /// Максимальное количество слов в субтитре
        max_words: usize,
        /// Порог паузы между словами в миллисекундах
        silence_gap_ms: u64,
    },
    /// Накопление до 8 слов с разбиением на две строки (режим перевода)
    TwoLine {
        /// Максимальное количество слов в субтитре
        max_words: usize,
        /// Количество слов в первой строке
        first_line_words: usize,
    },
}

impl Default for GroupingPolicy {
    fn default() -> Self {
        Self::Grouped {
            max_words: 2,
            silence_gap_ms: 600,
        }
    }
}

impl GroupingPolicy {
    /// Политика двухстрочных субтитров с параметрами по умолчанию
    pub fn two_line_default() -> Self {
        Self::TwoLine {
            max_words: 8,
            first_line_words: 4,
        }
    }
}

/// Правило замены ошибочно распознанного слова
///
/// Шаблон применяется без учёта регистра к целому словесному фрагменту;
/// совпадение заменяется канонической формой в верхнем регистре.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AliasRule {
    /// Регулярное выражение для словесного фрагмента (без якорей)
    pub pattern: String,
    /// Каноническая форма
    pub canonical: String,
}

impl AliasRule {
    /// Создать новое правило замены
    pub fn new(pattern: impl Into<String>, canonical: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            canonical: canonical.into(),
        }
    }
}

/// Стиль отображения субтитров
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionStyle {
    /// Путь к файлу шрифта TTF/OTF
    pub font_path: String,
    /// Размер шрифта в пикселях
    pub font_size: f32,
    /// Основной цвет текста ("#RRGGBB" или имя цвета)
    pub color: String,
    /// Цвет тени
    pub shadow_color: String,
    /// Ширина кадра в пикселях
    pub frame_width: u32,
    /// Коэффициент межстрочного интервала (1.2; 1.5 для лучшей читаемости)
    pub line_height_factor: f32,
    /// Относительная вертикальная позиция блока субтитров (0.0 - 1.0)
    pub vertical_position: f32,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font_path: String::new(),
            font_size: 60.0,
            color: "white".to_string(),
            shadow_color: "cyan".to_string(),
            frame_width: 540,
            line_height_factor: 1.2,
            vertical_position: 0.4,
        }
    }
}

/// Параметры кодирования итогового видео
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodingSettings {
    /// Видеокодек
    pub video_codec: String,
    /// Пресет кодирования
    pub preset: String,
    /// Значение CRF
    pub crf: u32,
    /// Частота кадров
    pub fps: u32,
    /// Аудиокодек
    pub audio_codec: String,
    /// Битрейт аудио
    pub audio_bitrate: String,
}

impl Default for EncodingSettings {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            preset: "veryfast".to_string(),
            crf: 10,
            fps: 30,
            audio_codec: "aac".to_string(),
            audio_bitrate: "128k".to_string(),
        }
    }
}

/// Конфигурация библиотеки
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionSyncConfig {
    /// API ключ для OpenAI
    pub openai_api_key: String,
    /// Модель распознавания речи
    pub recognition_model: String,
    /// Политика группировки слов
    pub grouping: GroupingPolicy,
    /// Правила замены ошибочно распознанных слов
    pub aliases: Vec<AliasRule>,
    /// Стиль отображения субтитров
    pub style: CaptionStyle,
    /// Длительность показа одного изображения в секундах
    pub image_slot_duration: f64,
    /// Вырезать случайный фрагмент фонового видео под длину озвучки
    pub cut_to_narration: bool,
    /// Обрезать кадр до вертикального формата 9:16
    pub crop_vertical: bool,
    /// Сохранять оригинальную аудиодорожку фонового видео
    pub keep_background_audio: bool,
    /// Громкость фоновой аудиодорожки (0.0 - 1.0)
    pub background_audio_volume: f32,
    /// Директория для сохранения файлов субтитров
    pub subtitles_dir: Option<String>,
    /// Параметры кодирования
    pub encoding: EncodingSettings,
    /// Удалять временные файлы после завершения
    pub cleanup_temp_files: bool,
}

impl Default for CaptionSyncConfig {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            recognition_model: "whisper-1".to_string(),
            grouping: GroupingPolicy::default(),
            aliases: vec![AliasRule::new(r"red+it+", "REDDIT")],
            style: CaptionStyle::default(),
            image_slot_duration: 5.0,
            cut_to_narration: true,
            crop_vertical: true,
            keep_background_audio: false,
            background_audio_volume: 0.2,
            subtitles_dir: None,
            encoding: EncodingSettings::default(),
            cleanup_temp_files: true,
        }
    }
}
