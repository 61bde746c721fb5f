//! Основной файл библиотеки caption-sync с поддержкой системы прогресса и уведомлений
//!
//! Эта библиотека превращает фоновое видео, дорожку озвучки и набор
//! иллюстраций в готовый короткий ролик с синхронизированными пословными
//! субтитрами, с возможностью отслеживания прогресса выполнения операций.

pub mod progress;
pub mod notification;
pub mod config;
pub mod error;
pub mod time;
pub mod recognizer;
pub mod subtitle;
pub mod render;
pub mod timeline;
pub mod media;
pub mod utils;

use std::path::PathBuf;
use crate::config::CaptionSyncConfig;
use crate::error::{CaptionSyncError, Result};
use crate::progress::{ProgressTracker, ProgressObserver, ProgressReporter, ProcessStep};
use crate::recognizer::{SpeechRecognizer, WhisperApiRecognizer};
use crate::render::CaptionLayoutEngine;
use crate::subtitle::corrector::WordCorrector;
use crate::timeline::{BaseTrack, Timeline};
use crate::utils::temp::TempFileManager;

/// Основная структура для работы с библиотекой
pub struct CaptionSync {
    /// Конфигурация библиотеки
    config: CaptionSyncConfig,
    /// Трекер прогресса
    progress_tracker: Option<ProgressTracker>,
    /// Распознаватель речи; None создаёт распознаватель из конфигурации
    recognizer: Option<Box<dyn SpeechRecognizer>>,
}

impl CaptionSync {
    /// Создать новый экземпляр CaptionSync с указанной конфигурацией
    pub fn new(config: CaptionSyncConfig) -> Self {
        Self {
            config,
            progress_tracker: None,
            recognizer: None,
        }
    }

    /// Создать новый экземпляр CaptionSync с указанной конфигурацией и репортером прогресса
    pub fn with_progress_reporter(config: CaptionSyncConfig, reporter: Box<dyn ProgressReporter>) -> Self {
        let mut tracker = ProgressTracker::new();
        tracker.set_reporter(reporter);

        Self {
            config,
            progress_tracker: Some(tracker),
            recognizer: None,
        }
    }

    /// Установить распознаватель речи
    ///
    /// Позволяет подменить распознаватель, например на локальный или на
    /// заглушку в тестах.
    pub fn with_recognizer(mut self, recognizer: Box<dyn SpeechRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    /// Установить репортер прогресса
    pub fn set_progress_reporter(&mut self, reporter: Box<dyn ProgressReporter>) {
        if let Some(tracker) = &mut self.progress_tracker {
            tracker.set_reporter(reporter);
        } else {
            let mut tracker = ProgressTracker::new();
            tracker.set_reporter(reporter);
            self.progress_tracker = Some(tracker);
        }
    }

    /// Добавить наблюдателя прогресса
    pub fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) -> Result<usize> {
        if let Some(tracker) = &mut self.progress_tracker {
            Ok(tracker.add_observer(observer).unwrap_or(0))
        } else {
            let mut tracker = ProgressTracker::new();
            let id = tracker.add_observer(observer).unwrap_or(0);
            self.progress_tracker = Some(tracker);
            Ok(id)
        }
    }

    /// Основной метод генерации видео с субтитрами
    ///
    /// Принимает фоновое видео, дорожку озвучки и список иллюстраций по
    /// слотам; возвращает путь к итоговому файлу.
    pub async fn process(
        &self,
        video_path: &str,
        narration_path: &str,
        images: &[Option<PathBuf>],
        output_path: &str,
    ) -> Result<String> {
        log::info!("Starting captioned video generation");

        let tracker_ref = self.progress_tracker.as_ref();
        let mut temp = TempFileManager::new(self.config.cleanup_temp_files)?;

        // Проверка входных файлов
        log::info!("Validating input files");
        if let Some(t) = tracker_ref {
            t.set_step(ProcessStep::Transcription);
            t.update_step_progress(0.0, Some("Проверка входных файлов".to_string()));
        }

        for (file_path, description) in [
            (video_path, "video"),
            (narration_path, "narration audio"),
        ] {
            if tokio::fs::metadata(file_path).await.is_err() {
                let error = format!("Input {} file not found: {}", description, file_path);
                log::error!("{}", error);
                return Err(CaptionSyncError::FileNotFound(error));
            }
        }

        // 1. Распознавание речи
        let owned_recognizer;
        let recognizer: &dyn SpeechRecognizer = match &self.recognizer {
            Some(recognizer) => recognizer.as_ref(),
            None => {
                owned_recognizer = WhisperApiRecognizer::from_config(&self.config)?;
                &owned_recognizer
            }
        };

        if let Some(t) = tracker_ref {
            t.update_step_progress(10.0, Some("Начало распознавания речи".to_string()));
        }

        let transcription = recognizer.transcribe(narration_path).await?;

        if let Some(t) = tracker_ref {
            t.update_step_progress(100.0, Some("Распознавание речи завершено".to_string()));
        }

        // 2. Коррекция слов и группировка в субтитры
        if let Some(t) = tracker_ref {
            t.set_step(ProcessStep::Segmentation);
        }

        let corrector = WordCorrector::new(&self.config.aliases)?;
        let cues = subtitle::segmenter::segment_transcription(
            &transcription,
            &self.config.grouping,
            &corrector,
        );

        if let Some(t) = tracker_ref {
            t.update_step_progress(100.0, Some(format!("Сгруппировано {} субтитров", cues.len())));
        }

        // 3. Сохранение файла субтитров
        if let Some(t) = tracker_ref {
            t.set_step(ProcessStep::SubtitleWriting);
        }

        if cues.is_empty() {
            log::warn!("Transcription produced no cues, skipping subtitle file");
        } else {
            let subtitles_dir = match &self.config.subtitles_dir {
                Some(dir) => PathBuf::from(dir),
                None => temp.temp_dir_path().to_path_buf(),
            };
            let subtitle_path = subtitle::store::save_unique(&cues, &subtitles_dir)?;
            log::info!("Subtitles saved to {}", subtitle_path.display());
        }

        if let Some(t) = tracker_ref {
            t.update_step_progress(100.0, None);
        }

        // 4. Анализ и подготовка фонового видео
        if let Some(t) = tracker_ref {
            t.set_step(ProcessStep::MediaPreparation);
            t.update_step_progress(0.0, Some("Анализ фонового видео".to_string()));
        }

        let video_info = media::video::probe_video(video_path)?;
        let narration_duration = media::audio::get_audio_duration(narration_path)?;

        let (prepared_video, base_duration) = if self.config.cut_to_narration {
            let (start, end) =
                media::video::pick_clip_window(video_info.duration, narration_duration)?;
            let cut_path = temp.create_temp_path("background", "mp4");
            media::video::cut_video(
                video_path,
                start,
                end,
                &cut_path.display().to_string(),
            )?;
            (cut_path, end - start)
        } else {
            (PathBuf::from(video_path), video_info.duration)
        };

        let (frame_width, frame_height) = if self.config.crop_vertical {
            media::video::vertical_crop_size(video_info.width, video_info.height)
        } else {
            (video_info.width, video_info.height)
        };

        let final_narration = if self.config.keep_background_audio {
            let mixed_path = temp.create_temp_path("mixed_audio", "m4a");
            media::audio::mix_audio_tracks(
                narration_path,
                &prepared_video.display().to_string(),
                self.config.background_audio_volume,
                &mixed_path.display().to_string(),
            )?;
            mixed_path
        } else {
            PathBuf::from(narration_path)
        };

        if let Some(t) = tracker_ref {
            t.update_step_progress(100.0, Some("Фоновое видео подготовлено".to_string()));
        }

        // 5. Компоновка и отрисовка блоков субтитров
        if let Some(t) = tracker_ref {
            t.set_step(ProcessStep::CaptionLayout);
        }

        let layout_engine = CaptionLayoutEngine::new(&self.config.style)?;
        let caption_overlays = layout_engine.layout_cues(&cues);

        if let Some(t) = tracker_ref {
            t.update_step_progress(100.0, Some(format!(
                "Отрисовано {} блоков субтитров",
                caption_overlays.len()
            )));
        }

        // 6. Сборка таймлайна и кодирование итогового видео
        if let Some(t) = tracker_ref {
            t.set_step(ProcessStep::Rendering);
            t.update_step_progress(0.0, Some("Сборка таймлайна".to_string()));
        }

        let base = BaseTrack::new(
            prepared_video,
            Some(final_narration),
            base_duration,
            frame_width,
            frame_height,
        )?;

        let mut timeline = Timeline::new(base);
        timeline.place_captions(caption_overlays);
        timeline.place_images(images, self.config.image_slot_duration);

        let flattened = timeline.flatten()?;
        let output_file = media::encoder::render_timeline(
            flattened,
            &self.config.encoding,
            self.config.crop_vertical,
            &mut temp,
            output_path,
        )
        .map_err(|e| {
            log::error!("Video encoding failed: {}", e);
            e
        })?;

        temp.cleanup();

        if let Some(t) = tracker_ref {
            t.update_step_progress(100.0, Some("Кодирование завершено".to_string()));
            t.complete();
        }

        log::info!("Captioned video generation completed successfully");
        Ok(output_file)
    }
}

/// Публичный API для удобного использования
pub async fn generate_captioned_video(
    video_path: &str,
    narration_path: &str,
    images: &[Option<PathBuf>],
    output_path: &str,
    openai_api_key: &str,
) -> Result<String> {
    let config = CaptionSyncConfig {
        openai_api_key: openai_api_key.to_string(),
        ..CaptionSyncConfig::default()
    };

    let caption_sync = CaptionSync::new(config);
    caption_sync.process(video_path, narration_path, images, output_path).await
}

/// Публичный API с поддержкой отслеживания прогресса
pub async fn generate_captioned_video_with_progress(
    video_path: &str,
    narration_path: &str,
    images: &[Option<PathBuf>],
    output_path: &str,
    openai_api_key: &str,
    reporter: Box<dyn ProgressReporter>,
) -> Result<String> {
    let config = CaptionSyncConfig {
        openai_api_key: openai_api_key.to_string(),
        ..CaptionSyncConfig::default()
    };

    let caption_sync = CaptionSync::with_progress_reporter(config, reporter);
    caption_sync.process(video_path, narration_path, images, output_path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::recognizer::Transcription;

    struct StubRecognizer;

    #[async_trait]
    impl SpeechRecognizer for StubRecognizer {
        async fn transcribe(&self, _audio_path: &str) -> Result<Transcription> {
            Ok(Transcription::default())
        }
    }

    #[tokio::test]
    async fn test_missing_video_is_not_found() {
        let caption_sync = CaptionSync::new(CaptionSyncConfig::default())
            .with_recognizer(Box::new(StubRecognizer));

        let result = caption_sync
            .process("/nonexistent/video.mp4", "/nonexistent/audio.mp3", &[], "out.mp4")
            .await;

        assert!(matches!(result, Err(CaptionSyncError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn test_missing_narration_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let video_path = dir.path().join("video.mp4");
        std::fs::write(&video_path, b"stub").unwrap();

        let caption_sync = CaptionSync::new(CaptionSyncConfig::default())
            .with_recognizer(Box::new(StubRecognizer));

        let result = caption_sync
            .process(
                &video_path.display().to_string(),
                "/nonexistent/audio.mp3",
                &[],
                "out.mp4",
            )
            .await;

        assert!(matches!(result, Err(CaptionSyncError::FileNotFound(_))));
    }
}
