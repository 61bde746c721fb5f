//! Модуль композиции таймлайна
//!
//! Этот модуль размещает элементы наложения и аудиодорожки относительно
//! абсолютного таймлайна видео и сводит их в плоское описание композиции
//! для внешнего кодировщика.

use std::path::{Path, PathBuf};
use crate::error::{CaptionSyncError, Result};
use crate::timeline::element::{OverlayContent, OverlayElement, OverlayPosition};

/// Базовая дорожка: фоновое видео и дорожка озвучки
#[derive(Debug, Clone)]
pub struct BaseTrack {
    /// Путь к видеофайлу
    pub video_path: PathBuf,
    /// Путь к аудиофайлу озвучки; None оставляет звук исходного видео
    pub narration_path: Option<PathBuf>,
    /// Длительность видео в секундах
    pub duration: f64,
    /// Ширина кадра в пикселях
    pub width: u32,
    /// Высота кадра в пикселях
    pub height: u32,
}

impl BaseTrack {
    /// Создать базовую дорожку
    pub fn new(
        video_path: impl Into<PathBuf>,
        narration_path: Option<PathBuf>,
        duration: f64,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let video_path = video_path.into();
        if !video_path.exists() {
            return Err(CaptionSyncError::Composition(format!(
                "Base video track not found: {}",
                video_path.display()
            )));
        }
        if !duration.is_finite() || duration <= 0.0 {
            return Err(CaptionSyncError::Composition(format!(
                "Base track duration must be positive, got {}",
                duration
            )));
        }

        Ok(Self { video_path, narration_path, duration, width, height })
    }
}

/// Таймлайн: базовая дорожка и упорядоченный набор элементов наложения
///
/// Элементы могут пересекаться по времени — они компонуются, а не
/// конфликтуют; более поздние элементы рисуются поверх более ранних.
#[derive(Debug)]
pub struct Timeline {
    base: BaseTrack,
    elements: Vec<OverlayElement>,
}

/// Плоское описание композиции для передачи кодировщику
#[derive(Debug)]
pub struct FlattenedTimeline {
    /// Базовая дорожка
    pub base: BaseTrack,
    /// Элементы в порядке отрисовки
    pub elements: Vec<OverlayElement>,
}

impl Timeline {
    /// Создать таймлайн поверх базовой дорожки
    pub fn new(base: BaseTrack) -> Self {
        Self { base, elements: Vec::new() }
    }

    /// Получить базовую дорожку
    pub fn base(&self) -> &BaseTrack {
        &self.base
    }

    /// Получить размещённые элементы
    pub fn elements(&self) -> &[OverlayElement] {
        &self.elements
    }

    /// Разместить субтитры на таймлайне
    ///
    /// Элементы добавляются в порядке следования; порядок отрисовки —
    /// порядок вставки.
    pub fn place_captions(&mut self, captions: Vec<OverlayElement>) {
        log::info!("Placing {} caption overlays on the timeline", captions.len());
        self.elements.extend(captions);
    }

    /// Разместить изображения по фиксированным слотам
    ///
    /// Изображение i занимает интервал `[i*slot, (i+1)*slot)`. Последний
    /// слот укорачивается до конца базовой дорожки; None оставляет слот
    /// пустым; слоты за пределами дорожки пропускаются.
    pub fn place_images(&mut self, images: &[Option<PathBuf>], slot_duration: f64) {
        if slot_duration <= 0.0 {
            log::warn!("Image slot duration {} is not positive, skipping images", slot_duration);
            return;
        }

        let mut placed = 0;
        for (slot, image) in images.iter().enumerate() {
            let image_path = match image {
                Some(path) => path,
                None => continue,
            };

            let start = slot as f64 * slot_duration;
            if start >= self.base.duration {
                log::warn!(
                    "Image slot {} starts at {:.1}s beyond track duration {:.1}s, skipping",
                    slot,
                    start,
                    self.base.duration
                );
                continue;
            }

            let duration = slot_duration.min(self.base.duration - start);
            let element = OverlayElement::new(
                start,
                duration,
                OverlayPosition::CenterAbsolute { y: 70 },
                OverlayContent::Picture(image_path.clone()),
            );

            match element {
                Some(element) => {
                    self.elements.push(element);
                    placed += 1;
                }
                None => log::warn!("Dropping image slot {} with invalid interval", slot),
            }
        }

        log::info!("Placed {} image overlays on the timeline", placed);
    }

    /// Свести таймлайн в плоское описание композиции
    pub fn flatten(self) -> Result<FlattenedTimeline> {
        if !self.base.video_path.exists() {
            return Err(CaptionSyncError::Composition(format!(
                "Base video track disappeared before flattening: {}",
                self.base.video_path.display()
            )));
        }

        Ok(FlattenedTimeline {
            base: self.base,
            elements: self.elements,
        })
    }
}

/// Проверка существования файла дорожки
pub fn validate_track_file(path: &Path, description: &str) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(CaptionSyncError::Composition(format!(
            "Input {} file not found: {}",
            description,
            path.display()
        )))
    }
}
