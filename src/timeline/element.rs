//! Модуль элементов наложения
//!
//! Этот модуль содержит типы позиционированных визуальных элементов,
//! привязанных к интервалу времени таймлайна.

use std::path::PathBuf;
use image::RgbaImage;

/// Позиция элемента в кадре
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayPosition {
    /// По центру горизонтали, вертикаль как доля высоты кадра (0.0 - 1.0)
    CenterRelative {
        /// Относительная вертикальная позиция
        y: f32,
    },
    /// По центру горизонтали, вертикаль в пикселях от верха кадра
    CenterAbsolute {
        /// Вертикальная позиция в пикселях
        y: i32,
    },
}

/// Содержимое элемента наложения
#[derive(Debug, Clone)]
pub enum OverlayContent {
    /// Отрисованный блок текста субтитра
    TextBlock(RgbaImage),
    /// Иллюстративное изображение
    Picture(PathBuf),
}

/// Позиционированный визуальный элемент с интервалом времени
///
/// Элемент принадлежит одному таймлайну на время одного рендеринга и
/// не переиспользуется между рендерингами.
#[derive(Debug, Clone)]
pub struct OverlayElement {
    /// Время начала показа в секундах
    pub start: f64,
    /// Длительность показа в секундах
    pub duration: f64,
    /// Позиция в кадре
    pub position: OverlayPosition,
    /// Содержимое
    pub content: OverlayContent,
}

impl OverlayElement {
    /// Создать новый элемент наложения
    ///
    /// Возвращает None для неположительной или бесконечной длительности:
    /// интервал `[start, start + duration)` обязан быть корректным.
    pub fn new(
        start: f64,
        duration: f64,
        position: OverlayPosition,
        content: OverlayContent,
    ) -> Option<Self> {
        if !start.is_finite() || !duration.is_finite() || start < 0.0 || duration <= 0.0 {
            return None;
        }

        Some(Self { start, duration, position, content })
    }

    /// Время окончания показа в секундах
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn picture() -> OverlayContent {
        OverlayContent::Picture(PathBuf::from("image.png"))
    }

    #[test]
    fn test_non_positive_duration_is_rejected() {
        let position = OverlayPosition::CenterRelative { y: 0.4 };
        assert!(OverlayElement::new(0.0, 0.0, position, picture()).is_none());
        assert!(OverlayElement::new(0.0, -1.0, position, picture()).is_none());
        assert!(OverlayElement::new(-0.5, 1.0, position, picture()).is_none());
    }

    #[test]
    fn test_end_is_start_plus_duration() {
        let position = OverlayPosition::CenterAbsolute { y: 70 };
        let element = OverlayElement::new(2.0, 3.5, position, picture()).unwrap();
        assert!((element.end() - 5.5).abs() < f64::EPSILON);
    }
}
