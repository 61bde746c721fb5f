//! Модуль компоновки и растеризации субтитров
//!
//! Этот модуль превращает текст субтитра в позиционированный элемент
//! наложения: переносит строки по ширине кадра, вычисляет размер блока
//! и отрисовывает текст с тенью на прозрачном холсте.

use ab_glyph::{FontVec, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use crate::config::CaptionStyle;
use crate::error::{CaptionSyncError, Result};
use crate::subtitle::Cue;
use crate::timeline::{OverlayContent, OverlayElement, OverlayPosition};

/// Движок компоновки субтитров
pub struct CaptionLayoutEngine {
    font: FontVec,
    style: CaptionStyle,
    color: Rgba<u8>,
    shadow_color: Rgba<u8>,
}

impl CaptionLayoutEngine {
    /// Создать движок компоновки из стиля
    ///
    /// Шрифт загружается один раз на весь процесс; цвета разбираются
    /// заранее, чтобы ошибка конфигурации обнаруживалась до рендеринга.
    pub fn new(style: &CaptionStyle) -> Result<Self> {
        if style.font_path.trim().is_empty() {
            return Err(CaptionSyncError::Configuration(
                "Caption font path is not set".to_string(),
            ));
        }

        let font_data = std::fs::read(&style.font_path).map_err(|e| {
            CaptionSyncError::Configuration(format!(
                "Failed to read font file {}: {}",
                style.font_path, e
            ))
        })?;
        let font = FontVec::try_from_vec(font_data).map_err(|_| {
            CaptionSyncError::Configuration(format!(
                "Invalid font file: {}",
                style.font_path
            ))
        })?;

        let color = parse_color(&style.color)?;
        let shadow_color = parse_color(&style.shadow_color)?;

        Ok(Self {
            font,
            style: style.clone(),
            color,
            shadow_color,
        })
    }

    /// Скомпоновать все субтитры в элементы наложения
    ///
    /// Ошибка отрисовки одного субтитра записывается в журнал и субтитр
    /// отбрасывается; остальные субтитры обрабатываются дальше.
    pub fn layout_cues(&self, cues: &[Cue]) -> Vec<OverlayElement> {
        let elements = layout_with(cues, |cue| self.render_cue(cue));
        log::info!(
            "Successfully rendered {} of {} caption overlays",
            elements.len(),
            cues.len()
        );
        elements
    }

    /// Отрисовать один субтитр в элемент наложения
    pub fn render_cue(&self, cue: &Cue) -> Result<OverlayElement> {
        // Текст субтитров отображается в верхнем регистре
        let text = cue.text.to_uppercase();
        if text.trim().is_empty() {
            return Err(CaptionSyncError::Layout(format!(
                "Cue {} has no renderable text",
                cue.index
            )));
        }

        let max_chars = max_chars_per_line(self.style.frame_width, self.style.font_size);
        if max_chars == 0 {
            return Err(CaptionSyncError::Layout(format!(
                "Frame width {} is too small for font size {}",
                self.style.frame_width, self.style.font_size
            )));
        }

        let lines = wrap_text(&text, max_chars);
        if lines.is_empty() {
            return Err(CaptionSyncError::Layout(format!(
                "Cue {} produced no lines after wrapping",
                cue.index
            )));
        }

        let line_height = (self.style.font_size * self.style.line_height_factor).round() as u32;
        let block_height = lines.len() as u32 * line_height;
        let block_width = self.style.frame_width;

        let scale = PxScale::from(self.style.font_size);
        let shadow_offset = (self.style.font_size / 10.0).round() as i32;

        // Прозрачный холст размером с блок текста
        let mut canvas = RgbaImage::new(block_width, block_height);

        for (i, line) in lines.iter().enumerate() {
            let (line_width, _) = text_size(scale, &self.font, line);
            let x = if line_width < block_width {
                ((block_width - line_width) / 2) as i32
            } else {
                0
            };
            let y = i as u32 * line_height;

            // Два прохода: тень со смещением, затем основной цвет
            draw_text_mut(
                &mut canvas,
                self.shadow_color,
                x + shadow_offset,
                y as i32 + shadow_offset,
                scale,
                &self.font,
                line,
            );
            draw_text_mut(&mut canvas, self.color, x, y as i32, scale, &self.font, line);
        }

        let start = cue.start.as_seconds();
        let duration = cue.end.as_seconds() - start;

        OverlayElement::new(
            start,
            duration,
            OverlayPosition::CenterRelative { y: self.style.vertical_position },
            OverlayContent::TextBlock(canvas),
        )
        .ok_or_else(|| {
            CaptionSyncError::Layout(format!(
                "Cue {} has a zero-length display interval",
                cue.index
            ))
        })
    }
}

/// Компоновка списка субтитров с изоляцией отказов
///
/// Один неудачный субтитр никогда не прерывает всю дорожку.
fn layout_with<F>(cues: &[Cue], render: F) -> Vec<OverlayElement>
where
    F: Fn(&Cue) -> Result<OverlayElement>,
{
    let mut elements = Vec::with_capacity(cues.len());

    for cue in cues {
        match render(cue) {
            Ok(element) => elements.push(element),
            Err(e) => log::error!("Error processing cue {}: {}", cue.index, e),
        }
    }

    elements
}

/// Максимальное число символов в строке для ширины кадра
///
/// Приближение средней ширины глифа как 0.6 от размера шрифта.
fn max_chars_per_line(frame_width: u32, font_size: f32) -> usize {
    (frame_width as f32 / (font_size * 0.6)).floor() as usize
}

/// Жадный перенос слов по строкам
///
/// Явные переносы во входном тексте сохраняются; слово длиннее лимита
/// занимает собственную строку и никогда не разрывается.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for input_line in text.split('\n') {
        let mut current = String::new();

        for word in input_line.split_whitespace() {
            if current.is_empty() {
                current = word.to_string();
            } else if current.len() + 1 + word.len() <= max_chars {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(current);
                current = word.to_string();
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

/// Разбор цвета из "#RRGGBB" или имени
fn parse_color(value: &str) -> Result<Rgba<u8>> {
    let value = value.trim();

    if let Some(hex) = value.strip_prefix('#') {
        if hex.len() != 6 {
            return Err(CaptionSyncError::Configuration(format!(
                "Expected #RRGGBB color, got: {}",
                value
            )));
        }
        let parsed = u32::from_str_radix(hex, 16).map_err(|_| {
            CaptionSyncError::Configuration(format!("Invalid hex color: {}", value))
        })?;
        let r = ((parsed >> 16) & 0xFF) as u8;
        let g = ((parsed >> 8) & 0xFF) as u8;
        let b = (parsed & 0xFF) as u8;
        return Ok(Rgba([r, g, b, 255]));
    }

    match value.to_ascii_lowercase().as_str() {
        "white" => Ok(Rgba([255, 255, 255, 255])),
        "black" => Ok(Rgba([0, 0, 0, 255])),
        "cyan" => Ok(Rgba([0, 255, 255, 255])),
        "yellow" => Ok(Rgba([255, 255, 0, 255])),
        "red" => Ok(Rgba([255, 0, 0, 255])),
        other => Err(CaptionSyncError::Configuration(format!(
            "Unknown color name: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::SrtTime;

    fn cue(index: usize, start_ms: u64, end_ms: u64, text: &str) -> Cue {
        Cue::new(
            index,
            SrtTime::from_ordinal(start_ms),
            SrtTime::from_ordinal(end_ms),
            text,
        )
        .unwrap()
    }

    #[test]
    fn test_wrap_packs_words_greedily() {
        let lines = wrap_text("ONE TWO THREE FOUR", 9);
        assert_eq!(lines, vec!["ONE TWO", "THREE", "FOUR"]);
    }

    #[test]
    fn test_wrap_never_splits_long_word() {
        let lines = wrap_text("EXTRAORDINARILY LONG", 5);
        assert_eq!(lines, vec!["EXTRAORDINARILY", "LONG"]);
    }

    #[test]
    fn test_wrap_preserves_explicit_line_breaks() {
        let lines = wrap_text("FIRST LINE\nSECOND LINE", 30);
        assert_eq!(lines, vec!["FIRST LINE", "SECOND LINE"]);
    }

    #[test]
    fn test_max_chars_per_line() {
        // floor(540 / (60 * 0.6)) = 15
        assert_eq!(max_chars_per_line(540, 60.0), 15);
        assert_eq!(max_chars_per_line(10, 60.0), 0);
    }

    #[test]
    fn test_parse_color_hex_and_names() {
        assert_eq!(parse_color("#BA4A00").unwrap(), Rgba([0xBA, 0x4A, 0x00, 255]));
        assert_eq!(parse_color("white").unwrap(), Rgba([255, 255, 255, 255]));
        assert_eq!(parse_color("Cyan").unwrap(), Rgba([0, 255, 255, 255]));
        assert!(parse_color("#XYZ").is_err());
        assert!(parse_color("chartreuse-ish").is_err());
    }

    #[test]
    fn test_single_failing_cue_is_isolated() {
        let cues: Vec<Cue> = (1..=10)
            .map(|i| cue(i, i as u64 * 1000, i as u64 * 1000 + 500, "text"))
            .collect();

        // Отрисовка отказывает только для субтитра с номером 3
        let elements = layout_with(&cues, |cue| {
            if cue.index == 3 {
                Err(CaptionSyncError::Layout("synthetic failure".to_string()))
            } else {
                OverlayElement::new(
                    cue.start.as_seconds(),
                    cue.duration_seconds(),
                    OverlayPosition::CenterRelative { y: 0.4 },
                    OverlayContent::Picture(std::path::PathBuf::from("stub.png")),
                )
                .ok_or_else(|| CaptionSyncError::Layout("bad interval".to_string()))
            }
        });

        assert_eq!(elements.len(), 9);
        assert!(elements.iter().all(|e| (e.start - 3.0).abs() > f64::EPSILON));
    }

    #[test]
    fn test_overlay_timing_comes_from_cue() {
        let cue = cue(1, 2_000, 3_500, "text");
        let element = OverlayElement::new(
            cue.start.as_seconds(),
            cue.duration_seconds(),
            OverlayPosition::CenterRelative { y: 0.4 },
            OverlayContent::Picture(std::path::PathBuf::from("stub.png")),
        )
        .unwrap();

        assert!((element.start - 2.0).abs() < f64::EPSILON);
        assert!((element.duration - 1.5).abs() < f64::EPSILON);
    }
}
