//! Модуль кодирования итоговой композиции
//!
//! Этот модуль превращает плоское описание таймлайна в команду FFmpeg:
//! отрисованные блоки текста сохраняются во временные PNG, элементы
//! наложения собираются в цепочку фильтров overlay, итог кодируется в
//! один видеофайл.

use std::path::PathBuf;
use crate::config::EncodingSettings;
use crate::error::{CaptionSyncError, Result};
use crate::media::video::vertical_crop_filter;
use crate::timeline::{FlattenedTimeline, OverlayContent, OverlayElement, OverlayPosition};
use crate::utils::ffmpeg::run_ffmpeg_command;
use crate::utils::temp::TempFileManager;

/// Подготовленный к наложению элемент
struct OverlayInput {
    /// Путь к файлу изображения
    path: PathBuf,
    /// Время начала показа в секундах
    start: f64,
    /// Время окончания показа в секундах
    end: f64,
    /// Выражение вертикальной позиции для фильтра overlay
    y_expr: String,
    /// Высота для масштабирования; None сохраняет исходный размер
    scale_height: Option<u32>,
}

/// Закодировать таймлайн в итоговый видеофайл
///
/// Возвращает путь к созданному файлу.
pub fn render_timeline(
    timeline: FlattenedTimeline,
    encoding: &EncodingSettings,
    crop_vertical: bool,
    temp: &mut TempFileManager,
    output_path: &str,
) -> Result<String> {
    let base = &timeline.base;
    let overlays = materialize_overlays(&timeline.elements, base.height, temp)?;

    log::info!(
        "Encoding timeline with {} overlays into {}",
        overlays.len(),
        output_path
    );

    // Вход 0 - видео, вход 1 - озвучка (если есть), далее наложения
    let overlay_input_offset = if base.narration_path.is_some() { 2 } else { 1 };
    let filter_graph =
        build_filter_graph(&overlays, overlay_input_offset, encoding.fps, crop_vertical);

    let mut args: Vec<String> = vec!["-y".to_string()];
    args.push("-i".to_string());
    args.push(base.video_path.display().to_string());

    if let Some(narration) = &base.narration_path {
        args.push("-i".to_string());
        args.push(narration.display().to_string());
    }

    for overlay in &overlays {
        args.push("-i".to_string());
        args.push(overlay.path.display().to_string());
    }

    args.push("-filter_complex".to_string());
    args.push(filter_graph);
    args.push("-map".to_string());
    args.push("[vout]".to_string());
    args.push("-map".to_string());
    if base.narration_path.is_some() {
        args.push("1:a".to_string());
    } else {
        args.push("0:a?".to_string());
    }

    args.push("-c:v".to_string());
    args.push(encoding.video_codec.clone());
    args.push("-preset".to_string());
    args.push(encoding.preset.clone());
    args.push("-crf".to_string());
    args.push(encoding.crf.to_string());
    args.push("-c:a".to_string());
    args.push(encoding.audio_codec.clone());
    args.push("-b:a".to_string());
    args.push(encoding.audio_bitrate.clone());
    args.push("-shortest".to_string());
    args.push(output_path.to_string());

    run_ffmpeg_command(&args)?;

    log::info!("Encoding completed: {}", output_path);
    Ok(output_path.to_string())
}

/// Сохранить блоки текста во временные PNG и собрать список наложений
///
/// Иллюстративные изображения масштабируются до трети высоты кадра;
/// блоки текста накладываются в исходном размере.
fn materialize_overlays(
    elements: &[OverlayElement],
    base_height: u32,
    temp: &mut TempFileManager,
) -> Result<Vec<OverlayInput>> {
    // Чётная высота обязательна для yuv420p
    let picture_height = (base_height / 3) & !1;
    let mut overlays = Vec::with_capacity(elements.len());

    for element in elements {
        let (path, scale_height) = match &element.content {
            OverlayContent::TextBlock(canvas) => {
                let path = temp.create_temp_path("caption", "png");
                canvas.save(&path).map_err(|e| {
                    CaptionSyncError::Rendering(format!(
                        "Failed to save caption overlay {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                (path, None)
            }
            OverlayContent::Picture(picture_path) => {
                if !picture_path.exists() {
                    return Err(CaptionSyncError::FileNotFound(
                        picture_path.display().to_string(),
                    ));
                }
                (picture_path.clone(), Some(picture_height))
            }
        };

        overlays.push(OverlayInput {
            path,
            start: element.start,
            end: element.end(),
            y_expr: position_expression(&element.position),
            scale_height,
        });
    }

    Ok(overlays)
}

/// Выражение вертикальной позиции для фильтра overlay
fn position_expression(position: &OverlayPosition) -> String {
    match position {
        OverlayPosition::CenterRelative { y } => format!("H*{:.4}", y),
        OverlayPosition::CenterAbsolute { y } => y.to_string(),
    }
}

/// Собрать граф фильтров цепочки наложений
///
/// Каждый элемент накладывается поверх предыдущего результата и виден
/// только внутри интервала `between(t, start, end)`.
fn build_filter_graph(
    overlays: &[OverlayInput],
    input_offset: usize,
    fps: u32,
    crop_vertical: bool,
) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut current = "[bg0]".to_string();

    if crop_vertical {
        parts.push(format!("[0:v]{},fps={}[bg0]", vertical_crop_filter(), fps));
    } else {
        parts.push(format!("[0:v]fps={}[bg0]", fps));
    }

    for (i, overlay) in overlays.iter().enumerate() {
        let input_label = match overlay.scale_height {
            Some(height) => {
                let scaled = format!("[img{}]", i);
                parts.push(format!(
                    "[{}:v]scale=-2:{}{}",
                    input_offset + i,
                    height,
                    scaled
                ));
                scaled
            }
            None => format!("[{}:v]", input_offset + i),
        };

        let out_label = format!("[v{}]", i);
        parts.push(format!(
            "{}{}overlay=x=(W-w)/2:y={}:enable='between(t,{:.3},{:.3})'{}",
            current, input_label, overlay.y_expr, overlay.start, overlay.end, out_label
        ));
        current = out_label;
    }

    parts.push(format!("{}format=yuv420p[vout]", current));
    parts.join(";")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlay(start: f64, end: f64, y_expr: &str, scale_height: Option<u32>) -> OverlayInput {
        OverlayInput {
            path: PathBuf::from("stub.png"),
            start,
            end,
            y_expr: y_expr.to_string(),
            scale_height,
        }
    }

    #[test]
    fn test_position_expressions() {
        assert_eq!(
            position_expression(&OverlayPosition::CenterRelative { y: 0.4 }),
            "H*0.4000"
        );
        assert_eq!(
            position_expression(&OverlayPosition::CenterAbsolute { y: 70 }),
            "70"
        );
    }

    #[test]
    fn test_filter_graph_without_overlays() {
        let graph = build_filter_graph(&[], 1, 30, false);
        assert_eq!(graph, "[0:v]fps=30[bg0];[bg0]format=yuv420p[vout]");
    }

    #[test]
    fn test_filter_graph_with_vertical_crop() {
        let graph = build_filter_graph(&[], 1, 30, true);
        assert_eq!(
            graph,
            "[0:v]crop=ih*9/16:ih:(iw-ih*9/16)/2:0,fps=30[bg0];[bg0]format=yuv420p[vout]"
        );
    }

    #[test]
    fn test_filter_graph_chains_overlays_in_order() {
        let overlays = vec![
            overlay(0.0, 1.5, "H*0.4000", None),
            overlay(1.5, 3.0, "70", Some(320)),
        ];
        let graph = build_filter_graph(&overlays, 2, 30, false);

        assert_eq!(
            graph,
            "[0:v]fps=30[bg0];\
             [bg0][2:v]overlay=x=(W-w)/2:y=H*0.4000:enable='between(t,0.000,1.500)'[v0];\
             [3:v]scale=-2:320[img1];\
             [v0][img1]overlay=x=(W-w)/2:y=70:enable='between(t,1.500,3.000)'[v1];\
             [v1]format=yuv420p[vout]"
        );
    }

    #[test]
    fn test_text_blocks_are_saved_as_png() {
        let mut temp = TempFileManager::new(true).unwrap();
        let canvas = image::RgbaImage::new(16, 16);
        let elements = vec![OverlayElement::new(
            0.0,
            1.0,
            OverlayPosition::CenterRelative { y: 0.4 },
            OverlayContent::TextBlock(canvas),
        )
        .unwrap()];

        let overlays = materialize_overlays(&elements, 960, &mut temp).unwrap();
        assert_eq!(overlays.len(), 1);
        assert!(overlays[0].path.exists());
        assert_eq!(overlays[0].scale_height, None);
    }

    #[test]
    fn test_missing_picture_is_not_found() {
        let mut temp = TempFileManager::new(true).unwrap();
        let elements = vec![OverlayElement::new(
            0.0,
            1.0,
            OverlayPosition::CenterAbsolute { y: 70 },
            OverlayContent::Picture(PathBuf::from("/nonexistent/picture.png")),
        )
        .unwrap()];

        let result = materialize_overlays(&elements, 960, &mut temp);
        assert!(matches!(result, Err(CaptionSyncError::FileNotFound(_))));
    }

    #[test]
    fn test_picture_height_is_even_third_of_frame() {
        let mut temp = TempFileManager::new(true).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let picture_path = dir.path().join("picture.png");
        image::RgbaImage::new(8, 8).save(&picture_path).unwrap();

        let elements = vec![OverlayElement::new(
            0.0,
            1.0,
            OverlayPosition::CenterAbsolute { y: 70 },
            OverlayContent::Picture(picture_path),
        )
        .unwrap()];

        let overlays = materialize_overlays(&elements, 960, &mut temp).unwrap();
        assert_eq!(overlays[0].scale_height, Some(320));
    }
}
