//! Модуль для работы с видео
//!
//! Этот модуль содержит функции получения информации о видеофайлах,
//! вырезания фрагментов и приведения кадра к вертикальному формату.

use std::path::Path;
use rand::Rng;
use crate::error::{CaptionSyncError, Result};
use crate::utils::ffmpeg::{run_ffmpeg_command, run_ffprobe_command};

/// Информация о видеофайле
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    /// Длительность в секундах
    pub duration: f64,
    /// Ширина кадра в пикселях
    pub width: u32,
    /// Высота кадра в пикселях
    pub height: u32,
    /// Частота кадров
    pub fps: f64,
}

/// Получить информацию о видеофайле
///
/// Запрашивает у ffprobe параметры первого видеопотока и длительность
/// контейнера одним вызовом.
pub fn probe_video(video_path: &str) -> Result<VideoInfo> {
    if !Path::new(video_path).exists() {
        return Err(CaptionSyncError::FileNotFound(video_path.to_string()));
    }

    let output = run_ffprobe_command(&[
        "-v", "error",
        "-select_streams", "v:0",
        "-show_entries", "stream=width,height,r_frame_rate",
        "-show_entries", "format=duration",
        "-of", "default=noprint_wrappers=1",
        video_path,
    ])?;

    parse_probe_output(&output).ok_or_else(|| {
        CaptionSyncError::Other(format!(
            "Failed to parse ffprobe output for {}",
            video_path
        ))
    })
}

/// Разбор вывода ffprobe в формате key=value
fn parse_probe_output(output: &str) -> Option<VideoInfo> {
    let mut width = None;
    let mut height = None;
    let mut fps = None;
    let mut duration = None;

    for line in output.lines() {
        let (key, value) = line.split_once('=')?;
        match key.trim() {
            "width" => width = value.trim().parse::<u32>().ok(),
            "height" => height = value.trim().parse::<u32>().ok(),
            "r_frame_rate" => fps = parse_frame_rate(value.trim()),
            "duration" => duration = value.trim().parse::<f64>().ok(),
            _ => {}
        }
    }

    Some(VideoInfo {
        duration: duration?,
        width: width?,
        height: height?,
        fps: fps?,
    })
}

/// Разбор частоты кадров из дроби вида "30000/1001"
fn parse_frame_rate(value: &str) -> Option<f64> {
    match value.split_once('/') {
        Some((num, den)) => {
            let num = num.trim().parse::<f64>().ok()?;
            let den = den.trim().parse::<f64>().ok()?;
            if den == 0.0 {
                None
            } else {
                Some(num / den)
            }
        }
        None => value.parse::<f64>().ok(),
    }
}

/// Выбрать случайное окно фонового видео под длительность озвучки
///
/// Возвращает пару (начало, конец) в секундах. Если озвучка не короче
/// видео, используется всё видео целиком.
pub fn pick_clip_window(video_duration: f64, narration_duration: f64) -> Result<(f64, f64)> {
    if video_duration <= 0.0 || narration_duration <= 0.0 {
        return Err(CaptionSyncError::Composition(format!(
            "Durations must be positive, got video {} and narration {}",
            video_duration, narration_duration
        )));
    }

    if narration_duration >= video_duration {
        log::warn!(
            "Narration ({:.1}s) is not shorter than background video ({:.1}s), using the whole video",
            narration_duration,
            video_duration
        );
        return Ok((0.0, video_duration));
    }

    let mut rng = rand::thread_rng();
    let start = rng.gen_range(0.0..video_duration - narration_duration);
    Ok((start, start + narration_duration))
}

/// Вырезать фрагмент видео
pub fn cut_video(input_path: &str, start: f64, end: f64, output_path: &str) -> Result<()> {
    if end <= start {
        return Err(CaptionSyncError::Composition(format!(
            "Cut window end {} must be after start {}",
            end, start
        )));
    }

    log::info!("Cutting video fragment {:.2}s - {:.2}s from {}", start, end, input_path);

    let args = vec![
        "-y".to_string(),
        "-ss".to_string(), format!("{:.3}", start),
        "-i".to_string(), input_path.to_string(),
        "-t".to_string(), format!("{:.3}", end - start),
        "-c".to_string(), "copy".to_string(),
        output_path.to_string(),
    ];

    run_ffmpeg_command(&args)
}

/// Фильтр обрезки кадра до вертикального формата 9:16
///
/// Кадр обрезается по центру до соотношения 9:16 с сохранением высоты.
pub fn vertical_crop_filter() -> &'static str {
    "crop=ih*9/16:ih:(iw-ih*9/16)/2:0"
}

/// Размеры кадра после вертикальной обрезки
pub fn vertical_crop_size(width: u32, height: u32) -> (u32, u32) {
    let cropped_width = (height as f64 * 9.0 / 16.0).round() as u32;
    (cropped_width.min(width), height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_output() {
        let output = "width=1920\nheight=1080\nr_frame_rate=30000/1001\nduration=63.52\n";
        let info = parse_probe_output(output).unwrap();
        assert_eq!(info.width, 1920);
        assert_eq!(info.height, 1080);
        assert!((info.fps - 29.97).abs() < 0.01);
        assert!((info.duration - 63.52).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_probe_output_missing_field() {
        let output = "width=1920\nheight=1080\nduration=63.52\n";
        assert!(parse_probe_output(output).is_none());
    }

    #[test]
    fn test_parse_frame_rate_fraction_and_plain() {
        assert_eq!(parse_frame_rate("30/1"), Some(30.0));
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        assert_eq!(parse_frame_rate("30/0"), None);
        assert_eq!(parse_frame_rate("abc"), None);
    }

    #[test]
    fn test_clip_window_fits_inside_video() {
        for _ in 0..100 {
            let (start, end) = pick_clip_window(120.0, 30.0).unwrap();
            assert!(start >= 0.0);
            assert!(end <= 120.0);
            assert!((end - start - 30.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_clip_window_long_narration_uses_whole_video() {
        let (start, end) = pick_clip_window(30.0, 45.0).unwrap();
        assert_eq!(start, 0.0);
        assert_eq!(end, 30.0);
    }

    #[test]
    fn test_clip_window_rejects_non_positive_durations() {
        assert!(pick_clip_window(0.0, 10.0).is_err());
        assert!(pick_clip_window(10.0, -1.0).is_err());
    }

    #[test]
    fn test_vertical_crop_size() {
        assert_eq!(vertical_crop_size(1920, 1080), (608, 1080));
        // Уже вертикальное видео не расширяется
        assert_eq!(vertical_crop_size(540, 960), (540, 960));
    }
}
