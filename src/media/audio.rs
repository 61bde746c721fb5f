//! Модуль для работы с аудио
//!
//! Этот модуль содержит функции получения длительности аудиофайлов и
//! смешивания дорожки озвучки с фоновым звуком.

use std::path::Path;
use crate::error::{CaptionSyncError, Result};
use crate::utils::ffmpeg::{run_ffmpeg_command, run_ffprobe_command};

/// Получить длительность аудиофайла в секундах
pub fn get_audio_duration(audio_path: &str) -> Result<f64> {
    if !Path::new(audio_path).exists() {
        return Err(CaptionSyncError::FileNotFound(audio_path.to_string()));
    }

    let output = run_ffprobe_command(&[
        "-v", "error",
        "-show_entries", "format=duration",
        "-of", "default=noprint_wrappers=1:nokey=1",
        audio_path,
    ])?;

    output.trim().parse::<f64>().map_err(|_| {
        CaptionSyncError::Other(format!(
            "Failed to parse audio duration from ffprobe output: {}",
            output.trim()
        ))
    })
}

/// Смешать дорожку озвучки с фоновым звуком
///
/// Громкость фоновой дорожки понижается до заданного уровня, итоговая
/// длительность равна длительности озвучки.
pub fn mix_audio_tracks(
    narration_path: &str,
    background_path: &str,
    background_volume: f32,
    output_path: &str,
) -> Result<()> {
    if !(0.0..=1.0).contains(&background_volume) {
        return Err(CaptionSyncError::Configuration(format!(
            "Background audio volume must be within 0.0 - 1.0, got {}",
            background_volume
        )));
    }

    log::info!(
        "Mixing narration with background audio at volume {:.2}",
        background_volume
    );

    let filter = format!(
        "[1:a]volume={:.3}[bg];[0:a][bg]amix=inputs=2:duration=first:dropout_transition=0[out]",
        background_volume
    );

    let args = vec![
        "-y".to_string(),
        "-i".to_string(), narration_path.to_string(),
        "-i".to_string(), background_path.to_string(),
        "-filter_complex".to_string(), filter,
        "-map".to_string(), "[out]".to_string(),
        output_path.to_string(),
    ];

    run_ffmpeg_command(&args)
}
