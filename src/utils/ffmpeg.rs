//! Модуль для работы с FFmpeg
//!
//! Этот модуль содержит функции запуска команд FFmpeg и FFprobe.

use std::process::Command;
use crate::error::{CaptionSyncError, Result};

/// Проверка наличия FFmpeg
pub fn check_ffmpeg_installed() -> Result<bool> {
    let output = Command::new("ffmpeg")
        .arg("-version")
        .output()?;

    Ok(output.status.success())
}

/// Запуск команды FFmpeg
///
/// Стандартный поток ошибок захватывается и включается в сообщение об
/// ошибке при неуспешном завершении.
pub fn run_ffmpeg_command(args: &[String]) -> Result<()> {
    log::debug!("Running ffmpeg {}", args.join(" "));

    let output = Command::new("ffmpeg")
        .args(args)
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail: String = stderr
            .lines()
            .rev()
            .take(5)
            .collect::<Vec<&str>>()
            .into_iter()
            .rev()
            .collect::<Vec<&str>>()
            .join("\n");
        return Err(CaptionSyncError::Rendering(format!(
            "FFmpeg command failed with status {}: {}",
            output.status, tail
        )));
    }

    Ok(())
}

/// Запуск команды FFprobe
pub fn run_ffprobe_command(args: &[&str]) -> Result<String> {
    log::debug!("Running ffprobe {}", args.join(" "));

    let output = Command::new("ffprobe")
        .args(args)
        .output()?;

    if !output.status.success() {
        return Err(CaptionSyncError::Other(format!(
            "FFprobe command failed with status: {}",
            output.status
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
