//! Модуль для работы с временными метками субтитров
//!
//! Этот модуль содержит структуру SrtTime и функции преобразования
//! между секундами, структурным временем и миллисекундным ординалом.

use std::fmt;
use crate::error::{CaptionSyncError, Result};

/// Временная метка субтитра с точностью до миллисекунды
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SrtTime {
    /// Часы
    pub hours: u64,
    /// Минуты (0-59)
    pub minutes: u64,
    /// Секунды (0-59)
    pub seconds: u64,
    /// Миллисекунды (0-999)
    pub milliseconds: u64,
}

impl SrtTime {
    /// Создать временную метку из компонентов
    pub fn new(hours: u64, minutes: u64, seconds: u64, milliseconds: u64) -> Self {
        // Нормализуем компоненты через ординал
        Self::from_ordinal(hours * 3_600_000 + minutes * 60_000 + seconds * 1000 + milliseconds)
    }

    /// Создать временную метку из дробного количества секунд
    ///
    /// Значение округляется до ближайшей миллисекунды. Отрицательные
    /// значения недопустимы.
    pub fn from_seconds(seconds: f64) -> Result<Self> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(CaptionSyncError::InvalidTime(format!(
                "Timestamp must be a non-negative number of seconds, got {}",
                seconds
            )));
        }

        Ok(Self::from_ordinal((seconds * 1000.0).round() as u64))
    }

    /// Создать временную метку из миллисекундного ординала
    pub fn from_ordinal(ordinal: u64) -> Self {
        let milliseconds = ordinal % 1000;
        let total_seconds = ordinal / 1000;
        let seconds = total_seconds % 60;
        let total_minutes = total_seconds / 60;
        let minutes = total_minutes % 60;
        let hours = total_minutes / 60;

        Self { hours, minutes, seconds, milliseconds }
    }

    /// Получить каноническое сравнимое представление: миллисекунды от 00:00:00.000
    pub fn ordinal(&self) -> u64 {
        self.hours * 3_600_000 + self.minutes * 60_000 + self.seconds * 1000 + self.milliseconds
    }

    /// Получить значение в секундах
    pub fn as_seconds(&self) -> f64 {
        self.ordinal() as f64 / 1000.0
    }

    /// Парсинг строки времени в формате HH:MM:SS,mmm
    ///
    /// Разделитель миллисекунд может быть запятой (SRT) или точкой (VTT).
    pub fn parse(time_str: &str) -> Result<Self> {
        let normalized = time_str.trim().replace(',', ".");
        let parts: Vec<&str> = normalized.split(':').collect();
        if parts.len() != 3 {
            return Err(CaptionSyncError::InvalidTime(format!(
                "Expected HH:MM:SS,mmm, got: {}",
                time_str
            )));
        }

        let hours = parts[0].parse::<u64>().map_err(|_| {
            CaptionSyncError::InvalidTime(format!("Failed to parse hours: {}", parts[0]))
        })?;
        let minutes = parts[1].parse::<u64>().map_err(|_| {
            CaptionSyncError::InvalidTime(format!("Failed to parse minutes: {}", parts[1]))
        })?;

        let seconds_parts: Vec<&str> = parts[2].split('.').collect();
        let seconds = seconds_parts[0].parse::<u64>().map_err(|_| {
            CaptionSyncError::InvalidTime(format!("Failed to parse seconds: {}", seconds_parts[0]))
        })?;

        let milliseconds = if seconds_parts.len() > 1 {
            let ms_str = seconds_parts[1];
            let ms = ms_str.parse::<u64>().map_err(|_| {
                CaptionSyncError::InvalidTime(format!("Failed to parse milliseconds: {}", ms_str))
            })?;
            // Приводим дробную часть к миллисекундам независимо от числа цифр
            match ms_str.len() {
                1 => ms * 100,
                2 => ms * 10,
                3 => ms,
                _ => ms / 10_u64.pow(ms_str.len() as u32 - 3),
            }
        } else {
            0
        };

        if minutes > 59 || seconds > 59 || milliseconds > 999 {
            return Err(CaptionSyncError::InvalidTime(format!(
                "Time components out of range: {}",
                time_str
            )));
        }

        Ok(Self { hours, minutes, seconds, milliseconds })
    }
}

impl fmt::Display for SrtTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02},{:03}",
            self.hours, self.minutes, self.seconds, self.milliseconds
        )
    }
}

impl PartialOrd for SrtTime {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SrtTime {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.ordinal().cmp(&other.ordinal())
    }
}
