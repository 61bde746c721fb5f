//! Модуль для работы с субтитрами

pub mod corrector;
pub mod segmenter;
pub mod store;

use crate::time::SrtTime;

/// Один субтитр: порядковый номер, интервал времени и текст
///
/// Субтитры создаются только сегментатором или хранилищем и после
/// создания не изменяются.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    /// Порядковый номер (с единицы, без пропусков)
    pub index: usize,
    /// Время начала
    pub start: SrtTime,
    /// Время окончания
    pub end: SrtTime,
    /// Текст субтитра
    pub text: String,
}

impl Cue {
    /// Создать новый субтитр
    ///
    /// Возвращает None, если текст после нормализации пуст или интервал
    /// времени некорректен. Пустые субтитры отбрасываются, а не сохраняются.
    pub fn new(index: usize, start: SrtTime, end: SrtTime, text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() || start > end {
            return None;
        }

        Some(Self { index, start, end, text })
    }

    /// Получить длительность субтитра в секундах
    pub fn duration_seconds(&self) -> f64 {
        (self.end.ordinal() - self.start.ordinal()) as f64 / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_is_rejected() {
        let start = SrtTime::from_ordinal(0);
        let end = SrtTime::from_ordinal(100);
        assert!(Cue::new(1, start, end, "   ").is_none());
        assert!(Cue::new(1, start, end, "ok").is_some());
    }

    #[test]
    fn test_inverted_interval_is_rejected() {
        let start = SrtTime::from_ordinal(200);
        let end = SrtTime::from_ordinal(100);
        assert!(Cue::new(1, start, end, "text").is_none());
    }

    #[test]
    fn test_duration_seconds() {
        let cue = Cue::new(
            1,
            SrtTime::from_ordinal(500),
            SrtTime::from_ordinal(2_000),
            "text",
        )
        .unwrap();
        assert!((cue.duration_seconds() - 1.5).abs() < f64::EPSILON);
    }
}
