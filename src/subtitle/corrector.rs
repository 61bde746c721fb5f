//! Модуль коррекции распознанных слов
//!
//! Этот модуль содержит чистые функции нормализации отдельных слов,
//! полученных от системы распознавания речи.

use lazy_static::lazy_static;
use regex::Regex;
use crate::config::AliasRule;
use crate::error::{CaptionSyncError, Result};

lazy_static! {
    /// Словесный фрагмент внутри токена
    static ref WORD_RUN: Regex = Regex::new(r"\w+").unwrap();
}

/// Корректор распознанных слов
///
/// Применяет детерминированные правила нормализации к отдельному слову,
/// сохраняя окружающую пунктуацию: токен разбивается на чередующиеся
/// словесные и несловесные фрагменты, преобразуются только словесные.
pub struct WordCorrector {
    /// Скомпилированные правила замены: (шаблон, каноническая форма)
    rules: Vec<(Regex, String)>,
}

impl WordCorrector {
    /// Создать корректор из правил конфигурации
    ///
    /// Каждый шаблон компилируется с якорями и без учёта регистра, чтобы
    /// правило срабатывало только на целый словесный фрагмент.
    pub fn new(rules: &[AliasRule]) -> Result<Self> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            let anchored = format!("(?i)^(?:{})$", rule.pattern);
            let regex = Regex::new(&anchored).map_err(|e| {
                CaptionSyncError::Configuration(format!(
                    "Invalid alias pattern '{}': {}",
                    rule.pattern, e
                ))
            })?;
            compiled.push((regex, rule.canonical.clone()));
        }

        Ok(Self { rules: compiled })
    }

    /// Нормализовать один распознанный токен
    ///
    /// Чистая функция: одинаковый вход всегда даёт одинаковый выход.
    pub fn correct(&self, token: &str) -> String {
        // Токены с цифрами: убираем запятые и пробелы ("1, 000" -> "1000")
        let token = if token.chars().any(|c| c.is_ascii_digit()) {
            token
                .chars()
                .filter(|c| *c != ',' && !c.is_whitespace())
                .collect::<String>()
        } else {
            token.to_string()
        };

        // Замена словесных фрагментов по правилам, пунктуация не трогается
        WORD_RUN
            .replace_all(&token, |caps: &regex::Captures| {
                let run = &caps[0];
                for (pattern, canonical) in &self.rules {
                    if pattern.is_match(run) {
                        return canonical.clone();
                    }
                }
                run.to_string()
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corrector() -> WordCorrector {
        WordCorrector::new(&[AliasRule::new(r"red+it+", "REDDIT")]).unwrap()
    }

    #[test]
    fn test_digit_comma_stripping() {
        let corrector = corrector();
        assert_eq!(corrector.correct("1,000"), "1000");
        assert_eq!(corrector.correct("1, 000"), "1000");
        assert_eq!(corrector.correct("hello"), "hello");
    }

    #[test]
    fn test_alias_rewrite_is_case_insensitive() {
        let corrector = corrector();
        assert_eq!(corrector.correct("redit"), "REDDIT");
        assert_eq!(corrector.correct("Reddit"), "REDDIT");
        assert_eq!(corrector.correct("REDDITT"), "REDDIT");
    }

    #[test]
    fn test_alias_preserves_punctuation() {
        let corrector = corrector();
        assert_eq!(corrector.correct("redit,"), "REDDIT,");
        assert_eq!(corrector.correct("\"reddit\""), "\"REDDIT\"");
    }

    #[test]
    fn test_alias_requires_full_word_run() {
        let corrector = corrector();
        // "redditor" не совпадает с шаблоном целиком и остаётся без изменений
        assert_eq!(corrector.correct("redditor"), "redditor");
    }

    #[test]
    fn test_idempotence() {
        let corrector = corrector();
        for token in ["redit", "1, 000", "hello!", "Reddit.", "42,5"] {
            let once = corrector.correct(token);
            let twice = corrector.correct(&once);
            assert_eq!(once, twice, "corrector not idempotent for {}", token);
        }
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        assert!(WordCorrector::new(&[AliasRule::new(r"([", "X")]).is_err());
    }

    #[test]
    fn test_no_rules_passthrough() {
        let corrector = WordCorrector::new(&[]).unwrap();
        assert_eq!(corrector.correct("word"), "word");
    }
}
