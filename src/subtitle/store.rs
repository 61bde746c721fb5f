//! Модуль хранения субтитров
//!
//! Этот модуль сериализует субтитры в файлы формата SRT и читает их
//! обратно с гарантией хронологического порядка.

use std::fs;
use std::path::{Path, PathBuf};
use crate::error::{CaptionSyncError, Result};
use crate::subtitle::Cue;
use crate::time::SrtTime;

/// Сериализация субтитров в строку формата SRT
///
/// Каждая запись: номер, интервал `HH:MM:SS,mmm --> HH:MM:SS,mmm`, текст;
/// записи разделяются пустой строкой.
pub fn format_srt(cues: &[Cue]) -> String {
    let mut output = String::new();

    for cue in cues {
        output.push_str(&format!("{}\n", cue.index));
        output.push_str(&format!("{} --> {}\n", cue.start, cue.end));
        output.push_str(&cue.text);
        output.push_str("\n\n");
    }

    output
}

/// Сохранение субтитров в указанный файл
pub fn save<P: AsRef<Path>>(cues: &[Cue], path: P) -> Result<()> {
    fs::write(path.as_ref(), format_srt(cues))?;
    log::info!("Saved {} cues to {}", cues.len(), path.as_ref().display());
    Ok(())
}

/// Сохранение субтитров в файл с уникальным именем
///
/// Имя файла содержит UUID, поэтому параллельные запуски никогда не
/// перезаписывают результаты друг друга.
pub fn save_unique<P: AsRef<Path>>(cues: &[Cue], dir: P) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let path = dir.join(format!("subtitles_{}.srt", uuid::Uuid::new_v4()));
    save(cues, &path)?;
    Ok(path)
}

/// Загрузка субтитров из SRT файла
///
/// Файлу не доверяется порядок записей: после разбора субтитры
/// сортируются по возрастанию времени начала и перенумеровываются.
/// Некорректная запись пропускается с записью в журнал; ошибка всей
/// загрузки возникает только для нечитаемого или пустого файла и для
/// файла без единой корректной записи.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<Cue>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        CaptionSyncError::FileNotFound(format!(
            "Failed to open subtitle file {}: {}",
            path.display(),
            e
        ))
    })?;

    if content.trim().is_empty() {
        return Err(CaptionSyncError::SubtitleFormat(format!(
            "Subtitle file is empty: {}",
            path.display()
        )));
    }

    let mut cues = Vec::new();
    let mut block: Vec<&str> = Vec::new();
    let mut block_count = 0;

    for line in content.lines().chain(std::iter::once("")) {
        if line.trim().is_empty() {
            if !block.is_empty() {
                block_count += 1;
                match parse_block(&block) {
                    Ok(cue) => cues.push(cue),
                    Err(e) => log::warn!("Skipping malformed subtitle entry: {}", e),
                }
                block.clear();
            }
        } else {
            block.push(line);
        }
    }

    if cues.is_empty() {
        return Err(CaptionSyncError::SubtitleFormat(format!(
            "No valid entries in subtitle file {} ({} blocks rejected)",
            path.display(),
            block_count
        )));
    }

    // Сортировка по ординалу начала и сквозная перенумерация
    cues.sort_by_key(|cue| cue.start.ordinal());
    let cues = cues
        .into_iter()
        .enumerate()
        .filter_map(|(i, cue)| Cue::new(i + 1, cue.start, cue.end, cue.text))
        .collect();

    Ok(cues)
}

/// Разбор одного блока SRT
fn parse_block(lines: &[&str]) -> Result<Cue> {
    if lines.len() < 2 {
        return Err(CaptionSyncError::SubtitleFormat(format!(
            "Entry has too few lines: {:?}",
            lines
        )));
    }

    let timing_position = lines
        .iter()
        .position(|line| line.contains("-->"))
        .ok_or_else(|| {
            CaptionSyncError::SubtitleFormat(format!("Entry has no timing line: {:?}", lines))
        })?;

    let timing_parts: Vec<&str> = lines[timing_position].split("-->").collect();
    if timing_parts.len() != 2 {
        return Err(CaptionSyncError::SubtitleFormat(format!(
            "Malformed timing line: {}",
            lines[timing_position]
        )));
    }

    let start = SrtTime::parse(timing_parts[0])?;
    let end = SrtTime::parse(timing_parts[1])?;

    // Текст может занимать несколько строк, переносы сохраняются
    let text = lines[timing_position + 1..]
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<&str>>()
        .join("\n");

    Cue::new(0, start, end, text).ok_or_else(|| {
        CaptionSyncError::SubtitleFormat(format!(
            "Entry has empty text or inverted interval: {:?}",
            lines
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::SrtTime;
    use tempfile::tempdir;

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
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let cues = vec![cue(1, 0, 500, "FIRST CUE"), cue(2, 600, 1200, "SECOND CUE")];

        let path = save_unique(&cues, dir.path()).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded, cues);
    }

    #[test]
    fn test_unique_names_do_not_collide() {
        let dir = tempdir().unwrap();
        let cues = vec![cue(1, 0, 500, "text")];

        let first = save_unique(&cues, dir.path()).unwrap();
        let second = save_unique(&cues, dir.path()).unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_load_sorts_by_start_time() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("unsorted.srt");
        // Записи нарочно в обратном хронологическом порядке
        fs::write(
            &path,
            "1\n00:00:05,000 --> 00:00:06,000\nlater\n\n\
             2\n00:00:01,000 --> 00:00:02,000\nearlier\n\n",
        )
        .unwrap();

        let cues = load(&path).unwrap();

        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text, "earlier");
        assert_eq!(cues[1].text, "later");
        assert!(cues[0].start < cues[1].start);
        // Перенумерация после сортировки
        assert_eq!(cues[0].index, 1);
        assert_eq!(cues[1].index, 2);
    }

    #[test]
    fn test_malformed_entry_is_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.srt");
        fs::write(
            &path,
            "1\n00:00:01,000 --> 00:00:02,000\ngood\n\n\
             2\nthis entry has no timing line\n\n\
             3\n00:00:03,000 --> 00:00:04,000\nalso good\n\n",
        )
        .unwrap();

        let cues = load(&path).unwrap();

        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text, "good");
        assert_eq!(cues[1].text, "also good");
    }

    #[test]
    fn test_empty_file_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.srt");
        fs::write(&path, "").unwrap();

        assert!(load(&path).is_err());
    }

    #[test]
    fn test_file_with_no_valid_entries_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.srt");
        fs::write(&path, "not\nan srt\n\nfile at\nall\n").unwrap();

        assert!(load(&path).is_err());
    }

    #[test]
    fn test_missing_file_fails() {
        assert!(load("/nonexistent/subtitles.srt").is_err());
    }

    #[test]
    fn test_two_line_text_survives_round_trip() {
        let dir = tempdir().unwrap();
        let cues = vec![cue(1, 0, 500, "first line\nsecond line")];

        let path = save_unique(&cues, dir.path()).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded[0].text, "first line\nsecond line");
    }
}
