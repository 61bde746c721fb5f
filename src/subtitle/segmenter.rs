//! Модуль сегментации субтитров
//!
//! Этот модуль группирует последовательность распознанных слов с
//! временными метками в субтитры согласно выбранной политике.

use crate::config::GroupingPolicy;
use crate::recognizer::{Transcription, WordTiming};
use crate::subtitle::corrector::WordCorrector;
use crate::subtitle::Cue;
use crate::time::SrtTime;

/// Скорректированное слово с готовыми временными метками
struct TimedWord {
    text: String,
    start: SrtTime,
    end: SrtTime,
}

/// Сегментация полной транскрипции в список субтитров
///
/// Буфер группировки сбрасывается на границе сегментов распознавания,
/// нумерация субтитров сквозная. Пустая транскрипция даёт пустой список.
pub fn segment_transcription(
    transcription: &Transcription,
    policy: &GroupingPolicy,
    corrector: &WordCorrector,
) -> Vec<Cue> {
    let mut cues = Vec::new();
    let mut next_index = 1;

    for segment in &transcription.segments {
        segment_words_into(&segment.words, policy, corrector, &mut next_index, &mut cues);
    }

    log::info!("Generated {} cues from transcription", cues.len());
    cues
}

/// Сегментация плоской последовательности слов
pub fn segment_words(
    words: &[WordTiming],
    policy: &GroupingPolicy,
    corrector: &WordCorrector,
) -> Vec<Cue> {
    let mut cues = Vec::new();
    let mut next_index = 1;
    segment_words_into(words, policy, corrector, &mut next_index, &mut cues);
    cues
}

fn segment_words_into(
    words: &[WordTiming],
    policy: &GroupingPolicy,
    corrector: &WordCorrector,
    next_index: &mut usize,
    cues: &mut Vec<Cue>,
) {
    let timed = correct_words(words, corrector);

    match policy {
        GroupingPolicy::PerWord => {
            for word in &timed {
                push_cue(cues, next_index, word.start, word.end, word.text.clone());
            }
        }
        GroupingPolicy::Grouped { max_words, silence_gap_ms } => {
            group_words(&timed, *max_words, *silence_gap_ms, next_index, cues, |buffer| {
                join_texts(buffer)
            });
        }
        GroupingPolicy::TwoLine { max_words, first_line_words } => {
            let split = *first_line_words;
            // Двухстрочная политика не использует порог паузы
            group_words(&timed, *max_words, u64::MAX, next_index, cues, move |buffer| {
                format_two_lines(buffer, split)
            });
        }
    }
}

/// Коррекция и отбрасывание слов с пустым или некорректным содержимым
fn correct_words(words: &[WordTiming], corrector: &WordCorrector) -> Vec<TimedWord> {
    let mut timed = Vec::with_capacity(words.len());

    for word in words {
        let text = corrector.correct(word.text.trim());
        if text.trim().is_empty() {
            continue;
        }

        let start = match SrtTime::from_seconds(word.start) {
            Ok(time) => time,
            Err(e) => {
                log::warn!("Skipping word '{}' with invalid start time: {}", word.text, e);
                continue;
            }
        };
        let end = match SrtTime::from_seconds(word.end) {
            Ok(time) => time,
            Err(e) => {
                log::warn!("Skipping word '{}' with invalid end time: {}", word.text, e);
                continue;
            }
        };

        timed.push(TimedWord { text, start, end });
    }

    timed
}

/// Накопление слов с двумя условиями сброса буфера
///
/// Пауза между началом текущего слова и концом предыдущего, превышающая
/// порог, закрывает буфер перед текущим словом: слово после паузы
/// открывает следующий субтитр. Достижение порога по количеству слов
/// закрывает буфер вместе с текущим словом. Остаток буфера сбрасывается
/// по исчерпании входа.
fn group_words<F>(
    words: &[TimedWord],
    max_words: usize,
    silence_gap_ms: u64,
    next_index: &mut usize,
    cues: &mut Vec<Cue>,
    format_text: F,
) where
    F: Fn(&[&TimedWord]) -> String,
{
    let max_words = max_words.max(1);
    let mut buffer: Vec<&TimedWord> = Vec::new();

    for word in words {
        if let Some(last) = buffer.last() {
            let gap = word.start.ordinal().saturating_sub(last.end.ordinal());
            if gap > silence_gap_ms {
                flush_buffer(&mut buffer, next_index, cues, &format_text);
            }
        }

        buffer.push(word);

        if buffer.len() >= max_words {
            flush_buffer(&mut buffer, next_index, cues, &format_text);
        }
    }

    flush_buffer(&mut buffer, next_index, cues, &format_text);
}

fn flush_buffer<F>(
    buffer: &mut Vec<&TimedWord>,
    next_index: &mut usize,
    cues: &mut Vec<Cue>,
    format_text: &F,
) where
    F: Fn(&[&TimedWord]) -> String,
{
    let (first, last) = match (buffer.first(), buffer.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return,
    };

    let text = format_text(buffer);
    push_cue(cues, next_index, first.start, last.end, text);
    buffer.clear();
}

fn push_cue(cues: &mut Vec<Cue>, next_index: &mut usize, start: SrtTime, end: SrtTime, text: String) {
    if let Some(cue) = Cue::new(*next_index, start, end, text) {
        *next_index += 1;
        cues.push(cue);
    }
}

fn join_texts(buffer: &[&TimedWord]) -> String {
    buffer
        .iter()
        .map(|word| word.text.as_str())
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Форматирование буфера в одну или две строки
///
/// Полный буфер делится на первую строку из `split` слов и вторую из
/// остальных; остаток короче `split` помещается в одну строку.
fn format_two_lines(buffer: &[&TimedWord], split: usize) -> String {
    if buffer.len() <= split {
        return join_texts(buffer);
    }

    let first: Vec<&str> = buffer[..split].iter().map(|w| w.text.as_str()).collect();
    let second: Vec<&str> = buffer[split..].iter().map(|w| w.text.as_str()).collect();
    format!("{}\n{}", first.join(" "), second.join(" "))
}
