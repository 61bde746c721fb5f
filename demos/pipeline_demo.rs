//! Пример полного цикла генерации видео с субтитрами
//!
//! Запуск:
//! cargo run --example pipeline_demo -- background.mp4 narration.mp3 output.mp4

use std::path::PathBuf;
use caption_sync::config::{CaptionStyle, CaptionSyncConfig};
use caption_sync::notification::ProgressBarObserver;
use caption_sync::progress::{DefaultProgressReporter, ProgressReporter};
use caption_sync::CaptionSync;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        eprintln!("Usage: pipeline_demo <background.mp4> <narration.mp3> <output.mp4> [image.png ...]");
        std::process::exit(1);
    }

    let video_path = &args[1];
    let narration_path = &args[2];
    let output_path = &args[3];
    let images: Vec<Option<PathBuf>> = args[4..]
        .iter()
        .map(|path| Some(PathBuf::from(path)))
        .collect();

    let api_key = std::env::var("OPENAI_API_KEY")
        .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable is not set"))?;
    let font_path = std::env::var("CAPTION_FONT")
        .map_err(|_| anyhow::anyhow!("CAPTION_FONT environment variable is not set"))?;

    let config = CaptionSyncConfig {
        openai_api_key: api_key,
        style: CaptionStyle {
            font_path,
            ..CaptionStyle::default()
        },
        ..CaptionSyncConfig::default()
    };

    let mut reporter = DefaultProgressReporter::new();
    reporter.add_observer(Box::new(ProgressBarObserver::default()));

    let caption_sync = CaptionSync::with_progress_reporter(config, Box::new(reporter));
    let output_file = caption_sync
        .process(video_path, narration_path, &images, output_path)
        .await?;

    println!("Готово: {}", output_file);
    Ok(())
}
