//! Модуль для работы с медиафайлами
//!
//! Этот модуль содержит функции обработки видео и аудио, а также
//! кодировщик итоговой композиции.

pub mod audio;
pub mod encoder;
pub mod video;

pub use video::VideoInfo;
