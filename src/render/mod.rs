//! Модуль отрисовки субтитров

pub mod layout;

pub use layout::CaptionLayoutEngine;
