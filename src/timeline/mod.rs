//! Модуль таймлайна композиции

pub mod compositor;
pub mod element;

pub use compositor::{BaseTrack, FlattenedTimeline, Timeline};
pub use element::{OverlayContent, OverlayElement, OverlayPosition};
