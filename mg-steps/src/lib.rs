//! The eight concrete pipeline steps (spec.md §4.5) plus the shared ffmpeg
//! wrapper and SRT helpers they're built on.

pub mod digital_human;
mod ffmpeg;
pub mod image;
pub mod postprocess;
mod srt;
pub mod split;
pub mod subtitle;
pub mod tts;
pub mod upload;
pub mod video;

pub use digital_human::DigitalHumanStep;
pub use ffmpeg::{FfmpegError, Resolution};
pub use image::ImageStep;
pub use postprocess::PostProcessStep;
pub use split::SplitStep;
pub use subtitle::SubtitleStep;
pub use tts::TtsStep;
pub use upload::UploadStep;
pub use video::VideoStep;
