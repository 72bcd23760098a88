//! Thin `tokio::process::Command` wrapper around the `ffmpeg`/`ffprobe`
//! binaries, grounded on `core/utils/ffmpeg`'s `FFmpegCommandBuilder` /
//! `run_ffmpeg` (video_step.py) — a plain argument list instead of a fluent
//! builder, since every call site here only needs one or two shapes.

use std::path::Path;
use std::time::Duration;

use tokio::process::Command;

/// Resolution a scene is rendered at, keyed by orientation (spec.md §4.5
/// ImageStep/VideoStep: 1360x768 landscape, 768x1360 portrait).
#[derive(Debug, Clone, Copy)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const LANDSCAPE: Resolution = Resolution { width: 1360, height: 768 };
    pub const PORTRAIT: Resolution = Resolution { width: 768, height: 1360 };

    pub fn for_horizontal(is_horizontal: bool) -> Self {
        if is_horizontal {
            Self::LANDSCAPE
        } else {
            Self::PORTRAIT
        }
    }
}

/// Round-robins through a small, fixed transition set the way
/// `VideoProcessingConfig.transition_types` does, falling back to `"fade"`
/// when the configured list is empty.
pub fn transition_for_index(index: usize, enable_transitions: bool) -> &'static str {
    const TYPES: &[&str] = &["fade", "wipeleft", "slideright"];
    if !enable_transitions {
        return "fade";
    }
    TYPES[index % TYPES.len()]
}

#[derive(Debug, thiserror::Error)]
pub enum FfmpegError {
    #[error("ffmpeg timed out after {0:?}")]
    Timeout(Duration),
    #[error("ffmpeg exited with status {status}: {stderr}")]
    NonZeroExit { status: i32, stderr: String },
    #[error("failed to spawn ffmpeg: {0}")]
    Spawn(#[from] std::io::Error),
}

async fn run(mut command: Command, timeout: Duration) -> Result<(), FfmpegError> {
    // `kill_on_drop` ensures a timed-out child is actually reaped: without it
    // `command.output()`'s future is dropped on timeout but the underlying
    // ffmpeg process keeps running to completion in the background.
    command.kill_on_drop(true);
    let output = tokio::time::timeout(timeout, command.output()).await.map_err(|_| FfmpegError::Timeout(timeout))??;

    if !output.status.success() {
        return Err(FfmpegError::NonZeroExit {
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(())
}

/// One still image, looped into a fixed-duration clip scaled to `resolution`
/// (`_image_to_video_static` in `video_step.py`).
pub async fn image_to_video(
    image_path: &Path,
    output_path: &Path,
    duration_secs: f64,
    resolution: Resolution,
    timeout: Duration,
) -> Result<(), FfmpegError> {
    let mut command = Command::new("ffmpeg");
    command.args([
        "-y",
        "-loop",
        "1",
        "-t",
        &duration_secs.to_string(),
        "-i",
    ]);
    command.arg(image_path);
    command.args([
        "-vf",
        &format!("scale={}:{}:force_original_aspect_ratio=decrease,pad={}:{}:(ow-iw)/2:(oh-ih)/2", resolution.width, resolution.height, resolution.width, resolution.height),
        "-c:v",
        "libx264",
        "-crf",
        "23",
        "-preset",
        "medium",
        "-pix_fmt",
        "yuv420p",
        "-r",
        "30",
        "-tune",
        "stillimage",
    ]);
    command.arg(output_path);

    run(command, timeout).await
}

/// Concatenates `segments` in order via ffmpeg's concat demuxer
/// (`build_concat_command` in `video_step.py`). `list_file` is a
/// `ffconcat`-format file the caller has already written.
pub async fn concat_segments(list_file: &Path, output_path: &Path, timeout: Duration) -> Result<(), FfmpegError> {
    let mut command = Command::new("ffmpeg");
    command.args(["-y", "-f", "concat", "-safe", "0", "-i"]);
    command.arg(list_file);
    command.args(["-c", "copy"]);
    command.arg(output_path);

    run(command, timeout).await
}

/// Mixes a narration track onto a (silent) video, re-encoding audio only.
pub async fn mux_audio(video_path: &Path, audio_path: &Path, output_path: &Path, timeout: Duration) -> Result<(), FfmpegError> {
    let mut command = Command::new("ffmpeg");
    command.arg("-y");
    command.arg("-i");
    command.arg(video_path);
    command.arg("-i");
    command.arg(audio_path);
    command.args(["-c:v", "copy", "-c:a", "aac", "-shortest"]);
    command.arg(output_path);

    run(command, timeout).await
}

/// Burns subtitles into a video with a given BGR color (ffmpeg's
/// `subtitles` filter takes `PrimaryColour` as `&HBBGGRR`), optionally
/// overlaying a logo scaled to `logo_width` pixels in the top-right corner.
pub async fn burn_subtitles_and_logo(
    video_path: &Path,
    srt_path: &Path,
    bgr_color: &str,
    logo_path: Option<&Path>,
    logo_width: u32,
    output_path: &Path,
    timeout: Duration,
) -> Result<(), FfmpegError> {
    let mut command = Command::new("ffmpeg");
    command.arg("-y");
    command.arg("-i");
    command.arg(video_path);

    let subtitle_filter = format!(
        "subtitles={}:force_style='PrimaryColour=&H{}&'",
        srt_path.display(),
        bgr_color
    );

    match logo_path {
        Some(logo) => {
            command.arg("-i");
            command.arg(logo);
            let filter = format!(
                "[0:v]{subtitle_filter}[subbed];[1:v]scale={logo_width}:-1[logo];[subbed][logo]overlay=W-w-20:20"
            );
            command.args(["-filter_complex", &filter, "-c:a", "copy"]);
        }
        None => {
            command.args(["-vf", &subtitle_filter, "-c:a", "copy"]);
        }
    }
    command.arg(output_path);

    run(command, timeout).await
}

/// Reads a media file's duration via `ffprobe`, falling back to `0.0` if the
/// binary is missing or the output can't be parsed — the same degrade path
/// `_get_audio_duration`/`_get_video_duration` take when `librosa`/`ffprobe`
/// aren't available.
pub async fn probe_duration(path: &Path) -> f64 {
    let output = Command::new("ffprobe")
        .args(["-v", "error", "-show_entries", "format=duration", "-of", "default=noprint_wrappers=1:nokey=1"])
        .arg(path)
        .output()
        .await;

    match output {
        Ok(output) if output.status.success() => {
            String::from_utf8_lossy(&output.stdout).trim().parse::<f64>().unwrap_or(0.0)
        }
        _ => 0.0,
    }
}
