use anyhow::{Context, Result};
use std::ffi::OsString;
use std::io::Write;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use crate::render::FrameBuffer;

/// Video stream parameters; `frame_rate` is an ffmpeg rational such as
/// `"48000/512"` so the video runs exactly in step with the audio windows.
#[derive(Clone, Debug)]
pub struct EncodeSettings {
    pub width: usize,
    pub height: usize,
    pub scale: usize,
    pub frame_rate: String,
    pub codec: String,
    pub crf: u32,
}

impl EncodeSettings {
    pub fn video_size(&self) -> (usize, usize) {
        (self.width * self.scale, self.height * self.scale)
    }
}

pub struct FfmpegEncoder {
    child: Child,
    scale: usize,
    frames: u64,
}

impl FfmpegEncoder {
    pub fn new(output_path: &Path, input_audio: &Path, settings: &EncodeSettings) -> Result<Self> {
        let child = Command::new("ffmpeg")
            .args(ffmpeg_args(output_path, input_audio, settings))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to spawn ffmpeg. Is ffmpeg installed?")?;

        let (width, height) = settings.video_size();
        log::info!(
            "FFmpeg encoder started: {}x{} @ {} fps, codec={}",
            width,
            height,
            settings.frame_rate,
            settings.codec
        );

        Ok(Self {
            child,
            scale: settings.scale,
            frames: 0,
        })
    }

    pub fn write_frame(&mut self, frame: &FrameBuffer) -> Result<()> {
        let rgba = frame.to_rgba8(self.scale);
        let stdin = self.child.stdin.as_mut().context("FFmpeg stdin not available")?;
        stdin
            .write_all(&rgba)
            .with_context(|| format!("Failed to write frame {} to ffmpeg", self.frames))?;
        self.frames += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        // EOF on stdin ends the stream
        drop(self.child.stdin.take());

        let output = self.child.wait_with_output().context("Failed to wait for ffmpeg")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("FFmpeg exited with error:\n{}", stderr);
        }

        log::info!("FFmpeg encoding complete: {} frames", self.frames);
        Ok(())
    }
}

fn ffmpeg_args(output_path: &Path, input_audio: &Path, settings: &EncodeSettings) -> Vec<OsString> {
    let (width, height) = settings.video_size();
    let mut args: Vec<OsString> = vec![
        "-y".into(),
        "-f".into(), "rawvideo".into(),
        "-pixel_format".into(), "rgba".into(),
        "-video_size".into(), format!("{}x{}", width, height).into(),
        "-framerate".into(), settings.frame_rate.as_str().into(),
        "-i".into(), "pipe:0".into(),
        "-i".into(), input_audio.into(),
        "-c:v".into(), settings.codec.as_str().into(),
        "-pix_fmt".into(), "yuv420p".into(),
    ];

    args.extend([OsString::from("-crf"), settings.crf.to_string().into()]);
    args.extend([OsString::from("-preset"), "medium".into()]);

    args.extend([
        OsString::from("-c:a"), "aac".into(),
        "-b:a".into(), "192k".into(),
        "-shortest".into(),
        output_path.into(),
    ]);
    args
}
