use crate::{error::Error, record::VideoInfo};
use opencv::{
    core::{Mat, Size},
    prelude::*,
    videoio::{
        VideoCapture, VideoWriter, CAP_ANY, CAP_PROP_FPS, CAP_PROP_FRAME_COUNT,
        CAP_PROP_FRAME_HEIGHT, CAP_PROP_FRAME_WIDTH,
    },
};
use std::path::Path;
use tracing::info;

/// Sequential frame decoder for one video file.
pub(crate) struct VideoSource {
    capture: VideoCapture,
    info: VideoInfo,
    width: i32,
    height: i32,
}

impl VideoSource {
    /// Open `path` for decoding. A file the backend cannot open is reported
    /// before any processing starts, so no partial outputs are written.
    pub(crate) fn open(path: &Path) -> Result<Self, Error> {
        let capture = VideoCapture::from_file(&path.to_string_lossy(), CAP_ANY)
            .map_err(Error::CreateCapture)?;
        if !capture.is_opened().map_err(Error::CreateCapture)? {
            return Err(Error::OpenVideo(path.to_owned()));
        }

        let frame_count = capture
            .get(CAP_PROP_FRAME_COUNT)
            .map_err(Error::GetCaptureProperty)?
            .max(0.0) as u64;
        let fps = capture.get(CAP_PROP_FPS).map_err(Error::GetCaptureProperty)?;
        if fps <= 0.0 {
            return Err(Error::InvalidFps(fps));
        }
        let width = capture
            .get(CAP_PROP_FRAME_WIDTH)
            .map_err(Error::GetCaptureProperty)? as i32;
        let height = capture
            .get(CAP_PROP_FRAME_HEIGHT)
            .map_err(Error::GetCaptureProperty)? as i32;

        info!(
            message = "opened video",
            path = %path.display(),
            frame_count,
            fps,
            width,
            height
        );

        Ok(Self {
            capture,
            info: VideoInfo {
                frame_count,
                fps,
                duration: frame_count as f64 / fps,
            },
            width,
            height,
        })
    }

    pub(crate) fn info(&self) -> VideoInfo {
        self.info
    }

    pub(crate) fn frame_size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Decode the next frame; `None` means the stream is exhausted. Any
    /// decode failure past that point propagates and ends the run.
    pub(crate) fn next_frame(&mut self) -> Result<Option<Mat>, Error> {
        let mut frame = Mat::default();
        let got = self
            .capture
            .read(&mut frame)
            .map_err(Error::ReadFrame)?;
        if !got || frame.empty().map_err(Error::ReadFrame)? {
            return Ok(None);
        }
        Ok(Some(frame))
    }
}

/// Encoder for the optional annotated output video. Opened with the source
/// fps and dimensions and a fixed `mp4v` fourcc; the underlying writer is
/// flushed and closed on drop, whichever way frame iteration ended.
pub(crate) struct VideoSink {
    writer: VideoWriter,
}

impl VideoSink {
    pub(crate) fn create(path: &Path, fps: f64, frame_size: Size) -> Result<Self, Error> {
        let fourcc = VideoWriter::fourcc(b'm' as i8, b'p' as i8, b'4' as i8, b'v' as i8)
            .map_err(Error::Fourcc)?;
        let writer = VideoWriter::new(&path.to_string_lossy(), fourcc, fps, frame_size, true)
            .map_err(Error::CreateVideoWriter)?;
        if !writer.is_opened().map_err(Error::CreateVideoWriter)? {
            return Err(Error::OpenVideoSink(path.to_owned()));
        }
        info!(message = "writing annotated video", path = %path.display());
        Ok(Self { writer })
    }

    pub(crate) fn write(&mut self, frame: &Mat) -> Result<(), Error> {
        self.writer.write(frame).map_err(Error::WriteSinkFrame)
    }
}
