use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error("pose model file does not exist: {0}")]
    ModelFileMissing(PathBuf),

    #[error("failed to load pose model from {1}")]
    LoadModel(#[source] opencv::Error, PathBuf),

    #[error("failed to construct input blob from frame")]
    BuildInputBlob(#[source] opencv::Error),

    #[error("failed to set network input")]
    SetNetInput(#[source] opencv::Error),

    #[error("failed to run network forward pass")]
    RunForward(#[source] opencv::Error),

    #[error("unexpected network output shape: {0:?}")]
    HeatmapShape(Vec<i32>),

    #[error("failed to read heatmap value")]
    ReadHeatmap(#[source] opencv::Error),

    #[error("could not open video file for decoding: {0}")]
    OpenVideo(PathBuf),

    #[error("failed to construct video capture")]
    CreateCapture(#[source] opencv::Error),

    #[error("failed to get video capture property")]
    GetCaptureProperty(#[source] opencv::Error),

    #[error("video reports a non-positive fps: {0}")]
    InvalidFps(f64),

    #[error("failed to read frame from video")]
    ReadFrame(#[source] opencv::Error),

    #[error("failed to construct fourcc code")]
    Fourcc(#[source] opencv::Error),

    #[error("failed to open output video for writing: {0}")]
    OpenVideoSink(PathBuf),

    #[error("failed to construct video writer")]
    CreateVideoWriter(#[source] opencv::Error),

    #[error("failed to write frame to output video")]
    WriteSinkFrame(#[source] opencv::Error),

    #[error("failed to clone frame for annotation")]
    CloneFrame(#[source] opencv::Error),

    #[error("failed to draw keypoint circle")]
    DrawCircle(#[source] opencv::Error),

    #[error("failed to draw skeleton edge")]
    DrawLine(#[source] opencv::Error),

    #[error("failed to convert keypoint variant to usize: {0:?}")]
    KeypointVariantToUSize(crate::pose::KeypointKind),

    #[error("failed to construct NotNan from f32: {1}")]
    ConstructNotNan(#[source] ordered_float::FloatIsNan, f32),

    #[error("failed to create output directory: {1}")]
    CreateOutputDir(#[source] std::io::Error, PathBuf),

    #[error("failed to write output artifact: {1}")]
    WriteArtifact(#[source] std::io::Error, PathBuf),

    #[error("failed to serialize keypoint document")]
    SerializeJson(#[source] serde_json::Error),

    #[error("failed to create scratch directory")]
    CreateScratchDir(#[source] std::io::Error),

    #[error("failed to fetch video from {1}")]
    FetchVideo(#[source] Box<ureq::Error>, String),

    #[error("failed to write downloaded video to {1}")]
    WriteDownload(#[source] std::io::Error, PathBuf),

    #[error("failed to copy fetched video to {1}")]
    PreserveVideo(#[source] std::io::Error, PathBuf),

    #[error("failed to remove scratch directory")]
    RemoveScratchDir(#[source] std::io::Error),
}
