use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use opencv::{
    core::{Mat, Point, Scalar},
    imgproc::LINE_8,
    prelude::*,
};
use std::path::{Path, PathBuf};
use structopt::StructOpt;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;

mod engine;
mod error;
mod extract;
mod fetch;
mod output;
mod pose;
mod record;
mod video;

use engine::{DnnEngine, PoseEngine};
use error::Error;
use extract::Extractor;
use video::{VideoSink, VideoSource};

const DEFAULT_VIDEO_URL: &str =
    "https://dev1-admin-restapi.aim-football.com/images/dev1/videos/test_17471176153455714.mp4";
const DEFAULT_OUTPUT_DIR: &str = "processed_videos_output";
const DEFAULT_MODEL_DIR: &str = "models";

#[derive(structopt::StructOpt)]
struct Opt {
    /// Path to the input video file; fetched from --url when omitted.
    video: Option<PathBuf>,

    /// URL to fetch the input video from when no local path is given.
    #[structopt(short, long, default_value = DEFAULT_VIDEO_URL)]
    url: String,

    /// Directory the CSV and JSON artifacts are written into.
    #[structopt(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Path for a copy of the video with the detected skeletons drawn on top.
    #[structopt(long)]
    output_video: Option<PathBuf>,

    /// Directory holding pose_deploy.prototxt and pose_iter_584000.caffemodel.
    #[structopt(short, long, default_value = DEFAULT_MODEL_DIR)]
    model_dir: PathBuf,

    /// Keypoint score threshold for the skeleton overlay.
    #[structopt(short, long, default_value = "0.2")]
    threshold: f32,

    #[structopt(short, long, default_value = "info", env = "RUST_LOG")]
    log_level: tracing_subscriber::filter::EnvFilter,
}

/// Draw keypoint circles and skeleton edges for every detected person onto
/// `out_frame`, skipping points below `threshold`.
fn draw_poses(out_frame: &mut Mat, people: &[pose::Person], threshold: f32) -> Result<(), Error> {
    const GREEN: (f64, f64, f64) = (0.0, 255.0, 0.0);
    const YELLOW: (f64, f64, f64) = (0.0, 255.0, 255.0);

    for person in people {
        for keypoint in &person.keypoints {
            if keypoint.conf >= threshold {
                opencv::imgproc::circle(
                    out_frame,
                    Point::new(keypoint.x as i32, keypoint.y as i32),
                    6,
                    Scalar::from(GREEN),
                    1,      // thickness
                    LINE_8, // line_type
                    0,      // shift
                )
                .map_err(Error::DrawCircle)?;
            }
        }

        for &(a, b) in &pose::constants::KEYPOINT_EDGES {
            let a_point = person.keypoints[a.idx()?];
            let b_point = person.keypoints[b.idx()?];
            if a_point.conf >= threshold && b_point.conf >= threshold {
                opencv::imgproc::line(
                    out_frame,
                    Point::new(a_point.x as i32, a_point.y as i32),
                    Point::new(b_point.x as i32, b_point.y as i32),
                    Scalar::from(YELLOW),
                    2,      // thickness
                    LINE_8, // line_type
                    0,      // shift
                )
                .map_err(Error::DrawLine)?;
            }
        }
    }

    Ok(())
}

/// Decode every frame, run the pose engine over it, accumulate body and
/// foot records, and persist the three artifacts. Strictly sequential; the
/// loop ends when the decoder reports no more frames.
fn process<E>(
    engine: &mut E,
    video_path: &Path,
    output_dir: &Path,
    output_video: Option<&Path>,
    threshold: f32,
) -> Result<()>
where
    E: PoseEngine,
{
    let mut source =
        VideoSource::open(video_path).context("could not open video for decoding")?;
    let video_info = source.info();

    let mut sink = match output_video {
        Some(path) => Some(
            VideoSink::create(path, video_info.fps, source.frame_size())
                .context("failed to open annotated video sink")?,
        ),
        None => None,
    };

    let progress = ProgressBar::new(video_info.frame_count).with_style(
        ProgressStyle::default_bar().template("{bar:40.cyan/blue} {pos}/{len} frames"),
    );

    let mut extractor = Extractor::new(video_info.fps, video_info.frame_count);
    while let Some(frame) = source.next_frame().context("failed reading frame")? {
        let people = engine.detect(&frame).context("failed detecting poses")?;
        extractor.push(&people)?;

        if let Some(sink) = sink.as_mut() {
            let mut annotated = frame.try_clone().map_err(Error::CloneFrame)?;
            draw_poses(&mut annotated, &people, threshold)?;
            sink.write(&annotated)?;
        }

        progress.inc(1);
    }
    progress.finish_and_clear();

    info!(
        message = "processing complete",
        frames = extractor.frames_processed()
    );

    let (body, foot) = extractor.finish();
    output::write_outputs(output_dir, &video_info, &body, &foot)
        .context("failed writing output artifacts")?;
    Ok(())
}

fn main() -> Result<()> {
    let opt = Opt::from_args();

    tracing::subscriber::set_global_default(
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(opt.log_level),
    )?;

    // The engine must be usable before anything is fetched or decoded.
    let mut engine = DnnEngine::new(&opt.model_dir).context("pose engine is unavailable")?;

    match opt.video {
        Some(path) => process(
            &mut engine,
            &path,
            &opt.output_dir,
            opt.output_video.as_deref(),
            opt.threshold,
        ),
        None => {
            let fetched = fetch::download(&opt.url).context("failed to fetch input video")?;
            let result = process(
                &mut engine,
                fetched.path(),
                &opt.output_dir,
                opt.output_video.as_deref(),
                opt.threshold,
            );
            // Preserve the exact input next to the artifacts and drop the
            // scratch directory, whichever way processing ended.
            if let Err(source) = fetched.preserve_into(&opt.output_dir) {
                warn!(message = "failed to preserve fetched video", error = %source);
            }
            result
        }
    }
}
