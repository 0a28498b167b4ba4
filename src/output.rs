use crate::{
    error::Error,
    pose::Keypoint,
    record::{body_header, foot_header, BodyRecord, FootRecord, VideoInfo},
};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};
use tracing::info;

pub(crate) const BODY_CSV_NAME: &str = "keypoints.csv";
pub(crate) const FOOT_CSV_NAME: &str = "foot_keypoints.csv";
pub(crate) const JSON_NAME: &str = "keypoints.json";

/// The nested document written to `keypoints.json`.
#[derive(serde::Serialize)]
struct Document<'a> {
    video_info: &'a VideoInfo,
    keypoints: &'a [BodyRecord],
    foot_keypoints: &'a [FootRecord],
}

/// Write all three artifacts into `dir`, creating it (and parents) first.
/// Fixed filenames; a repeated run overwrites without warning.
pub(crate) fn write_outputs(
    dir: &Path,
    info: &VideoInfo,
    body: &[BodyRecord],
    foot: &[FootRecord],
) -> Result<(), Error> {
    fs::create_dir_all(dir).map_err(|source| Error::CreateOutputDir(source, dir.to_owned()))?;

    let body_path = dir.join(BODY_CSV_NAME);
    write_body_csv(&body_path, body)?;
    info!(message = "saved body keypoints", path = %body_path.display(), rows = body.len());

    let foot_path = dir.join(FOOT_CSV_NAME);
    write_foot_csv(&foot_path, foot)?;
    info!(message = "saved foot keypoints", path = %foot_path.display(), rows = foot.len());

    let json_path = dir.join(JSON_NAME);
    write_json(&json_path, info, body, foot)?;
    info!(message = "saved keypoint document", path = %json_path.display());

    Ok(())
}

fn artifact_writer(path: &Path) -> Result<BufWriter<File>, Error> {
    let file =
        File::create(path).map_err(|source| Error::WriteArtifact(source, path.to_owned()))?;
    Ok(BufWriter::new(file))
}

fn write_row(
    writer: &mut BufWriter<File>,
    path: &Path,
    frame: u64,
    timestamp: f64,
    keypoints: &[Keypoint],
) -> Result<(), Error> {
    let io_err = |source| Error::WriteArtifact(source, path.to_owned());
    write!(writer, "{},{}", frame, timestamp).map_err(io_err)?;
    for keypoint in keypoints {
        write!(writer, ",{},{},{}", keypoint.x, keypoint.y, keypoint.conf).map_err(io_err)?;
    }
    writeln!(writer).map_err(io_err)
}

fn write_header(writer: &mut BufWriter<File>, path: &Path, header: &[String]) -> Result<(), Error> {
    writeln!(writer, "{}", header.join(",")).map_err(|source| Error::WriteArtifact(source, path.to_owned()))
}

/// One row per decoded frame, in frame order; fully-zero rows included.
fn write_body_csv(path: &Path, records: &[BodyRecord]) -> Result<(), Error> {
    let mut writer = artifact_writer(path)?;
    write_header(&mut writer, path, &body_header())?;
    for record in records {
        write_row(&mut writer, path, record.frame, record.timestamp, &record.keypoints)?;
    }
    writer
        .flush()
        .map_err(|source| Error::WriteArtifact(source, path.to_owned()))
}

/// Sparse foot table. An empty record sequence still produces the header
/// row, so consumers always find the same three files with stable schemas.
fn write_foot_csv(path: &Path, records: &[FootRecord]) -> Result<(), Error> {
    let mut writer = artifact_writer(path)?;
    write_header(&mut writer, path, &foot_header())?;
    for record in records {
        write_row(&mut writer, path, record.frame, record.timestamp, &record.feet)?;
    }
    writer
        .flush()
        .map_err(|source| Error::WriteArtifact(source, path.to_owned()))
}

fn write_json(
    path: &Path,
    info: &VideoInfo,
    body: &[BodyRecord],
    foot: &[FootRecord],
) -> Result<(), Error> {
    let mut writer = artifact_writer(path)?;
    let document = Document {
        video_info: info,
        keypoints: body,
        foot_keypoints: foot,
    };
    serde_json::to_writer_pretty(&mut writer, &document).map_err(Error::SerializeJson)?;
    writer
        .flush()
        .map_err(|source| Error::WriteArtifact(source, path.to_owned()))
}
