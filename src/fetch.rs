use crate::error::Error;
use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
};
use tempfile::TempDir;
use tracing::{info, warn};

/// A video downloaded into a scratch directory. Dropping the value removes
/// the scratch directory, so a fetch that fails mid-run cleans up after
/// itself; callers that want to keep the bytes call `preserve_into` first.
pub(crate) struct FetchedVideo {
    path: PathBuf,
    scratch: Option<TempDir>,
}

impl FetchedVideo {
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Copy the fetched video into `dir` (unless a file with the same name
    /// already exists there), then remove the scratch directory. Ordered
    /// this way so the exact input survives for post-hoc inspection.
    pub(crate) fn preserve_into(mut self, dir: &Path) -> Result<(), Error> {
        fs::create_dir_all(dir).map_err(|source| Error::CreateOutputDir(source, dir.to_owned()))?;
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_owned())
            .unwrap_or_else(|| DEFAULT_FILENAME.into());
        let destination = dir.join(file_name);
        if !destination.exists() {
            fs::copy(&self.path, &destination)
                .map_err(|source| Error::PreserveVideo(source, destination.clone()))?;
            info!(message = "copied fetched video to output directory", path = %destination.display());
        }
        if let Some(scratch) = self.scratch.take() {
            scratch.close().map_err(Error::RemoveScratchDir)?;
            info!(message = "removed scratch directory");
        }
        Ok(())
    }
}

impl Drop for FetchedVideo {
    fn drop(&mut self) {
        // TempDir removal happens implicitly; surface failures instead of
        // swallowing them silently.
        if let Some(scratch) = self.scratch.take() {
            if let Err(source) = scratch.close() {
                warn!(message = "failed to remove scratch directory", error = %source);
            }
        }
    }
}

const DEFAULT_FILENAME: &str = "downloaded_video.mp4";

/// Derive a local filename from the URL's last path segment; anything empty
/// or extension-less falls back to a fixed name.
fn filename_from_url(url: &str) -> &str {
    let candidate = url.rsplit('/').next().unwrap_or("");
    if candidate.is_empty() || !candidate.contains('.') {
        DEFAULT_FILENAME
    } else {
        candidate
    }
}

/// Download `url` into a fresh scratch directory. A failed fetch removes
/// the scratch directory before returning the error.
pub(crate) fn download(url: &str) -> Result<FetchedVideo, Error> {
    let scratch = tempfile::tempdir().map_err(Error::CreateScratchDir)?;
    let path = scratch.path().join(filename_from_url(url));

    info!(message = "downloading video", url);
    let response = ureq::get(url)
        .call()
        .map_err(|source| Error::FetchVideo(Box::new(source), url.to_owned()))?;
    let mut file =
        File::create(&path).map_err(|source| Error::WriteDownload(source, path.clone()))?;
    io::copy(&mut response.into_reader(), &mut file)
        .map_err(|source| Error::WriteDownload(source, path.clone()))?;
    info!(message = "downloaded video", path = %path.display());

    Ok(FetchedVideo {
        path,
        scratch: Some(scratch),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    mod filename_from_url_tests {
        use super::*;

        #[test]
        fn takes_the_last_path_segment() {
            assert_eq!(
                filename_from_url("https://example.com/videos/clip_01.mp4"),
                "clip_01.mp4"
            );
        }

        #[test]
        fn trailing_slash_falls_back() {
            assert_eq!(
                filename_from_url("https://example.com/videos/"),
                DEFAULT_FILENAME
            );
        }

        #[test]
        fn extensionless_segment_falls_back() {
            assert_eq!(
                filename_from_url("https://example.com/videos/stream"),
                DEFAULT_FILENAME
            );
        }
    }

    mod preserve_tests {
        use super::*;

        fn fake_fetch(contents: &str) -> FetchedVideo {
            let scratch = tempfile::tempdir().unwrap();
            let path = scratch.path().join("clip.mp4");
            fs::write(&path, contents).unwrap();
            FetchedVideo {
                path,
                scratch: Some(scratch),
            }
        }

        #[test]
        fn copies_video_and_removes_scratch() {
            let fetched = fake_fetch("bytes");
            let scratch_path = fetched.scratch.as_ref().unwrap().path().to_owned();
            let out = tempfile::tempdir().unwrap();

            fetched.preserve_into(out.path()).unwrap();

            assert_eq!(
                fs::read_to_string(out.path().join("clip.mp4")).unwrap(),
                "bytes"
            );
            assert!(!scratch_path.exists());
        }

        #[test]
        fn existing_destination_is_left_alone() {
            let fetched = fake_fetch("new bytes");
            let out = tempfile::tempdir().unwrap();
            fs::write(out.path().join("clip.mp4"), "old bytes").unwrap();

            fetched.preserve_into(out.path()).unwrap();

            assert_eq!(
                fs::read_to_string(out.path().join("clip.mp4")).unwrap(),
                "old bytes"
            );
        }

        #[test]
        fn drop_removes_scratch() {
            let fetched = fake_fetch("bytes");
            let scratch_path = fetched.scratch.as_ref().unwrap().path().to_owned();
            drop(fetched);
            assert!(!scratch_path.exists());
        }
    }
}
