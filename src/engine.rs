use crate::{
    error::Error,
    pose::{Keypoint, Person, NUM_KEYPOINTS},
};
use opencv::{
    core::{Mat, Scalar, Size, CV_32F},
    dnn,
    prelude::*,
};
use std::path::Path;
use tracing::info;

const PROTOTXT_NAME: &str = "pose_deploy.prototxt";
const CAFFEMODEL_NAME: &str = "pose_iter_584000.caffemodel";

/// Network input resolution; frames are letterbox-free resized by the blob
/// builder and peaks are scaled back to frame coordinates.
const NET_INPUT_SIZE: i32 = 368;

/// The opaque pose-estimation boundary: one frame in, zero or more detected
/// people out. Everything downstream of this trait works on plain `Person`
/// values and never touches the backing model.
pub(crate) trait PoseEngine {
    fn detect(&mut self, frame: &Mat) -> Result<Vec<Person>, Error>;
}

/// BODY_25 Caffe model run through OpenCV's dnn module.
pub(crate) struct DnnEngine {
    net: dnn::Net,
}

impl DnnEngine {
    /// Load the model files from `model_dir`. A missing or unloadable model
    /// is the fatal startup condition; it is checked before any input video
    /// is fetched.
    pub(crate) fn new(model_dir: &Path) -> Result<Self, Error> {
        let prototxt = model_dir.join(PROTOTXT_NAME);
        let caffemodel = model_dir.join(CAFFEMODEL_NAME);
        for path in &[&prototxt, &caffemodel] {
            if !path.exists() {
                return Err(Error::ModelFileMissing(path.to_path_buf()));
            }
        }
        let net = dnn::read_net_from_caffe(
            &prototxt.to_string_lossy(),
            &caffemodel.to_string_lossy(),
        )
        .map_err(|source| Error::LoadModel(source, caffemodel.clone()))?;
        info!(message = "loaded pose model", model = %caffemodel.display());
        Ok(Self { net })
    }
}

impl PoseEngine for DnnEngine {
    /// Run one forward pass and read the per-landmark heatmap peaks. A peak
    /// with non-positive confidence leaves the zero triple in place, which
    /// is the engine-side convention for an unmeasured point. A frame whose
    /// every landmark came back zero reports no people at all.
    fn detect(&mut self, frame: &Mat) -> Result<Vec<Person>, Error> {
        let blob = dnn::blob_from_image(
            frame,
            1.0 / 255.0,
            Size::new(NET_INPUT_SIZE, NET_INPUT_SIZE),
            Scalar::default(),
            false,
            false,
            CV_32F,
        )
        .map_err(Error::BuildInputBlob)?;
        self.net
            .set_input(&blob, "", 1.0, Scalar::default())
            .map_err(Error::SetNetInput)?;
        let heatmaps = self.net.forward_single("").map_err(Error::RunForward)?;

        let size = heatmaps.mat_size();
        let dims = &*size;
        if dims.len() != 4 || (dims[1] as usize) < NUM_KEYPOINTS {
            return Err(Error::HeatmapShape(dims.to_vec()));
        }
        let map_height = dims[2];
        let map_width = dims[3];

        let frame_width = frame.cols() as f32;
        let frame_height = frame.rows() as f32;

        let mut keypoints = [Keypoint::default(); NUM_KEYPOINTS];
        let mut any = false;
        for (channel, keypoint) in keypoints.iter_mut().enumerate() {
            let mut best = 0.0_f32;
            let mut best_x = 0;
            let mut best_y = 0;
            for y in 0..map_height {
                for x in 0..map_width {
                    let value = *heatmaps
                        .at_nd::<f32>(&[0, channel as i32, y, x])
                        .map_err(Error::ReadHeatmap)?;
                    if value > best {
                        best = value;
                        best_x = x;
                        best_y = y;
                    }
                }
            }
            if best > 0.0 {
                keypoint.x = best_x as f32 * frame_width / map_width as f32;
                keypoint.y = best_y as f32 * frame_height / map_height as f32;
                keypoint.conf = best;
                any = true;
            }
        }

        if any {
            Ok(vec![Person { keypoints }])
        } else {
            Ok(Vec::new())
        }
    }
}
