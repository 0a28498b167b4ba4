use crate::error::Error;
use num_traits::ToPrimitive;

/// The BODY_25 landmark set, in the exact order the pose engine reports
/// keypoints per detected person. Index `i` of an engine output array is
/// landmark `i` of this enum; any engine-side layout change invalidates it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, num_derive::FromPrimitive, num_derive::ToPrimitive)]
pub(crate) enum KeypointKind {
    Nose,
    Neck,
    RShoulder,
    RElbow,
    RWrist,
    LShoulder,
    LElbow,
    LWrist,
    MidHip,
    RHip,
    RKnee,
    RAnkle,
    LHip,
    LKnee,
    LAnkle,
    REye,
    LEye,
    REar,
    LEar,
    LBigToe,
    LSmallToe,
    LHeel,
    RBigToe,
    RSmallToe,
    RHeel,
}

pub(crate) const NUM_KEYPOINTS: usize = 25;

impl KeypointKind {
    pub(crate) fn idx(self) -> Result<usize, Error> {
        self.to_usize().ok_or(Error::KeypointVariantToUSize(self))
    }

    /// Column-name stem used by both tabular and structured output.
    pub(crate) fn name(self) -> &'static str {
        use KeypointKind::*;
        match self {
            Nose => "Nose",
            Neck => "Neck",
            RShoulder => "RShoulder",
            RElbow => "RElbow",
            RWrist => "RWrist",
            LShoulder => "LShoulder",
            LElbow => "LElbow",
            LWrist => "LWrist",
            MidHip => "MidHip",
            RHip => "RHip",
            RKnee => "RKnee",
            RAnkle => "RAnkle",
            LHip => "LHip",
            LKnee => "LKnee",
            LAnkle => "LAnkle",
            REye => "REye",
            LEye => "LEye",
            REar => "REar",
            LEar => "LEar",
            LBigToe => "LBigToe",
            LSmallToe => "LSmallToe",
            LHeel => "LHeel",
            RBigToe => "RBigToe",
            RSmallToe => "RSmallToe",
            RHeel => "RHeel",
        }
    }
}

/// One measured point. A zero triple doubles as "not detected", which is the
/// engine's own convention and is preserved all the way to the output files.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub(crate) struct Keypoint {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) conf: f32,
}

pub(crate) type Keypoints = [Keypoint; NUM_KEYPOINTS];

/// One person as reported by the pose engine for a single frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct Person {
    pub(crate) keypoints: Keypoints,
}

pub(crate) mod constants {
    use crate::pose::KeypointKind::{self, *};

    /// Engine output order, shared by record fields and CSV/JSON columns.
    pub(crate) const KEYPOINT_LAYOUT: [KeypointKind; super::NUM_KEYPOINTS] = [
        Nose, Neck, RShoulder, RElbow, RWrist, LShoulder, LElbow, LWrist, MidHip, RHip, RKnee,
        RAnkle, LHip, LKnee, LAnkle, REye, LEye, REar, LEar, LBigToe, LSmallToe, LHeel, RBigToe,
        RSmallToe, RHeel,
    ];

    /// Foot sub-layout: aliases into the body layout, not independent points.
    pub(crate) const FOOT_SIDES: [(&str, [KeypointKind; 3]); 2] = [
        ("left", [LBigToe, LSmallToe, LHeel]),
        ("right", [RBigToe, RSmallToe, RHeel]),
    ];

    pub(crate) const FOOT_POINT_NAMES: [&str; 3] = ["BigToe", "SmallToe", "Heel"];

    pub(crate) const NUM_FOOT_KEYPOINTS: usize = 6;

    /// BODY_25 skeleton pairs, used only for the overlay video.
    pub(crate) const KEYPOINT_EDGES: [(KeypointKind, KeypointKind); 24] = [
        (Neck, MidHip),
        (Neck, RShoulder),
        (Neck, LShoulder),
        (RShoulder, RElbow),
        (RElbow, RWrist),
        (LShoulder, LElbow),
        (LElbow, LWrist),
        (MidHip, RHip),
        (RHip, RKnee),
        (RKnee, RAnkle),
        (MidHip, LHip),
        (LHip, LKnee),
        (LKnee, LAnkle),
        (Neck, Nose),
        (Nose, REye),
        (REye, REar),
        (Nose, LEye),
        (LEye, LEar),
        (LAnkle, LBigToe),
        (LBigToe, LSmallToe),
        (LAnkle, LHeel),
        (RAnkle, RBigToe),
        (RBigToe, RSmallToe),
        (RAnkle, RHeel),
    ];
}
