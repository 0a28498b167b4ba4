use crate::{
    error::Error,
    pose::{constants, Keypoint, Keypoints, NUM_KEYPOINTS},
};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Metadata reported by the video decoder. `frame_count` is whatever the
/// container claims and may be approximate; row counts always come from
/// frames actually decoded.
#[derive(Debug, Copy, Clone, PartialEq, serde::Serialize)]
pub(crate) struct VideoInfo {
    pub(crate) frame_count: u64,
    pub(crate) fps: f64,
    pub(crate) duration: f64,
}

/// One row of `keypoints.csv`: every decoded frame produces exactly one,
/// zero-filled unless a main person was selected for that frame.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BodyRecord {
    pub(crate) frame: u64,
    pub(crate) timestamp: f64,
    pub(crate) keypoints: Keypoints,
}

impl BodyRecord {
    pub(crate) fn zeroed(frame: u64, timestamp: f64) -> Self {
        Self {
            frame,
            timestamp,
            keypoints: [Keypoint::default(); NUM_KEYPOINTS],
        }
    }
}

/// One row of `foot_keypoints.csv`. Emitted only for frames with a
/// positively-scored main person, so the sequence is a strict subsequence
/// of the body records.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FootRecord {
    pub(crate) frame: u64,
    pub(crate) timestamp: f64,
    pub(crate) feet: [Keypoint; constants::NUM_FOOT_KEYPOINTS],
}

impl FootRecord {
    /// Copy the six foot aliases out of a full body keypoint array.
    pub(crate) fn from_keypoints(
        frame: u64,
        timestamp: f64,
        keypoints: &Keypoints,
    ) -> Result<Self, Error> {
        let mut feet = [Keypoint::default(); constants::NUM_FOOT_KEYPOINTS];
        let mut slot = 0;
        for &(_, kinds) in &constants::FOOT_SIDES {
            for &kind in &kinds {
                feet[slot] = keypoints[kind.idx()?];
                slot += 1;
            }
        }
        Ok(Self {
            frame,
            timestamp,
            feet,
        })
    }
}

/// Column-name stems for the body layout, in engine order.
pub(crate) fn body_column_stems() -> Vec<&'static str> {
    constants::KEYPOINT_LAYOUT
        .iter()
        .map(|kind| kind.name())
        .collect()
}

/// Column-name stems for the foot sub-layout: left then right, three points
/// each, matching the `feet` array order.
pub(crate) fn foot_column_stems() -> Vec<String> {
    let mut stems = Vec::with_capacity(constants::NUM_FOOT_KEYPOINTS);
    for &(side, _) in &constants::FOOT_SIDES {
        for name in &constants::FOOT_POINT_NAMES {
            stems.push(format!("{}_{}", side, name));
        }
    }
    stems
}

/// Full CSV header for the body table: `frame`, `timestamp`, then
/// `<stem>_x`, `<stem>_y`, `<stem>_conf` per landmark.
pub(crate) fn body_header() -> Vec<String> {
    header_from_stems(body_column_stems().into_iter())
}

pub(crate) fn foot_header() -> Vec<String> {
    header_from_stems(foot_column_stems().into_iter())
}

fn header_from_stems<S>(stems: impl Iterator<Item = S>) -> Vec<String>
where
    S: AsRef<str>,
{
    let mut columns = vec!["frame".to_owned(), "timestamp".to_owned()];
    for stem in stems {
        let stem = stem.as_ref();
        columns.push(format!("{}_x", stem));
        columns.push(format!("{}_y", stem));
        columns.push(format!("{}_conf", stem));
    }
    columns
}

fn serialize_keypoint_map<S, N>(
    serializer: S,
    frame: u64,
    timestamp: f64,
    stems: &[N],
    keypoints: &[Keypoint],
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    N: AsRef<str>,
{
    let mut map = serializer.serialize_map(Some(2 + 3 * keypoints.len()))?;
    map.serialize_entry("frame", &frame)?;
    map.serialize_entry("timestamp", &timestamp)?;
    for (stem, keypoint) in stems.iter().zip(keypoints) {
        let stem = stem.as_ref();
        map.serialize_entry(&format!("{}_x", stem), &keypoint.x)?;
        map.serialize_entry(&format!("{}_y", stem), &keypoint.y)?;
        map.serialize_entry(&format!("{}_conf", stem), &keypoint.conf)?;
    }
    map.end()
}

impl Serialize for BodyRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serialize_keypoint_map(
            serializer,
            self.frame,
            self.timestamp,
            &body_column_stems(),
            &self.keypoints,
        )
    }
}

impl Serialize for FootRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serialize_keypoint_map(
            serializer,
            self.frame,
            self.timestamp,
            &foot_column_stems(),
            &self.feet,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod header_tests {
        use super::*;

        #[test]
        fn body_header_has_77_columns() {
            let header = body_header();
            assert_eq!(header.len(), 2 + 3 * NUM_KEYPOINTS);
            assert_eq!(header[0], "frame");
            assert_eq!(header[1], "timestamp");
            assert_eq!(header[2], "Nose_x");
            assert_eq!(header[3], "Nose_y");
            assert_eq!(header[4], "Nose_conf");
            assert_eq!(header[76], "RHeel_conf");
        }

        #[test]
        fn foot_header_has_20_columns() {
            let header = foot_header();
            assert_eq!(header.len(), 2 + 3 * constants::NUM_FOOT_KEYPOINTS);
            assert_eq!(header[2], "left_BigToe_x");
            assert_eq!(header[19], "right_Heel_conf");
        }
    }

    mod foot_record_tests {
        use super::*;

        #[test]
        fn copies_aliased_indices() {
            let mut keypoints = [Keypoint::default(); NUM_KEYPOINTS];
            for (i, keypoint) in keypoints.iter_mut().enumerate() {
                keypoint.x = i as f32;
                keypoint.y = 100.0 + i as f32;
                keypoint.conf = 0.5;
            }
            let record = FootRecord::from_keypoints(7, 0.28, &keypoints).unwrap();
            let xs = record.feet.iter().map(|kp| kp.x).collect::<Vec<_>>();
            assert_eq!(xs, vec![19.0, 20.0, 21.0, 22.0, 23.0, 24.0]);
        }
    }

    mod serialize_tests {
        use super::*;

        #[test]
        fn body_record_frame_is_a_json_integer() {
            let record = BodyRecord::zeroed(3, 0.12);
            let value = serde_json::to_value(&record).unwrap();
            assert_eq!(value["frame"], serde_json::json!(3));
            assert!(value["frame"].is_u64());
            assert_eq!(value["Nose_x"], serde_json::json!(0.0));
        }

        #[test]
        fn field_order_matches_csv_columns() {
            let record = BodyRecord::zeroed(0, 0.0);
            let value = serde_json::to_value(&record).unwrap();
            let keys = value
                .as_object()
                .unwrap()
                .keys()
                .cloned()
                .collect::<Vec<_>>();
            assert_eq!(keys, body_header());
        }

        #[test]
        fn foot_record_field_order_matches_csv_columns() {
            let keypoints = [Keypoint::default(); NUM_KEYPOINTS];
            let record = FootRecord::from_keypoints(0, 0.0, &keypoints).unwrap();
            let value = serde_json::to_value(&record).unwrap();
            let keys = value
                .as_object()
                .unwrap()
                .keys()
                .cloned()
                .collect::<Vec<_>>();
            assert_eq!(keys, foot_header());
        }
    }
}
