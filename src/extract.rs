use crate::{
    error::Error,
    pose::Person,
    record::{BodyRecord, FootRecord},
};
use ordered_float::NotNan;

/// The main person chosen for one frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct Selection {
    pub(crate) index: usize,
    pub(crate) score: f32,
}

/// Mean confidence over the keypoints whose confidence is strictly positive.
/// A person with no positively-confident points scores exactly 0.
pub(crate) fn mean_positive_confidence(person: &Person) -> f32 {
    let mut sum = 0.0_f32;
    let mut count = 0_u32;
    for keypoint in &person.keypoints {
        if keypoint.conf > 0.0 {
            sum += keypoint.conf;
            count += 1;
        }
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}

/// Stable argmax over per-person scores: only a strictly greater score
/// replaces the current best, so the earliest of tied people wins. The
/// choice is made per frame, with no identity carried across frames.
pub(crate) fn select_main_person(people: &[Person]) -> Result<Option<Selection>, Error> {
    let mut best: Option<(usize, NotNan<f32>)> = None;
    for (index, person) in people.iter().enumerate() {
        let raw = mean_positive_confidence(person);
        let score = NotNan::new(raw).map_err(|source| Error::ConstructNotNan(source, raw))?;
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((index, score)),
        }
    }
    Ok(best.map(|(index, score)| Selection {
        index,
        score: score.into_inner(),
    }))
}

/// Accumulates one body record per frame and a sparse foot-record sequence,
/// in frame order.
pub(crate) struct Extractor {
    fps: f64,
    frame: u64,
    body: Vec<BodyRecord>,
    foot: Vec<FootRecord>,
}

impl Extractor {
    pub(crate) fn new(fps: f64, frame_count_hint: u64) -> Self {
        Self {
            fps,
            frame: 0,
            body: Vec::with_capacity(frame_count_hint as usize),
            foot: Vec::new(),
        }
    }

    /// Convert one frame's detections into records. The body record starts
    /// fully zeroed and is overwritten index-for-index when a main person
    /// exists. A foot record is emitted only when the main person's score is
    /// strictly positive; a frame with no detections contributes no foot row
    /// at all, not a zero-filled one.
    pub(crate) fn push(&mut self, people: &[Person]) -> Result<(), Error> {
        let timestamp = self.frame as f64 / self.fps;
        let mut record = BodyRecord::zeroed(self.frame, timestamp);
        if let Some(selection) = select_main_person(people)? {
            let person = &people[selection.index];
            record.keypoints = person.keypoints;
            if selection.score > 0.0 {
                self.foot.push(FootRecord::from_keypoints(
                    self.frame,
                    timestamp,
                    &person.keypoints,
                )?);
            }
        }
        self.body.push(record);
        self.frame += 1;
        Ok(())
    }

    pub(crate) fn frames_processed(&self) -> u64 {
        self.frame
    }

    pub(crate) fn finish(self) -> (Vec<BodyRecord>, Vec<FootRecord>) {
        (self.body, self.foot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{Keypoint, NUM_KEYPOINTS};
    use assert_approx_eq::assert_approx_eq;

    fn person_with_confidences(confidences: &[f32]) -> Person {
        let mut keypoints = [Keypoint::default(); NUM_KEYPOINTS];
        for (keypoint, &conf) in keypoints.iter_mut().zip(confidences) {
            // engine convention: unmeasured points are a full zero triple
            if conf != 0.0 {
                keypoint.x = 10.0;
                keypoint.y = 20.0;
                keypoint.conf = conf;
            }
        }
        Person { keypoints }
    }

    mod mean_positive_confidence_tests {
        use super::*;

        #[test]
        fn ignores_non_positive_points() {
            let person = person_with_confidences(&[0.8, 0.0, 0.4, 0.0]);
            assert_approx_eq!(mean_positive_confidence(&person), 0.6);
        }

        #[test]
        fn all_zero_scores_zero() {
            let person = person_with_confidences(&[0.0; NUM_KEYPOINTS]);
            assert_eq!(mean_positive_confidence(&person), 0.0);
        }
    }

    mod select_main_person_tests {
        use super::*;

        #[test]
        fn empty_slice_selects_nobody() {
            assert_eq!(select_main_person(&[]).unwrap(), None);
        }

        #[test]
        fn highest_mean_wins() {
            let people = vec![
                person_with_confidences(&[0.4, 0.4]),
                person_with_confidences(&[0.6, 0.6]),
            ];
            let selection = select_main_person(&people).unwrap().unwrap();
            assert_eq!(selection.index, 1);
            assert_approx_eq!(selection.score, 0.6);
        }

        #[test]
        fn first_occurrence_wins_on_exact_tie() {
            let people = vec![
                person_with_confidences(&[0.5, 0.5]),
                person_with_confidences(&[0.5, 0.5]),
            ];
            let selection = select_main_person(&people).unwrap().unwrap();
            assert_eq!(selection.index, 0);
        }

        #[test]
        fn all_zero_person_is_selected_with_zero_score() {
            let people = vec![person_with_confidences(&[0.0; NUM_KEYPOINTS])];
            let selection = select_main_person(&people).unwrap().unwrap();
            assert_eq!(selection.index, 0);
            assert_eq!(selection.score, 0.0);
        }

        #[test]
        fn nan_confidence_is_an_error() {
            let people = vec![person_with_confidences(&[f32::NAN])];
            assert!(select_main_person(&people).is_err());
        }
    }

    mod extractor_tests {
        use super::*;

        #[test]
        fn frame_numbers_are_contiguous_from_zero() {
            let mut extractor = Extractor::new(25.0, 3);
            for _ in 0..3 {
                extractor.push(&[]).unwrap();
            }
            let (body, foot) = extractor.finish();
            let frames = body.iter().map(|r| r.frame).collect::<Vec<_>>();
            assert_eq!(frames, vec![0, 1, 2]);
            assert!(foot.is_empty());
        }

        #[test]
        fn timestamp_is_frame_over_fps() {
            let mut extractor = Extractor::new(25.0, 41);
            for _ in 0..41 {
                extractor.push(&[]).unwrap();
            }
            let (body, _) = extractor.finish();
            assert_approx_eq!(body[40].timestamp, 1.6);
        }

        #[test]
        fn undetected_frame_is_fully_zero() {
            let mut extractor = Extractor::new(30.0, 1);
            extractor.push(&[]).unwrap();
            let (body, _) = extractor.finish();
            for keypoint in &body[0].keypoints {
                assert_eq!(*keypoint, Keypoint::default());
            }
        }

        #[test]
        fn detected_frame_copies_all_keypoints() {
            let mut keypoints = [Keypoint::default(); NUM_KEYPOINTS];
            for (i, keypoint) in keypoints.iter_mut().enumerate() {
                keypoint.x = i as f32;
                keypoint.y = 2.0 * i as f32;
                keypoint.conf = 0.9;
            }
            let mut extractor = Extractor::new(30.0, 1);
            extractor.push(&[Person { keypoints }]).unwrap();
            let (body, foot) = extractor.finish();
            assert_eq!(body[0].keypoints, keypoints);
            assert_eq!(foot.len(), 1);
            assert_eq!(foot[0].feet[0].x, 19.0);
        }

        // 3-frame scenario: an all-zero-confidence person, then two people
        // with different scores, then an empty frame.
        #[test]
        fn three_frame_scenario() {
            let ghost = person_with_confidences(&[0.0; NUM_KEYPOINTS]);
            let person_a = person_with_confidences(&[0.4; NUM_KEYPOINTS]);
            let person_b = person_with_confidences(&[0.6; NUM_KEYPOINTS]);

            let mut extractor = Extractor::new(25.0, 3);
            extractor.push(&[ghost]).unwrap();
            extractor.push(&[person_a, person_b]).unwrap();
            extractor.push(&[]).unwrap();
            let (body, foot) = extractor.finish();

            assert_eq!(body.len(), 3);
            for keypoint in &body[0].keypoints {
                assert_eq!(*keypoint, Keypoint::default());
            }
            assert_approx_eq!(body[1].keypoints[0].conf, 0.6);
            for keypoint in &body[2].keypoints {
                assert_eq!(*keypoint, Keypoint::default());
            }

            assert_eq!(foot.len(), 1);
            assert_eq!(foot[0].frame, 1);
        }

        #[test]
        fn foot_sequence_is_a_subsequence_of_detected_frames() {
            let person = person_with_confidences(&[0.7; NUM_KEYPOINTS]);
            let mut extractor = Extractor::new(24.0, 4);
            extractor.push(&[person]).unwrap();
            extractor.push(&[]).unwrap();
            extractor.push(&[person]).unwrap();
            extractor.push(&[]).unwrap();
            let (body, foot) = extractor.finish();
            assert_eq!(body.len(), 4);
            assert_eq!(foot.iter().map(|r| r.frame).collect::<Vec<_>>(), vec![0, 2]);
        }
    }
}
