//! Face identity across consecutive frames

use tracing::debug;

use crate::geometry::FaceBbox;
use crate::state::FaceId;

/// Track assignment for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Association {
    /// Face id per detection, in detection order
    pub ids: Vec<FaceId>,
    /// Tracks that were not seen in this frame
    pub dropped: Vec<FaceId>,
}

/// Associates detections with tracks by bounding-box overlap
///
/// A track lives while its face is detected in consecutive frames. Frames
/// without any detection leave every track untouched.
pub struct FaceTracker {
    tracks: Vec<(FaceId, FaceBbox)>,
    next_id: u64,
    min_iou: f32,
}

impl FaceTracker {
    pub fn new(min_iou: f32) -> Self {
        Self {
            tracks: Vec::new(),
            next_id: 1,
            min_iou,
        }
    }

    /// Assign ids to this frame's detections
    pub fn associate(&mut self, boxes: &[FaceBbox]) -> Association {
        if boxes.is_empty() {
            return Association::default();
        }

        let mut candidates = Vec::new();
        for (t, (_, track_box)) in self.tracks.iter().enumerate() {
            for (d, bbox) in boxes.iter().enumerate() {
                let iou = track_box.iou(bbox);
                if iou >= self.min_iou && iou > 0.0 {
                    candidates.push((iou, t, d));
                }
            }
        }
        candidates.sort_by(|a, b| b.0.total_cmp(&a.0));

        let mut track_taken = vec![false; self.tracks.len()];
        let mut assigned: Vec<Option<FaceId>> = vec![None; boxes.len()];
        for (_, t, d) in candidates {
            if track_taken[t] || assigned[d].is_some() {
                continue;
            }
            track_taken[t] = true;
            assigned[d] = Some(self.tracks[t].0);
        }

        let dropped: Vec<FaceId> = self
            .tracks
            .iter()
            .zip(&track_taken)
            .filter(|(_, taken)| !**taken)
            .map(|((id, _), _)| *id)
            .collect();

        let mut tracks = Vec::with_capacity(boxes.len());
        let mut ids = Vec::with_capacity(boxes.len());
        for (bbox, slot) in boxes.iter().zip(assigned) {
            let id = match slot {
                Some(id) => id,
                None => {
                    let id = FaceId(self.next_id);
                    self.next_id += 1;
                    debug!("New face track {}", id);
                    id
                }
            };
            tracks.push((id, *bbox));
            ids.push(id);
        }
        self.tracks = tracks;

        for id in &dropped {
            debug!("Face track {} lost", id);
        }

        Association { ids, dropped }
    }

    /// Number of live tracks
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(x: f32, y: f32) -> FaceBbox {
        FaceBbox::new(x, y, 100.0, 100.0)
    }

    #[test]
    fn test_new_faces_get_fresh_ids() {
        let mut tracker = FaceTracker::new(0.3);
        let assoc = tracker.associate(&[bbox(0.0, 0.0), bbox(300.0, 0.0)]);
        assert_eq!(assoc.ids, vec![FaceId(1), FaceId(2)]);
        assert!(assoc.dropped.is_empty());
    }

    #[test]
    fn test_moving_face_keeps_id() {
        let mut tracker = FaceTracker::new(0.3);
        tracker.associate(&[bbox(0.0, 0.0), bbox(300.0, 0.0)]);

        // reversed order, small motion
        let assoc = tracker.associate(&[bbox(305.0, 2.0), bbox(10.0, 5.0)]);
        assert_eq!(assoc.ids, vec![FaceId(2), FaceId(1)]);
    }

    #[test]
    fn test_unseen_track_dropped() {
        let mut tracker = FaceTracker::new(0.3);
        tracker.associate(&[bbox(0.0, 0.0), bbox(300.0, 0.0)]);

        let assoc = tracker.associate(&[bbox(0.0, 0.0)]);
        assert_eq!(assoc.ids, vec![FaceId(1)]);
        assert_eq!(assoc.dropped, vec![FaceId(2)]);
        assert_eq!(tracker.track_count(), 1);
    }

    #[test]
    fn test_empty_frame_is_noop() {
        let mut tracker = FaceTracker::new(0.3);
        tracker.associate(&[bbox(0.0, 0.0)]);

        let assoc = tracker.associate(&[]);
        assert_eq!(assoc, Association::default());
        assert_eq!(tracker.track_count(), 1);

        let assoc = tracker.associate(&[bbox(1.0, 1.0)]);
        assert_eq!(assoc.ids, vec![FaceId(1)]);
    }

    #[test]
    fn test_jump_opens_new_track() {
        let mut tracker = FaceTracker::new(0.3);
        tracker.associate(&[bbox(0.0, 0.0)]);
        let assoc = tracker.associate(&[bbox(500.0, 500.0)]);
        assert_eq!(assoc.ids, vec![FaceId(2)]);
        assert_eq!(assoc.dropped, vec![FaceId(1)]);
    }
}
