use crate::modules::face_detection_client::DetectedFace;

/// get_largest_face selects the most prominent candidate: the face whose
/// bounding box covers the largest area. Ties keep the first candidate in
/// detector order.
///
/// # Arguments
/// * `faces` - detector candidates
///
/// # Returns
/// * `Option<&DetectedFace>` - `None` when the list is empty
pub fn get_largest_face(faces: &[DetectedFace]) -> Option<&DetectedFace> {
    let mut best: Option<&DetectedFace> = None;
    for face in faces {
        match best {
            Some(current) if face.bbox.area() <= current.bbox.area() => {}
            _ => best = Some(face),
        }
    }
    best
}
