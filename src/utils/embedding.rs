use crate::error::{Error, Result};

/// l2_normalize divides the embedding by its L2 norm.
///
/// Real face embeddings are never exactly zero, but a zero-norm input would
/// otherwise propagate NaN through every metric, so it is rejected here.
///
/// # Arguments
/// * `v` - raw embedding slice
///
/// # Returns
/// * `Result<Vec<f32>>` - unit-norm copy of the embedding
pub fn l2_normalize(v: &[f32]) -> Result<Vec<f32>> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return Err(Error::DegenerateEmbedding);
    }
    Ok(v.iter().map(|x| x / norm).collect())
}

/// cosine_similarity computes the dot product of two vectors.
///
/// For unit-normalized inputs this equals the standard cosine similarity,
/// range [-1, 1].
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(a, b)| a * b).sum()
}

/// euclidean_distance computes the L2 norm of the element-wise difference.
/// For unit vectors the range is [0, 2].
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(a, b)| (a - b).powi(2))
        .sum::<f32>()
        .sqrt()
}

/// angular_distance_degrees converts a cosine similarity into an angle.
///
/// The clamp guards against dot products slightly outside [-1, 1] from
/// floating-point rounding, which would make `acos` return NaN.
pub fn angular_distance_degrees(cos_sim: f32) -> f32 {
    cos_sim.clamp(-1.0, 1.0).acos().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_normalize_unit_norm() {
        let v = l2_normalize(&[3.0, 4.0]).unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_l2_normalize_zero_vector() {
        let err = l2_normalize(&[0.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(err, crate::error::Error::DegenerateEmbedding));
    }

    #[test]
    fn test_cosine_self_similarity() {
        let v = l2_normalize(&[0.3, -1.2, 4.5]).unwrap();
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
        assert!(euclidean_distance(&v, &v) < 1e-6);
        assert!(angular_distance_degrees(cosine_similarity(&v, &v)) < 1e-3);
    }

    #[test]
    fn test_angular_distance_clamps_out_of_range() {
        // Rounding can push the dot product of identical unit vectors past 1.
        assert_eq!(angular_distance_degrees(1.0000001), 0.0);
        assert_eq!(angular_distance_degrees(-1.0000001), 180.0);
    }

    #[test]
    fn test_angular_distance_range() {
        let a = [1.0, 0.0];
        let opposite = [-1.0, 0.0];
        let orthogonal = [0.0, 1.0];
        assert!((angular_distance_degrees(cosine_similarity(&a, &opposite)) - 180.0).abs() < 1e-3);
        assert!((angular_distance_degrees(cosine_similarity(&a, &orthogonal)) - 90.0).abs() < 1e-3);
    }
}
