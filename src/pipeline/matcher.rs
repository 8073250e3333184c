use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::embedding::{
    angular_distance_degrees, cosine_similarity, euclidean_distance, l2_normalize,
};

/// Thresholds for the three similarity votes and the minimum number of votes
/// required for a match. Each field is independently tunable.
///
/// `min_votes` is deliberately not validated: values above 3 can never be
/// reached by the vote count, so such a configuration always yields a
/// mismatch. The useful range is 1..=3.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchCriteria {
    pub min_votes: u32,
    pub cosine_threshold: f32,
    pub euclidean_threshold: f32,
    /// Degrees.
    pub angle_threshold: f32,
}

impl Default for MatchCriteria {
    fn default() -> Self {
        MatchCriteria {
            min_votes: 1,
            cosine_threshold: 0.4,
            euclidean_threshold: 1.0,
            angle_threshold: 50.0,
        }
    }
}

/// Outcome of one embedding comparison. Created fresh per call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchResult {
    pub cosine_similarity: f32,
    pub euclidean_distance: f32,
    /// Degrees, range [0, 180].
    pub angular_distance: f32,
    pub votes: u32,
    pub is_match: bool,
}

/// match_embeddings decides whether two raw face embeddings belong to the
/// same person.
///
/// Both embeddings are unit-normalized, then three partially-redundant
/// metrics are computed and thresholded independently; the final decision is
/// a minimum-vote-count rule over the three outcomes. Using three metrics on
/// the same pair keeps the decision stable when a single metric sits right at
/// its threshold.
///
/// # Arguments
/// * `a` - raw embedding of the first face
/// * `b` - raw embedding of the second face
/// * `criteria` - vote thresholds
///
/// # Returns
/// * `Result<MatchResult>`
pub fn match_embeddings(a: &[f32], b: &[f32], criteria: &MatchCriteria) -> Result<MatchResult> {
    if a.len() != b.len() {
        return Err(Error::EmbeddingDimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let emb_a = l2_normalize(a)?;
    let emb_b = l2_normalize(b)?;

    let cos_sim = cosine_similarity(&emb_a, &emb_b);
    let eucl_dist = euclidean_distance(&emb_a, &emb_b);
    let angle = angular_distance_degrees(cos_sim);

    let votes = [
        cos_sim > criteria.cosine_threshold,
        eucl_dist < criteria.euclidean_threshold,
        angle < criteria.angle_threshold,
    ]
    .iter()
    .filter(|&&passed| passed)
    .count() as u32;

    let is_match = votes >= criteria.min_votes;

    tracing::debug!(cos_sim, eucl_dist, angle, votes, is_match, "embeddings compared");

    Ok(MatchResult {
        cosine_similarity: cos_sim,
        euclidean_distance: eucl_dist,
        angular_distance: angle,
        votes,
        is_match,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria(min_votes: u32) -> MatchCriteria {
        MatchCriteria {
            min_votes,
            cosine_threshold: 0.4,
            euclidean_threshold: 1.0,
            angle_threshold: 50.0,
        }
    }

    #[test]
    fn test_identical_embeddings_pass_all_votes() {
        let emb = vec![0.5, -1.25, 2.0, 0.75];
        let result = match_embeddings(&emb, &emb, &criteria(1)).unwrap();

        assert!((result.cosine_similarity - 1.0).abs() < 1e-5);
        assert!(result.euclidean_distance < 1e-5);
        assert!(result.angular_distance < 1e-2);
        assert_eq!(result.votes, 3);
        assert!(result.is_match);
    }

    #[test]
    fn test_orthogonal_embeddings_fail_all_votes() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        let result = match_embeddings(&a, &b, &criteria(1)).unwrap();

        assert!(result.cosine_similarity.abs() < 1e-6);
        assert!((result.euclidean_distance - std::f32::consts::SQRT_2).abs() < 1e-4);
        assert!((result.angular_distance - 90.0).abs() < 1e-3);
        assert_eq!(result.votes, 0);
        assert!(!result.is_match);
    }

    #[test]
    fn test_min_votes_above_three_never_matches() {
        let emb = vec![1.0, 2.0, 3.0];
        let result = match_embeddings(&emb, &emb, &criteria(4)).unwrap();
        assert_eq!(result.votes, 3);
        assert!(!result.is_match);
    }

    #[test]
    fn test_is_match_tracks_vote_count() {
        let a = vec![1.0, 0.0];
        // 45 degrees from a: cosine ~0.707 (> 0.4), euclidean ~0.765 (< 1.0),
        // angle 45 (< 50): all three votes pass.
        let b = vec![1.0, 1.0];
        for min_votes in 1..=3 {
            let result = match_embeddings(&a, &b, &criteria(min_votes)).unwrap();
            assert_eq!(result.votes, 3);
            assert!(result.is_match);
        }

        // Tightened thresholds drop the cosine and angle votes.
        let tight = MatchCriteria {
            min_votes: 2,
            cosine_threshold: 0.9,
            euclidean_threshold: 1.0,
            angle_threshold: 10.0,
        };
        let result = match_embeddings(&a, &b, &tight).unwrap();
        assert_eq!(result.votes, 1);
        assert!(!result.is_match);
    }

    #[test]
    fn test_normalizes_before_comparing() {
        // Scaled copies of the same direction must compare as identical.
        let a = vec![1.0, 2.0, -1.0];
        let b: Vec<f32> = a.iter().map(|x| x * 37.5).collect();
        let result = match_embeddings(&a, &b, &criteria(3)).unwrap();
        assert!((result.cosine_similarity - 1.0).abs() < 1e-5);
        assert!(result.is_match);
    }

    #[test]
    fn test_zero_embedding_is_degenerate() {
        let err = match_embeddings(&[0.0, 0.0], &[1.0, 0.0], &criteria(1)).unwrap_err();
        assert!(matches!(err, crate::error::Error::DegenerateEmbedding));
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = match_embeddings(&[1.0, 0.0], &[1.0, 0.0, 0.0], &criteria(1)).unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::EmbeddingDimensionMismatch { left: 2, right: 3 }
        ));
    }

    #[test]
    fn test_default_criteria() {
        let c = MatchCriteria::default();
        assert_eq!(c.min_votes, 1);
        assert_eq!(c.cosine_threshold, 0.4);
        assert_eq!(c.euclidean_threshold, 1.0);
        assert_eq!(c.angle_threshold, 50.0);
    }
}
