use image::DynamicImage;
use serde::Serialize;

use crate::error::{Error, ImageInput, Result};
use crate::helper::face_helper::get_largest_face;
use crate::modules::face_attribute_client::{FaceAttributeClient, Gender};
use crate::modules::face_detection_client::{DetectedFace, FaceDetectionClient};
use crate::pipeline::matcher::{match_embeddings, MatchCriteria, MatchResult};
use crate::utils::image::{decode_image, gray_face_crop};

/// Age and gender estimated for one face.
#[derive(Debug, Clone, Serialize)]
pub struct FaceAttributes {
    /// Ceiling of the regression output, clamped below at zero.
    pub age: u32,
    pub gender: Gender,
    pub gender_score: f32,
}

/// Structured verification outcome, one per comparison request. The caller
/// owns presentation; nothing here is formatted.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub first: FaceAttributes,
    pub second: FaceAttributes,
    pub matching: MatchResult,
}

/// VerificationPipeline wires the detector/embedder and the two attribute
/// models together. One instance serves requests start-to-finish with no
/// state retained between calls.
pub struct VerificationPipeline {
    face_det: FaceDetectionClient,
    age: FaceAttributeClient,
    gender: FaceAttributeClient,
}

impl VerificationPipeline {
    /// new initializes new instance of the pipeline.
    pub fn new(
        face_detection_client: FaceDetectionClient,
        age_client: FaceAttributeClient,
        gender_client: FaceAttributeClient,
    ) -> Self {
        VerificationPipeline {
            face_det: face_detection_client,
            age: age_client,
            gender: gender_client,
        }
    }

    /// verify compares the most prominent face of each image and estimates
    /// per-face age and gender.
    ///
    /// # Arguments
    /// * `first` - first decoded image
    /// * `second` - second decoded image
    /// * `criteria` - vote thresholds for the match decision
    ///
    /// # Returns
    /// * `Result<VerificationReport>`
    pub fn verify(
        &self,
        first: &DynamicImage,
        second: &DynamicImage,
        criteria: &MatchCriteria,
    ) -> Result<VerificationReport> {
        let (face_1, attrs_1) = self.analyze(first, ImageInput::First)?;
        let (face_2, attrs_2) = self.analyze(second, ImageInput::Second)?;

        let matching = match_embeddings(&face_1.embedding, &face_2.embedding, criteria)?;

        tracing::info!(
            votes = matching.votes,
            is_match = matching.is_match,
            "verification completed"
        );

        Ok(VerificationReport {
            first: attrs_1,
            second: attrs_2,
            matching,
        })
    }

    /// verify_bytes decodes two encoded images and runs `verify`.
    pub fn verify_bytes(
        &self,
        first: &[u8],
        second: &[u8],
        criteria: &MatchCriteria,
    ) -> Result<VerificationReport> {
        let img_1 = decode_image(first)?;
        let img_2 = decode_image(second)?;
        self.verify(&img_1, &img_2, criteria)
    }

    /// analyze detects faces in one image, keeps the largest, and estimates
    /// its attributes from a grayscale crop.
    fn analyze(
        &self,
        img: &DynamicImage,
        input: ImageInput,
    ) -> Result<(DetectedFace, FaceAttributes)> {
        let faces = self.face_det.detect(img)?;
        let face = get_largest_face(&faces)
            .ok_or(Error::NoFaceDetected { input })?
            .clone();

        let gray = gray_face_crop(img, &face.bbox, self.age.input_size());
        let age_raw = self.age.predict(&gray)?;
        let gender_score = self.gender.predict(&gray)?;

        let attributes = FaceAttributes {
            age: age_raw.max(0.0).ceil() as u32,
            gender: Gender::from_score(gender_score),
            gender_score,
        };

        tracing::debug!(
            %input,
            age = attributes.age,
            gender = %attributes.gender,
            "face analyzed"
        );

        Ok((face, attributes))
    }
}
