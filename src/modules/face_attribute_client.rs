use std::path::Path;
use std::sync::Mutex;

use image::GrayImage;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use serde::{Deserialize, Serialize};

use crate::config::config::FaceAttributeConfig;
use crate::error::{Error, Result};
use crate::utils::image::gray_to_tensor;

/// Binary gender label produced by the gender classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// from_score maps the model probability onto a label.
    ///
    /// The boundary is fixed by the external model's convention: scores
    /// strictly below 0.5 are Male, everything else (0.5 included) is Female.
    pub fn from_score(score: f32) -> Self {
        if score < 0.5 {
            Gender::Male
        } else {
            Gender::Female
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gender::Male => write!(f, "Male"),
            Gender::Female => write!(f, "Female"),
        }
    }
}

/// ONNX client for a scalar-output attribute model (age regressor or gender
/// classifier). Both consume the same scaled single-channel NHWC crop.
pub struct FaceAttributeClient {
    session: Mutex<Session>,
    config: FaceAttributeConfig,
}

impl FaceAttributeClient {
    /// new loads the attribute model and initializes its session.
    pub fn new(model: &Path, config: FaceAttributeConfig) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(model)?;

        Ok(FaceAttributeClient {
            session: Mutex::new(session),
            config,
        })
    }

    pub fn input_size(&self) -> u32 {
        self.config.imsize
    }

    /// predict runs the model on a grayscale face crop and returns its single
    /// scalar output (a continuous age for the regressor, a probability for
    /// the gender classifier).
    ///
    /// # Arguments
    /// * `gray_face` - grayscale face crop; resized to the model input size
    ///
    /// # Returns
    /// * `Result<f32>`
    pub fn predict(&self, gray_face: &GrayImage) -> Result<f32> {
        let cfg = &self.config;
        let resized = if gray_face.dimensions() == (cfg.imsize, cfg.imsize) {
            gray_face.clone()
        } else {
            image::imageops::resize(
                gray_face,
                cfg.imsize,
                cfg.imsize,
                image::imageops::FilterType::Triangle,
            )
        };

        let im_tensor = gray_to_tensor(&resized, cfg.scale);
        let input_data: Vec<f32> = im_tensor.iter().copied().collect();
        let input_tensor = Tensor::from_array((
            [1usize, cfg.imsize as usize, cfg.imsize as usize, 1usize],
            input_data.into_boxed_slice(),
        ))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| Error::Model("attribute session lock poisoned".to_string()))?;
        let outputs = session.run(ort::inputs![cfg.input_name.as_str() => input_tensor])?;

        let output = outputs
            .iter()
            .next()
            .ok_or_else(|| Error::Model("attribute model returned no output".to_string()))?;
        let (_shape, data) = output.1.try_extract_tensor::<f32>()?;
        data.first()
            .copied()
            .ok_or_else(|| Error::Model("attribute model returned an empty tensor".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_boundary_is_female() {
        // The `< 0.5` boundary is exclusive for Male.
        assert_eq!(Gender::from_score(0.5), Gender::Female);
        assert_eq!(Gender::from_score(0.49999), Gender::Male);
        assert_eq!(Gender::from_score(0.0), Gender::Male);
        assert_eq!(Gender::from_score(1.0), Gender::Female);
    }

    #[test]
    fn test_gender_display() {
        assert_eq!(Gender::Male.to_string(), "Male");
        assert_eq!(Gender::Female.to_string(), "Female");
    }
}
