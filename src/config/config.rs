use serde::{Deserialize, Serialize};

/// Preprocessing and postprocessing constants for the UltraFace-style detector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FaceDetectionConfig {
    pub input_name: String,
    pub scores_output: String,
    pub boxes_output: String,
    pub input_width: u32,
    pub input_height: u32,
    pub mean: f32,
    pub scale: f32,
    pub confidence_threshold: f32,
    pub nms_threshold: f32,
}

impl Default for FaceDetectionConfig {
    fn default() -> Self {
        FaceDetectionConfig {
            input_name: "input".to_string(),
            scores_output: "scores".to_string(),
            boxes_output: "boxes".to_string(),
            input_width: 320,
            input_height: 240,
            mean: 127.0,
            scale: 1.0 / 128.0,
            confidence_threshold: 0.7,
            nms_threshold: 0.3,
        }
    }
}

/// Preprocessing constants for the ArcFace-style embedder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FaceEmbeddingConfig {
    pub input_name: String,
    pub imsize: (u32, u32),
    pub mean: f32,
    pub scale: f32,
    /// Fraction of the detected box added on each side before embedding.
    pub crop_padding: f32,
}

impl Default for FaceEmbeddingConfig {
    fn default() -> Self {
        FaceEmbeddingConfig {
            input_name: "data".to_string(),
            imsize: (112, 112),
            mean: 127.5,
            scale: 1.0 / 127.5,
            crop_padding: 0.2,
        }
    }
}

/// Preprocessing constants shared by the age and gender attribute models,
/// which both consume a scaled single-channel 112x112 crop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FaceAttributeConfig {
    pub input_name: String,
    pub imsize: u32,
    pub scale: f32,
}

impl Default for FaceAttributeConfig {
    fn default() -> Self {
        FaceAttributeConfig {
            input_name: "input".to_string(),
            imsize: 112,
            scale: 1.0 / 255.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_roundtrip() {
        let cfg = FaceDetectionConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: FaceDetectionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
