use thiserror::Error;

/// Identifies which of the two input images an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageInput {
    First,
    Second,
}

impl std::fmt::Display for ImageInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageInput::First => write!(f, "first image"),
            ImageInput::Second => write!(f, "second image"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// The detector returned no face candidates for one of the inputs.
    #[error("no face detected in {input}")]
    NoFaceDetected { input: ImageInput },

    /// An embedding with zero (or non-finite) norm cannot be normalized.
    #[error("degenerate embedding: zero norm")]
    DegenerateEmbedding,

    #[error("embedding dimension mismatch: {left} vs {right}")]
    EmbeddingDimensionMismatch { left: usize, right: usize },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("inference error: {0}")]
    Inference(#[from] ort::Error),

    #[error("model error: {0}")]
    Model(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_face_detected_names_input() {
        let first = Error::NoFaceDetected {
            input: ImageInput::First,
        };
        let second = Error::NoFaceDetected {
            input: ImageInput::Second,
        };
        assert_eq!(first.to_string(), "no face detected in first image");
        assert_eq!(second.to_string(), "no face detected in second image");
    }
}
