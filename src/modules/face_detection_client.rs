use std::path::Path;
use std::sync::Mutex;

use image::{DynamicImage, GenericImageView};
use ndarray::Array3;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use serde::Serialize;

use crate::config::config::{FaceDetectionConfig, FaceEmbeddingConfig};
use crate::error::{Error, Result};
use crate::utils::coordinate::BoundingBox;
use crate::utils::image::crop_face;

/// A detected face candidate.
///
/// The embedding is returned exactly as the model produced it; unit
/// normalization happens in the matcher.
#[derive(Debug, Clone, Serialize)]
pub struct DetectedFace {
    pub bbox: BoundingBox,
    pub embedding: Vec<f32>,
    pub confidence: f32,
}

/// ONNX client wrapping an UltraFace-style detector and an ArcFace-style
/// embedder. Sessions are locked per call; `ort` requires mutable access
/// to run inference.
pub struct FaceDetectionClient {
    detection_session: Mutex<Session>,
    embedding_session: Mutex<Session>,
    detection_config: FaceDetectionConfig,
    embedding_config: FaceEmbeddingConfig,
}

impl FaceDetectionClient {
    /// new loads both model files and initializes their sessions.
    ///
    /// # Arguments
    /// * `detection_model` - path to the face detector ONNX file
    /// * `embedding_model` - path to the face embedder ONNX file
    /// * `detection_config` - detector preprocessing constants
    /// * `embedding_config` - embedder preprocessing constants
    ///
    /// # Returns
    /// * `Result<Self>`
    pub fn new(
        detection_model: &Path,
        embedding_model: &Path,
        detection_config: FaceDetectionConfig,
        embedding_config: FaceEmbeddingConfig,
    ) -> Result<Self> {
        let detection_session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(detection_model)?;

        let embedding_session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(embedding_model)?;

        Ok(FaceDetectionClient {
            detection_session: Mutex::new(detection_session),
            embedding_session: Mutex::new(embedding_session),
            detection_config,
            embedding_config,
        })
    }

    /// detect returns every face candidate in the image, each with its raw
    /// embedding vector. An empty vector means no face was found.
    ///
    /// # Arguments
    /// * `img` - decoded input image
    ///
    /// # Returns
    /// * `Result<Vec<DetectedFace>>`
    pub fn detect(&self, img: &DynamicImage) -> Result<Vec<DetectedFace>> {
        let face_boxes = self.detect_boxes(img)?;

        let mut detected_faces = Vec::with_capacity(face_boxes.len());
        for (bbox, confidence) in face_boxes {
            if bbox.width <= 0 || bbox.height <= 0 {
                continue;
            }
            let face_img = crop_face(img, &bbox, self.embedding_config.crop_padding);
            let embedding = self.embed(&face_img)?;
            detected_faces.push(DetectedFace {
                bbox,
                embedding,
                confidence,
            });
        }

        tracing::debug!(faces = detected_faces.len(), "face detection completed");
        Ok(detected_faces)
    }

    /// detect_boxes runs the detector and returns score-filtered,
    /// NMS-deduplicated boxes scaled back to original image coordinates.
    fn detect_boxes(&self, img: &DynamicImage) -> Result<Vec<(BoundingBox, f32)>> {
        let cfg = &self.detection_config;
        let (orig_width, orig_height) = img.dimensions();

        let input_data = self.preprocess_detection(img);
        let input_tensor = Tensor::from_array((
            [
                1usize,
                3,
                cfg.input_height as usize,
                cfg.input_width as usize,
            ],
            input_data.into_boxed_slice(),
        ))?;

        let mut session = self
            .detection_session
            .lock()
            .map_err(|_| Error::Model("detection session lock poisoned".to_string()))?;
        let outputs = session.run(ort::inputs![cfg.input_name.as_str() => input_tensor])?;

        let scores_value = outputs
            .get(cfg.scores_output.as_str())
            .ok_or_else(|| Error::Model(format!("missing detector output {}", cfg.scores_output)))?;
        let boxes_value = outputs
            .get(cfg.boxes_output.as_str())
            .ok_or_else(|| Error::Model(format!("missing detector output {}", cfg.boxes_output)))?;

        let (scores_shape, scores_data) = scores_value.try_extract_tensor::<f32>()?;
        let (_boxes_shape, boxes_data) = boxes_value.try_extract_tensor::<f32>()?;

        // scores shape: [1, num_anchors, 2] (background, face)
        // boxes shape: [1, num_anchors, 4] (x1, y1, x2, y2 normalized)
        let num_anchors = scores_shape[1] as usize;
        let mut face_boxes = Vec::new();

        for i in 0..num_anchors {
            let confidence = scores_data[i * 2 + 1];
            if confidence <= cfg.confidence_threshold {
                continue;
            }

            let x1 = (boxes_data[i * 4] * orig_width as f32) as i32;
            let y1 = (boxes_data[i * 4 + 1] * orig_height as f32) as i32;
            let x2 = (boxes_data[i * 4 + 2] * orig_width as f32) as i32;
            let y2 = (boxes_data[i * 4 + 3] * orig_height as f32) as i32;

            let bbox = BoundingBox {
                x: x1.max(0),
                y: y1.max(0),
                width: (x2 - x1).max(1),
                height: (y2 - y1).max(1),
            };
            face_boxes.push((bbox, confidence));
        }

        Ok(nms(face_boxes, cfg.nms_threshold))
    }

    /// preprocess_detection resizes and normalizes the image into a flat
    /// NCHW float buffer.
    fn preprocess_detection(&self, img: &DynamicImage) -> Vec<f32> {
        let cfg = &self.detection_config;
        let rgb = img
            .resize_exact(
                cfg.input_width,
                cfg.input_height,
                image::imageops::FilterType::Triangle,
            )
            .to_rgb8();

        let mut im_tensor = Array3::<f32>::zeros((
            cfg.input_height as usize,
            cfg.input_width as usize,
            3usize,
        ));

        // Convert the image to float and normalize it
        for y in 0..cfg.input_height as usize {
            for x in 0..cfg.input_width as usize {
                let pixel = rgb.get_pixel(x as u32, y as u32);
                for c in 0..3 {
                    im_tensor[[y, x, c]] = (pixel[c] as f32 - cfg.mean) * cfg.scale;
                }
            }
        }

        let transposed = im_tensor.permuted_axes([2, 0, 1]);
        transposed.iter().copied().collect()
    }

    /// embed runs the embedder on a face crop and returns the raw vector.
    fn embed(&self, face_img: &DynamicImage) -> Result<Vec<f32>> {
        let cfg = &self.embedding_config;
        let (width, height) = cfg.imsize;
        let rgb = face_img
            .resize_exact(width, height, image::imageops::FilterType::Triangle)
            .to_rgb8();

        let mut im_tensor = Array3::<f32>::zeros((height as usize, width as usize, 3usize));
        for y in 0..height as usize {
            for x in 0..width as usize {
                let pixel = rgb.get_pixel(x as u32, y as u32);
                for c in 0..3 {
                    im_tensor[[y, x, c]] = (pixel[c] as f32 - cfg.mean) * cfg.scale;
                }
            }
        }
        let transposed = im_tensor.permuted_axes([2, 0, 1]);
        let input_data: Vec<f32> = transposed.iter().copied().collect();

        let input_tensor = Tensor::from_array((
            [1usize, 3, height as usize, width as usize],
            input_data.into_boxed_slice(),
        ))?;

        let mut session = self
            .embedding_session
            .lock()
            .map_err(|_| Error::Model("embedding session lock poisoned".to_string()))?;
        let outputs = session.run(ort::inputs![cfg.input_name.as_str() => input_tensor])?;

        let embedding_output = outputs
            .iter()
            .next()
            .ok_or_else(|| Error::Model("embedder returned no output".to_string()))?;
        let (_embedding_shape, embedding_data) = embedding_output.1.try_extract_tensor::<f32>()?;

        Ok(embedding_data.to_vec())
    }
}

/// nms removes overlapping detections, keeping the highest-confidence box of
/// each overlapping group.
fn nms(mut boxes: Vec<(BoundingBox, f32)>, threshold: f32) -> Vec<(BoundingBox, f32)> {
    boxes.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut keep = Vec::new();
    let mut suppressed = vec![false; boxes.len()];

    for i in 0..boxes.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(boxes[i]);

        for j in (i + 1)..boxes.len() {
            if suppressed[j] {
                continue;
            }
            if compute_iou(&boxes[i].0, &boxes[j].0) > threshold {
                suppressed[j] = true;
            }
        }
    }
    keep
}

/// compute_iou returns the intersection-over-union of two boxes.
fn compute_iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = (a.x + a.width).min(b.x + b.width);
    let y2 = (a.y + a.height).min(b.y + b.height);

    let intersection = ((x2 - x1).max(0) as i64 * (y2 - y1).max(0) as i64) as f32;
    let union = (a.area() + b.area()) as f32 - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iou_identical_and_disjoint() {
        let a = BoundingBox {
            x: 0,
            y: 0,
            width: 10,
            height: 10,
        };
        assert!((compute_iou(&a, &a) - 1.0).abs() < 1e-3);

        let b = BoundingBox {
            x: 20,
            y: 20,
            width: 10,
            height: 10,
        };
        assert_eq!(compute_iou(&a, &b), 0.0);
    }

    #[test]
    fn test_nms_suppresses_overlap() {
        let a = BoundingBox {
            x: 0,
            y: 0,
            width: 10,
            height: 10,
        };
        let almost_a = BoundingBox {
            x: 1,
            y: 1,
            width: 10,
            height: 10,
        };
        let far = BoundingBox {
            x: 50,
            y: 50,
            width: 10,
            height: 10,
        };

        let kept = nms(vec![(a, 0.8), (almost_a, 0.9), (far, 0.7)], 0.3);
        assert_eq!(kept.len(), 2);
        // The higher-confidence overlapping box survives.
        assert_eq!(kept[0].0, almost_a);
        assert_eq!(kept[1].0, far);
    }
}
