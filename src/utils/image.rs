use image::{DynamicImage, GenericImageView, GrayImage};
use ndarray::{Array3, Array4, Axis};

use crate::error::Result;
use crate::utils::coordinate::BoundingBox;

/// decode_image decodes raw encoded bytes (JPEG, PNG, ...) into an image.
///
/// # Arguments
/// * `im_bytes` - encoded image bytes
///
/// # Returns
/// * `Result<DynamicImage>`
pub fn decode_image(im_bytes: &[u8]) -> Result<DynamicImage> {
    let img = image::load_from_memory(im_bytes)?;
    Ok(img)
}

/// crop_face crops the bounding box region, expanded by `padding` on each side
/// and clamped to the image bounds.
///
/// # Arguments
/// * `img` - source image
/// * `bbox` - face bounding box
/// * `padding` - fraction of the box size added on each side
///
/// # Returns
/// * `DynamicImage`
pub fn crop_face(img: &DynamicImage, bbox: &BoundingBox, padding: f32) -> DynamicImage {
    let (img_width, img_height) = img.dimensions();

    let pad_x = (bbox.width as f32 * padding) as i32;
    let pad_y = (bbox.height as f32 * padding) as i32;

    let x = (bbox.x - pad_x).max(0) as u32;
    let y = (bbox.y - pad_y).max(0) as u32;
    let w = ((bbox.width + pad_x * 2) as u32).min(img_width.saturating_sub(x));
    let h = ((bbox.height + pad_y * 2) as u32).min(img_height.saturating_sub(y));

    img.crop_imm(x, y, w.max(1), h.max(1))
}

/// gray_face_crop extracts the face region as a square grayscale image for the
/// attribute models (no padding, matching their training crops).
pub fn gray_face_crop(img: &DynamicImage, bbox: &BoundingBox, size: u32) -> GrayImage {
    crop_face(img, bbox, 0.0)
        .resize_exact(size, size, image::imageops::FilterType::Triangle)
        .to_luma8()
}

/// gray_to_tensor converts a grayscale crop into a scaled NHWC float tensor
/// of shape `[1, height, width, 1]`.
pub fn gray_to_tensor(gray: &GrayImage, scale: f32) -> Array4<f32> {
    let (width, height) = gray.dimensions();
    let mut im_tensor = Array3::<f32>::zeros((height as usize, width as usize, 1usize));

    for y in 0..height as usize {
        for x in 0..width as usize {
            let pixel_value = gray.get_pixel(x as u32, y as u32)[0];
            im_tensor[[y, x, 0]] = pixel_value as f32 * scale;
        }
    }
    im_tensor.insert_axis(Axis(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_gray_to_tensor_shape_and_scale() {
        let mut gray = GrayImage::new(4, 4);
        gray.put_pixel(0, 0, Luma([255u8]));
        gray.put_pixel(3, 2, Luma([51u8]));

        let tensor = gray_to_tensor(&gray, 1.0 / 255.0);
        assert_eq!(tensor.shape(), &[1, 4, 4, 1]);
        assert!((tensor[[0, 0, 0, 0]] - 1.0).abs() < 1e-6);
        assert!((tensor[[0, 2, 3, 0]] - 0.2).abs() < 1e-6);
        assert_eq!(tensor[[0, 1, 1, 0]], 0.0);
    }

    #[test]
    fn test_crop_face_clamps_to_image() {
        let img = DynamicImage::new_rgb8(100, 80);
        let bbox = BoundingBox {
            x: 90,
            y: 70,
            width: 30,
            height: 30,
        };
        let crop = crop_face(&img, &bbox, 0.2);
        let (w, h) = crop.dimensions();
        assert!(w >= 1 && h >= 1);
        assert!(w <= 100 && h <= 80);
    }

    #[test]
    fn test_gray_face_crop_size() {
        let img = DynamicImage::new_rgb8(200, 200);
        let bbox = BoundingBox {
            x: 40,
            y: 40,
            width: 60,
            height: 90,
        };
        let gray = gray_face_crop(&img, &bbox, 112);
        assert_eq!(gray.dimensions(), (112, 112));
    }

    #[test]
    fn test_decode_image_rejects_garbage() {
        assert!(decode_image(&[0u8, 1, 2, 3]).is_err());
    }
}
