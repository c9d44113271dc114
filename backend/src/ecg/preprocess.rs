use image::GrayImage;

use super::decoder;

pub const BINARY_THRESHOLD: u8 = 200;

/// Inverted fixed threshold: intensities above the cutoff go to 0, the rest to 255.
pub fn binarize(gray: &GrayImage) -> GrayImage {
    let mut out = gray.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = if pixel.0[0] > BINARY_THRESHOLD { 0 } else { 255 };
    }
    out
}

/// Validity gate run before classification. Re-decodes the buffer, converts it
/// to luminance and thresholds it; the binarized image is dropped.
pub fn preprocess(bytes: &[u8]) -> bool {
    match decoder::decode(bytes) {
        Ok(image) => {
            let gray = image.pixels().to_luma8();
            let _mask = binarize(&gray);
            true
        }
        Err(e) => {
            log::error!("Preprocessing failed: {}", e.chain());
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecg::test_support::{jpeg, png};
    use image::Luma;

    #[test]
    fn threshold_polarity_is_inverted() {
        let gray = GrayImage::from_fn(4, 1, |x, _| Luma([[0u8, 200, 201, 255][x as usize]]));
        let mask = binarize(&gray);
        let values: Vec<u8> = mask.pixels().map(|p| p.0[0]).collect();
        assert_eq!(values, vec![255, 255, 0, 0]);
    }

    #[test]
    fn accepts_decodable_images() {
        assert!(preprocess(&png(16, 16)));
        assert!(preprocess(&jpeg(16, 16)));
    }

    #[test]
    fn rejects_non_images_without_panicking() {
        assert!(!preprocess(&[]));
        assert!(!preprocess(&[0u8; 10]));
        assert!(!preprocess(b"GIF89a but not really"));
    }
}
