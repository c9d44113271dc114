use image::{DynamicImage, ImageFormat, ImageReader, ImageResult};
use std::io::Cursor;

use super::error::EcgError;

/// A decoded upload. Lives for a single analysis request.
pub struct EcgImage {
    image: DynamicImage,
    format: ImageFormat,
}

impl EcgImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn pixels(&self) -> &DynamicImage {
        &self.image
    }

    pub fn encode_png(&self) -> ImageResult<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        self.image.write_to(&mut buffer, ImageFormat::Png)?;
        Ok(buffer.into_inner())
    }
}

/// Decodes raw bytes, sniffing the format from the content itself.
pub fn decode(bytes: &[u8]) -> Result<EcgImage, EcgError> {
    let format = image::guess_format(bytes)?;
    let image = image::load_from_memory_with_format(bytes, format)?;
    Ok(EcgImage { image, format })
}

/// Reads only the header to get `(width, height)`.
pub fn dimensions(bytes: &[u8]) -> ImageResult<(u32, u32)> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_dimensions()
}
