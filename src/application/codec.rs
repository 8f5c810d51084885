use image::{codecs::jpeg::JpegEncoder, ImageFormat, RgbImage};
use std::io::Cursor;

use crate::domain::{
    errors::{DomainError, DomainResult},
    model::OutputFormat,
};

const JPEG_QUALITY: u8 = 90;

/// Decodes any format the `image` crate recognizes and flattens it to 8-bit RGB.
pub fn decode_rgb(bytes: &[u8]) -> DomainResult<RgbImage> {
    if bytes.is_empty() {
        return Err(DomainError::InvalidInput("uploaded file is empty".into()));
    }
    let img = image::load_from_memory(bytes).map_err(|e| DomainError::Decode(e.to_string()))?;
    Ok(img.to_rgb8())
}

pub fn encode(image: &RgbImage, format: OutputFormat) -> DomainResult<Vec<u8>> {
    let mut buf = Vec::new();
    let res = match format {
        OutputFormat::Jpeg => {
            JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY).encode_image(image)
        }
        OutputFormat::Png => image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png),
    };
    res.map_err(|e| DomainError::OperationFailed(format!("encoding {format}: {e}")))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn png_is_lossless() {
        let mut img = RgbImage::from_pixel(8, 6, Rgb([10, 20, 30]));
        img.put_pixel(3, 2, Rgb([255, 0, 0]));
        let bytes = encode(&img, OutputFormat::Png).unwrap();
        assert_eq!(decode_rgb(&bytes).unwrap(), img);
    }

    #[test]
    fn jpeg_keeps_dimensions() {
        let img = RgbImage::from_pixel(32, 16, Rgb([200, 200, 200]));
        let bytes = encode(&img, OutputFormat::Jpeg).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(decode_rgb(&bytes).unwrap().dimensions(), (32, 16));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = decode_rgb(b"definitely not an image").unwrap_err();
        assert!(matches!(err, DomainError::Decode(_)));
    }

    #[test]
    fn empty_upload_is_invalid_input() {
        assert!(matches!(decode_rgb(&[]), Err(DomainError::InvalidInput(_))));
    }
}
