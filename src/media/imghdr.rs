//! Image type detection from a file's leading bytes.

/// Recognised image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// JPEG with a JFIF or Exif marker
    Jpeg,
    /// PNG
    Png,
    /// GIF87a / GIF89a
    Gif,
}

impl ImageFormat {
    /// Conventional file extension
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
        }
    }

    /// MIME type
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
        }
    }
}

const JPEG_JFIF: &[u8] = b"\xff\xd8\xff\xe0";
const JPEG_EXIF: &[u8] = b"\xff\xd8\xff\xe1";
const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const GIF87: &[u8] = b"GIF87a";
const GIF89: &[u8] = b"GIF89a";

/// Identifies the image format from the first bytes of a file
///
/// Only the prefix is inspected; 8 bytes are enough for every format.
///
/// # Examples
///
/// ```
/// use media_relay_bot::media::{sniff_image, ImageFormat};
///
/// assert_eq!(sniff_image(b"GIF89a\x01\x00"), Some(ImageFormat::Gif));
/// assert_eq!(sniff_image(b"hello"), None);
/// ```
#[must_use]
pub fn sniff_image(prefix: &[u8]) -> Option<ImageFormat> {
    if prefix.starts_with(JPEG_JFIF) || prefix.starts_with(JPEG_EXIF) {
        Some(ImageFormat::Jpeg)
    } else if prefix.starts_with(PNG_SIGNATURE) {
        Some(ImageFormat::Png)
    } else if prefix.starts_with(GIF87) || prefix.starts_with(GIF89) {
        Some(ImageFormat::Gif)
    } else {
        None
    }
}
