use serde::{Deserialize, Serialize};

use crate::constants::MIN_FONT_FILE_SIZE;
use crate::error::{LoaderError, LoaderResult};

/// Container format of a binary font payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFormat {
    TrueType,
    OpenType,
    WOFF,
    WOFF2,
    TrueTypeCollection,
}

impl FontFormat {
    /// Detect the format from the leading signature
    pub fn detect(data: &[u8]) -> Option<Self> {
        let signature: [u8; 4] = data.get(0..4)?.try_into().ok()?;
        match &signature {
            b"OTTO" => Some(FontFormat::OpenType),
            [0x00, 0x01, 0x00, 0x00] => Some(FontFormat::TrueType),
            b"true" => Some(FontFormat::TrueType),
            b"wOFF" => Some(FontFormat::WOFF),
            b"wOF2" => Some(FontFormat::WOFF2),
            b"ttcf" => Some(FontFormat::TrueTypeCollection),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            FontFormat::TrueType => "ttf",
            FontFormat::OpenType => "otf",
            FontFormat::WOFF => "woff",
            FontFormat::WOFF2 => "woff2",
            FontFormat::TrueTypeCollection => "ttc",
        }
    }
}

impl std::fmt::Display for FontFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Reject payloads that are too large or do not carry a font signature
pub fn validate_font_data(data: &[u8], max_size: usize) -> LoaderResult<FontFormat> {
    if data.len() > max_size {
        return Err(LoaderError::PayloadTooLarge {
            size: data.len(),
            max: max_size,
        });
    }

    if data.len() < MIN_FONT_FILE_SIZE {
        return Err(LoaderError::InvalidFontData(format!(
            "payload of {} bytes is too small",
            data.len()
        )));
    }

    FontFormat::detect(data).ok_or_else(|| {
        LoaderError::InvalidFontData(format!(
            "unrecognised signature {:02x?}",
            &data[..MIN_FONT_FILE_SIZE]
        ))
    })
}
