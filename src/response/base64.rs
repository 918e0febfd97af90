//! Base64 and data URL helpers

use base64::{engine::general_purpose::STANDARD, Engine};

/// Encode binary data to base64 string
pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Create a data URL from binary image data
pub fn create_data_url(data: &[u8], format: &str) -> String {
    wrap_data_url(&encode(data), format)
}

/// Wrap an already encoded payload in a data URL
pub fn wrap_data_url(encoded: &str, format: &str) -> String {
    format!("data:image/{};base64,{}", format, encoded)
}

/// Detect the image format of a base64 payload from its leading magic bytes
pub fn sniff_format(encoded: &str) -> Option<&'static str> {
    // 16 base64 chars decode to 12 bytes, enough for every signature below
    let prefix: String = encoded.trim().chars().take(16).collect();
    if prefix.len() % 4 != 0 {
        return None;
    }
    let head = STANDARD.decode(prefix).ok()?;
    detect_image_format(&head)
}

/// Detect image format from binary data using magic bytes
pub fn detect_image_format(data: &[u8]) -> Option<&'static str> {
    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("png");
    }

    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("jpeg");
    }

    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some("gif");
    }

    // WebP: RIFF....WEBP
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Some("webp");
    }

    None
}
