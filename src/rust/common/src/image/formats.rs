//! 画像フォーマット検出

use crate::error::{KirinukiError, Result};

/// 画像フォーマットをマジックバイトから検出
pub fn detect_format(data: &[u8]) -> String {
    if data.len() < 4 {
        return "unknown".to_string();
    }

    match &data[0..4] {
        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, _] => "jpeg".to_string(),

        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47] => "png".to_string(),

        // GIF: 47 49 46 38
        [0x47, 0x49, 0x46, 0x38] => "gif".to_string(),

        // BMP: 42 4D
        [0x42, 0x4D, _, _] => "bmp".to_string(),

        _ => "unknown".to_string(),
    }
}

/// MIMEタイプ検証（セキュリティ対策）
pub fn validate_image_mime(data: &[u8]) -> bool {
    matches!(detect_format(data).as_str(), "jpeg" | "png" | "gif" | "bmp")
}

/// ファイルサイズ制限チェック
pub fn validate_size(data: &[u8], max_bytes: usize) -> Result<()> {
    if data.len() > max_bytes {
        return Err(KirinukiError::PayloadTooLarge(data.len(), max_bytes));
    }

    Ok(())
}
