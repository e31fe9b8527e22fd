//! 共通APIモデル定義

use crate::error::KirinukiError;
use serde::{Deserialize, Serialize};

/// /remove-background リクエスト（JSON形式）
///
/// `image`はbase64文字列またはdata-URI文字列。欠落はハンドラー側で
/// MissingImageとして扱う。
#[derive(Debug, Deserialize, Serialize)]
pub struct RemoveBackgroundRequest {
    pub image: Option<String>,
}

/// /remove-background 成功レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct RemoveBackgroundResponse {
    pub success: bool,
    /// data:image/png;base64,... 形式
    pub image: String,
    pub message: String,
}

impl RemoveBackgroundResponse {
    pub fn ok(png_data: &[u8]) -> Self {
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine as _;

        RemoveBackgroundResponse {
            success: true,
            image: format!("data:image/png;base64,{}", STANDARD.encode(png_data)),
            message: "Background removed successfully".to_string(),
        }
    }
}

/// エラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn from_error(e: &KirinukiError) -> Self {
        ErrorResponse {
            error: e.error_code().to_string(),
            message: e.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// / （ヘルスチェック）レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub version: String,
    pub port: String,
    pub segmenter: String,
    pub cors_enabled: bool,
}

impl HealthResponse {
    pub fn healthy(port: u16, segmenter_name: &str) -> Self {
        HealthResponse {
            status: "healthy".to_string(),
            message: "Background Remover API is running".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            port: port.to_string(),
            segmenter: segmenter_name.to_string(),
            cors_enabled: true,
        }
    }
}
