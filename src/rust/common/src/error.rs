//! 共通エラー型定義

use thiserror::Error;

/// kirinuki共通エラー型
#[derive(Debug, Error)]
pub enum KirinukiError {
    /// 画像データが指定されていない
    #[error("No image data provided: {0}")]
    MissingImage(String),

    /// Base64デコード失敗
    #[error("Invalid base64 encoding: {0}")]
    InvalidEncoding(String),

    /// 画像としてデコードできない
    #[error("Failed to decode image: {0}")]
    InvalidImage(String),

    /// 画像ファイルサイズ超過
    #[error("Image too large: {0} bytes (max: {1} bytes)")]
    PayloadTooLarge(usize, usize),

    /// 背景除去処理の失敗
    #[error("Background removal failed: {0}")]
    Segmentation(String),

    /// 許可されていないHTTPメソッド
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// 設定エラー
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO エラー
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON パースエラー
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// その他のエラー
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result型のエイリアス
pub type Result<T> = std::result::Result<T, KirinukiError>;

impl KirinukiError {
    /// HTTPステータスコードを返す
    pub fn status_code(&self) -> u16 {
        match self {
            KirinukiError::MissingImage(_)
            | KirinukiError::InvalidEncoding(_)
            | KirinukiError::InvalidImage(_) => 400,
            KirinukiError::PayloadTooLarge(_, _) => 413,
            KirinukiError::MethodNotAllowed(_) => 405,
            KirinukiError::Segmentation(_) => 500,
            KirinukiError::Config(_) => 500,
            KirinukiError::Io(_) | KirinukiError::Json(_) => 500,
            KirinukiError::Internal(_) => 500,
        }
    }

    /// エラーコードを返す（APIレスポンス用）
    pub fn error_code(&self) -> &str {
        match self {
            KirinukiError::MissingImage(_) => "MISSING_IMAGE",
            KirinukiError::InvalidEncoding(_) => "INVALID_ENCODING",
            KirinukiError::InvalidImage(_) => "INVALID_IMAGE",
            KirinukiError::PayloadTooLarge(_, _) => "IMAGE_TOO_LARGE",
            KirinukiError::MethodNotAllowed(_) => "METHOD_NOT_ALLOWED",
            KirinukiError::Segmentation(_) => "SEGMENTATION_FAILED",
            KirinukiError::Config(_) => "CONFIG_ERROR",
            KirinukiError::Io(_) => "IO_ERROR",
            KirinukiError::Json(_) => "JSON_ERROR",
            KirinukiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
