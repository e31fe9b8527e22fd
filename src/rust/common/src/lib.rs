//! kirinuki 共通ライブラリ
//!
//! 背景除去APIのドメインロジック（検証・正規化・セグメンテーション境界・
//! ハンドラー）を提供する。HTTPの配線はサーバークレート側。

pub mod api;
pub mod config;
pub mod error;
pub mod image;
pub mod segmentation;

// バージョン情報
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

// 主要な型の再エクスポート
pub use api::{build_cors, configure_routes, cors_headers};
pub use config::Settings;
pub use error::{KirinukiError, Result};
pub use image::{ImageProcessor, NormalizedImage};
pub use segmentation::Segmenter;

#[cfg(any(test, feature = "mock"))]
pub use segmentation::MockSegmenter;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(!NAME.is_empty());
    }
}
