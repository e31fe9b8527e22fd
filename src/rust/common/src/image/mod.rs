//! 画像正規化モジュール
//!
//! セグメンターに渡す前の前処理（縮小・色変換・PNG再エンコード）を担当する。

pub mod formats;
pub mod processor;

// 公開API
pub use processor::ImageProcessor;

/// 正規化結果
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    /// PNGエンコード済みデータ
    pub png_data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// 入力のフォーマット（マジックバイトから検出）
    pub original_format: String,
    pub processing_time_ms: u64,
}
