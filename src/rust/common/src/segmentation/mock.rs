//! モックセグメンター（テスト用）

use crate::error::{KirinukiError, Result};
use crate::segmentation::Segmenter;
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};

/// モデルを呼ばずに背景除去を模倣するセグメンター
///
/// 入力をデコードしてRGBA PNGとして返すだけ（寸法は保持）。
/// 呼び出し回数を記録するので、「呼ばれないこと」の検証にも使える。
pub struct MockSegmenter {
    calls: AtomicUsize,
    fail: bool,
}

impl MockSegmenter {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    /// 常に失敗するモック
    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    /// これまでの呼び出し回数
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Segmenter for MockSegmenter {
    async fn remove_background(&self, image: &[u8]) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            return Err(KirinukiError::Segmentation("mock failure".to_string()));
        }

        let img = image::load_from_memory(image)
            .map_err(|e| KirinukiError::Segmentation(format!("mock decode failed: {}", e)))?;

        let rgba = img.to_rgba8();
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(rgba)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| KirinukiError::Segmentation(format!("mock encode failed: {}", e)))?;

        Ok(buf)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn sample_png() -> Vec<u8> {
        let img = RgbImage::from_pixel(8, 8, Rgb([1, 2, 3]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[tokio::test]
    async fn test_mock_returns_rgba_png_with_same_dimensions() {
        let segmenter = MockSegmenter::new();
        let output = segmenter.remove_background(&sample_png()).await.unwrap();

        let decoded = image::load_from_memory(&output).unwrap();
        assert_eq!(decoded.color(), image::ColorType::Rgba8);
        assert_eq!((decoded.width(), decoded.height()), (8, 8));
        assert_eq!(segmenter.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let segmenter = MockSegmenter::failing();
        let result = segmenter.remove_background(&sample_png()).await;
        assert!(matches!(result, Err(KirinukiError::Segmentation(_))));
        assert_eq!(segmenter.call_count(), 1);
    }
}
