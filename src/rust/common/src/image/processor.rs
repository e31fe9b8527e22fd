//! 画像正規化パイプライン

use crate::config::ImageConfig;
use crate::error::{KirinukiError, Result};
use crate::image::NormalizedImage;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use std::time::Instant;
use tracing::debug;

pub struct ImageProcessor;

impl ImageProcessor {
    pub fn new() -> Self {
        Self
    }

    /// バイトデータをセグメンター入力用に正規化する
    ///
    /// 1. サイズ検証 → 2. フォーマット検出 → 3. デコード →
    /// 4. 縮小（長辺がmax_dimensionを超える場合のみ） →
    /// 5. RGB変換（アルファは白背景に合成） → 6. PNG再エンコード
    pub fn normalize(&self, image_data: Vec<u8>, config: &ImageConfig) -> Result<NormalizedImage> {
        let start = Instant::now();

        // 1. サイズ検証
        super::formats::validate_size(&image_data, config.max_bytes)?;

        // 2. フォーマット検出・検証
        let original_format = super::formats::detect_format(&image_data);
        if original_format == "unknown" {
            return Err(KirinukiError::InvalidImage("unknown image format".to_string()));
        }

        // 3. デコード
        let img = image::load_from_memory(&image_data)
            .map_err(|e| KirinukiError::InvalidImage(format!("image data could not be decoded: {}", e)))?;
        drop(image_data);

        // 4. 縮小（アスペクト比は厳密に保持）
        let img = self.downscale(img, config.max_dimension);

        // 5. RGB変換（アルファは白背景に合成）
        let rgb = flatten_to_rgb(img);
        let (width, height) = rgb.dimensions();

        // 6. PNGエンコード
        let png_data = encode_png(&DynamicImage::ImageRgb8(rgb))?;

        let processing_time = start.elapsed().as_millis() as u64;
        debug!(
            "Image normalized: {}x{}, format={}, {}ms",
            width, height, original_format, processing_time
        );

        Ok(NormalizedImage {
            png_data,
            width,
            height,
            original_format,
            processing_time_ms: processing_time,
        })
    }

    /// セグメンター出力をPNGとして再エンコードする
    ///
    /// 出力の妥当性検証を兼ねる。アルファチャンネルは保持する。
    pub fn reencode_output(&self, output: &[u8]) -> Result<(Vec<u8>, u32, u32)> {
        let img = image::load_from_memory(output).map_err(|e| {
            KirinukiError::Segmentation(format!("segmenter output is not a decodable image: {}", e))
        })?;

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let png_data = encode_png(&DynamicImage::ImageRgba8(rgba))?;

        Ok((png_data, width, height))
    }

    /// 長辺がmax_dimensionを超える場合のみ比例縮小する
    ///
    /// 新サイズ = round(元サイズ × max_dimension / 長辺)
    fn downscale(&self, img: DynamicImage, max_dimension: u32) -> DynamicImage {
        let (width, height) = (img.width(), img.height());
        let longer = width.max(height);

        if longer <= max_dimension {
            return img;
        }

        let ratio = max_dimension as f64 / longer as f64;
        let new_width = ((width as f64 * ratio).round() as u32).max(1);
        let new_height = ((height as f64 * ratio).round() as u32).max(1);

        debug!(
            "Downscaling {}x{} -> {}x{}",
            width, height, new_width, new_height
        );
        img.resize_exact(new_width, new_height, image::imageops::FilterType::Lanczos3)
    }
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// RGB8に変換する。アルファ付きは白背景への合成で不透明化する
fn flatten_to_rgb(img: DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut rgb = RgbImage::new(width, height);

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let a = pixel[3] as u32;
        let mut out = [0u8; 3];
        for c in 0..3 {
            // out = a*src + (1-a)*255（255スケールの丸め込み）
            out[c] = ((pixel[c] as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
        }
        rgb.put_pixel(x, y, image::Rgb(out));
    }

    rgb
}

/// PNGエンコード
fn encode_png(img: &DynamicImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut cursor = Cursor::new(&mut buf);
    img.write_to(&mut cursor, ImageFormat::Png)
        .map_err(|e| KirinukiError::Internal(format!("PNG encoding failed: {}", e)))?;

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    const PNG_MAGIC: [u8; 4] = [0x89, 0x50, 0x4E, 0x47];

    fn default_config() -> ImageConfig {
        ImageConfig::default()
    }

    // テスト用の有効なPNG画像データ作成
    fn create_png(width: u32, height: u32, pixel: Rgba<u8>) -> Vec<u8> {
        let mut img = RgbaImage::new(width, height);
        for p in img.pixels_mut() {
            *p = pixel;
        }
        let dynamic_img = DynamicImage::ImageRgba8(img);

        let mut buf = Vec::new();
        let mut cursor = Cursor::new(&mut buf);
        dynamic_img.write_to(&mut cursor, ImageFormat::Png).unwrap();

        buf
    }

    #[test]
    fn test_small_image_keeps_dimensions() {
        let processor = ImageProcessor::new();
        let png_data = create_png(64, 32, Rgba([255, 0, 0, 255]));

        let result = processor.normalize(png_data, &default_config()).unwrap();
        assert_eq!(result.width, 64);
        assert_eq!(result.height, 32);
        assert_eq!(result.original_format, "png");
        assert_eq!(&result.png_data[0..4], &PNG_MAGIC);
    }

    #[test]
    fn test_large_image_downscaled_proportionally() {
        let processor = ImageProcessor::new();
        let png_data = create_png(2000, 1000, Rgba([0, 255, 0, 255]));

        let result = processor.normalize(png_data, &default_config()).unwrap();
        // 長辺2000 -> 800、比率0.4
        assert_eq!(result.width, 800);
        assert_eq!(result.height, 400);
    }

    #[test]
    fn test_portrait_image_downscaled_on_height() {
        let processor = ImageProcessor::new();
        let png_data = create_png(500, 1600, Rgba([0, 0, 255, 255]));

        let result = processor.normalize(png_data, &default_config()).unwrap();
        // 長辺1600 -> 800、比率0.5
        assert_eq!(result.width, 250);
        assert_eq!(result.height, 800);
    }

    #[test]
    fn test_alpha_composited_onto_white() {
        let processor = ImageProcessor::new();
        // 完全透明の赤 → 白になるはず
        let png_data = create_png(4, 4, Rgba([255, 0, 0, 0]));

        let result = processor.normalize(png_data, &default_config()).unwrap();
        let decoded = image::load_from_memory(&result.png_data).unwrap().to_rgb8();
        assert_eq!(decoded.get_pixel(0, 0).0, [255, 255, 255]);
    }

    #[test]
    fn test_half_alpha_blend() {
        let processor = ImageProcessor::new();
        // アルファ128の黒 → 白と半々の混合
        let png_data = create_png(4, 4, Rgba([0, 0, 0, 128]));

        let result = processor.normalize(png_data, &default_config()).unwrap();
        let decoded = image::load_from_memory(&result.png_data).unwrap().to_rgb8();
        let p = decoded.get_pixel(0, 0).0;
        // (0*128 + 255*127 + 127) / 255 = 127
        assert_eq!(p, [127, 127, 127]);
    }

    #[test]
    fn test_grayscale_converted_to_rgb() {
        let processor = ImageProcessor::new();
        let mut buf = Vec::new();
        let gray = image::GrayImage::from_pixel(8, 8, image::Luma([200]));
        DynamicImage::ImageLuma8(gray)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();

        let result = processor.normalize(buf, &default_config()).unwrap();
        let decoded = image::load_from_memory(&result.png_data).unwrap();
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
    }

    #[test]
    fn test_invalid_bytes_rejected() {
        let processor = ImageProcessor::new();
        let invalid_data = vec![0u8; 100];

        let result = processor.normalize(invalid_data, &default_config());
        assert!(matches!(result, Err(KirinukiError::InvalidImage(_))));
    }

    #[test]
    fn test_truncated_image_rejected() {
        let processor = ImageProcessor::new();
        // 正しいPNGヘッダーだが中身が壊れている
        let mut data = PNG_MAGIC.to_vec();
        data.extend(vec![0u8; 50]);

        let result = processor.normalize(data, &default_config());
        assert!(matches!(result, Err(KirinukiError::InvalidImage(_))));
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let processor = ImageProcessor::new();
        let mut large = vec![0xFF, 0xD8, 0xFF, 0xE0]; // JPEGヘッダー
        large.extend(vec![0u8; 6 * 1024 * 1024]);

        let result = processor.normalize(large, &default_config());
        assert!(matches!(result, Err(KirinukiError::PayloadTooLarge(_, _))));
    }

    #[test]
    fn test_reencode_output_preserves_alpha() {
        let processor = ImageProcessor::new();
        let png_data = create_png(16, 16, Rgba([10, 20, 30, 128]));

        let (reencoded, width, height) = processor.reencode_output(&png_data).unwrap();
        assert_eq!((width, height), (16, 16));
        assert_eq!(&reencoded[0..4], &PNG_MAGIC);

        let decoded = image::load_from_memory(&reencoded).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0).0, [10, 20, 30, 128]);
    }

    #[test]
    fn test_reencode_output_rejects_garbage() {
        let processor = ImageProcessor::new();
        let result = processor.reencode_output(&[0u8; 64]);
        assert!(matches!(result, Err(KirinukiError::Segmentation(_))));
    }
}
