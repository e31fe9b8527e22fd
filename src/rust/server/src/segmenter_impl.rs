//! セグメンター実装（サイドカーHTTP呼び出し）

use async_trait::async_trait;
use kirinuki_common::config::SegmenterConfig;
use kirinuki_common::{KirinukiError, Result, Segmenter};
use tracing::debug;

/// rembgサーバー互換のサイドカーへ正規化済みPNGを転送するセグメンター
///
/// モデル本体はブラックボックス。呼び出しは1回のみでリトライしない。
pub struct HttpSegmenter {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSegmenter {
    pub fn new(config: &SegmenterConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                KirinukiError::Config(format!("Failed to build segmenter client: {}", e))
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl Segmenter for HttpSegmenter {
    async fn remove_background(&self, image: &[u8]) -> Result<Vec<u8>> {
        debug!(
            "Sending {} bytes to segmenter at {}",
            image.len(),
            self.endpoint
        );

        let part = reqwest::multipart::Part::bytes(image.to_vec())
            .file_name("image.png")
            .mime_str("image/png")
            .map_err(|e| KirinukiError::Segmentation(format!("Failed to build request: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                KirinukiError::Segmentation(format!("HTTP request failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(KirinukiError::Segmentation(format!(
                "Segmenter returned HTTP {}",
                response.status()
            )));
        }

        let bytes = response.bytes().await.map_err(|e| {
            KirinukiError::Segmentation(format!("Failed to read segmenter response: {}", e))
        })?;

        Ok(bytes.to_vec())
    }

    fn name(&self) -> &str {
        "rembg-http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_construction() {
        let config = SegmenterConfig::default();
        let segmenter = HttpSegmenter::new(&config).unwrap();
        assert_eq!(segmenter.name(), "rembg-http");
        assert_eq!(segmenter.endpoint, "http://127.0.0.1:7000/api/remove");
    }
}
