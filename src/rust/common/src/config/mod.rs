//! 共通設定管理モジュール

use crate::error::{KirinukiError, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// サーバー設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// バインドするホストアドレス
    pub host: String,

    /// ポート番号
    pub port: u16,

    /// ワーカースレッド数
    pub workers: Option<usize>,

    /// リクエストタイムアウト（秒）
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 10000,
            workers: None,
            request_timeout_secs: 120,
        }
    }
}

/// 画像処理設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImageConfig {
    /// デコード後の最大バイト数
    pub max_bytes: usize,

    /// 長辺の最大ピクセル数（超過時は縮小）
    pub max_dimension: u32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        ImageConfig {
            max_bytes: 5 * 1024 * 1024, // 5MiB
            max_dimension: 800,
        }
    }
}

/// セグメンター（背景除去サイドカー）設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SegmenterConfig {
    /// 背景除去エンドポイントURL
    pub endpoint: String,

    /// リクエストタイムアウト（秒）
    pub timeout_secs: u64,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        SegmenterConfig {
            // rembgサーバーのデフォルト
            endpoint: "http://127.0.0.1:7000/api/remove".to_string(),
            timeout_secs: 60,
        }
    }
}

/// ロギング設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// ログレベル
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
        }
    }
}

/// API設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// CORS許可オリジン
    pub cors_origins: Vec<String>,

    /// 最大リクエストボディサイズ（バイト）
    pub max_body_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            cors_origins: vec!["*".to_string()],
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// アプリケーション設定
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    /// サーバー設定
    pub server: ServerConfig,

    /// 画像処理設定
    pub image: ImageConfig,

    /// セグメンター設定
    pub segmenter: SegmenterConfig,

    /// ロギング設定
    pub logging: LoggingConfig,

    /// API設定
    pub api: ApiConfig,
}

impl Settings {
    /// 設定を読み込む
    ///
    /// 読み込み優先順位：
    /// 1. 環境変数
    /// 2. 設定ファイル（指定された場合）
    /// 3. デフォルト値
    pub fn new() -> Result<Self> {
        let mut settings = Self::default();

        // 設定ファイルパスを環境変数から取得
        if let Ok(config_path) = env::var("CONFIG_FILE") {
            settings = Self::from_file(&config_path)?;
        }

        // 環境変数で上書き
        settings.override_from_env();

        Ok(settings)
    }

    /// 設定ファイルから読み込む
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| KirinukiError::Config(format!("Failed to read config file: {}", e)))?;

        // JSON形式
        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .map_err(|e| KirinukiError::Config(format!("Failed to parse JSON config: {}", e)))
        }
        // TOML形式
        else if path.ends_with(".toml") {
            toml::from_str(&content)
                .map_err(|e| KirinukiError::Config(format!("Failed to parse TOML config: {}", e)))
        }
        // YAML形式
        else if path.ends_with(".yaml") || path.ends_with(".yml") {
            serde_yaml::from_str(&content)
                .map_err(|e| KirinukiError::Config(format!("Failed to parse YAML config: {}", e)))
        } else {
            Err(KirinukiError::Config(
                "Unsupported config file format".to_string(),
            ))
        }
    }

    /// 環境変数で設定を上書き
    fn override_from_env(&mut self) {
        // サーバー設定
        if let Ok(host) = env::var("HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(workers) = env::var("WORKERS") {
            if let Ok(workers) = workers.parse() {
                self.server.workers = Some(workers);
            }
        }

        // 画像処理設定
        if let Ok(max_bytes) = env::var("MAX_IMAGE_BYTES") {
            if let Ok(max_bytes) = max_bytes.parse() {
                self.image.max_bytes = max_bytes;
            }
        }
        if let Ok(max_dimension) = env::var("MAX_DIMENSION") {
            if let Ok(max_dimension) = max_dimension.parse() {
                self.image.max_dimension = max_dimension;
            }
        }

        // セグメンター設定
        if let Ok(endpoint) = env::var("SEGMENTER_URL") {
            self.segmenter.endpoint = endpoint;
        }
        if let Ok(timeout) = env::var("SEGMENTER_TIMEOUT") {
            if let Ok(timeout) = timeout.parse() {
                self.segmenter.timeout_secs = timeout;
            }
        }

        // ロギング設定
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.logging.level = log_level;
        }

        // API設定
        if let Ok(cors_origins) = env::var("CORS_ORIGINS") {
            self.api.cors_origins = cors_origins
                .split(',')
                .map(|s| s.trim().to_string())
                .collect();
        }
    }

    /// 設定を検証
    pub fn validate(&self) -> Result<()> {
        // ポート番号の検証
        if self.server.port == 0 {
            return Err(KirinukiError::Config("Invalid port number: 0".to_string()));
        }

        // 画像処理設定の検証
        if self.image.max_bytes == 0 {
            return Err(KirinukiError::Config(
                "max_bytes must be greater than 0".to_string(),
            ));
        }
        if self.image.max_dimension == 0 {
            return Err(KirinukiError::Config(
                "max_dimension must be greater than 0".to_string(),
            ));
        }

        // セグメンターURLの検証
        if self.segmenter.endpoint.is_empty() {
            return Err(KirinukiError::Config(
                "Segmenter endpoint cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 10000);
        assert_eq!(settings.image.max_bytes, 5 * 1024 * 1024);
        assert_eq!(settings.image.max_dimension, 800);
        assert_eq!(settings.api.cors_origins, vec!["*".to_string()]);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut settings = Settings::default();
        settings.server.port = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let mut settings = Settings::default();
        settings.image.max_bytes = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.image.max_dimension = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_endpoint() {
        let mut settings = Settings::default();
        settings.segmenter.endpoint = String::new();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_parse_toml_config() {
        let toml_str = r#"
            [server]
            host = "127.0.0.1"
            port = 8080
            request_timeout_secs = 30

            [image]
            max_bytes = 2097152
            max_dimension = 600

            [segmenter]
            endpoint = "http://localhost:7000/api/remove"
            timeout_secs = 30

            [logging]
            level = "debug"

            [api]
            cors_origins = ["*"]
            max_body_size = 4194304
        "#;
        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.image.max_dimension, 600);
        assert_eq!(settings.image.max_bytes, 2 * 1024 * 1024);
    }
}
