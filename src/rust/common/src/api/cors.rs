//! CORS設定の組み立て

use actix_cors::Cors;
use actix_web::middleware::DefaultHeaders;

use crate::config::ApiConfig;

/// 設定からCORSミドルウェアを構築する
///
/// `cors_origins`に`*`が含まれる場合はワイルドカード運用とし、
/// プリフライト応答にもリテラルの`*`を返す。それ以外は許可リスト運用。
pub fn build_cors(config: &ApiConfig) -> Cors {
    let mut cors = Cors::default()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600);

    if config.cors_origins.iter().any(|origin| origin == "*") {
        cors = cors.allow_any_origin().send_wildcard();
    } else {
        for origin in &config.cors_origins {
            cors = cors.allowed_origin(origin);
        }
    }

    cors
}

/// プリフライトに依らず全レスポンスへ付与するCORSヘッダー
///
/// ワイルドカード運用時のみAllow-Originを固定で付ける。許可リスト
/// 運用ではOriginごとの判定を`build_cors`側に委ねる。
pub fn cors_headers(config: &ApiConfig) -> DefaultHeaders {
    let mut headers = DefaultHeaders::new()
        .add(("Access-Control-Allow-Methods", "GET, POST, OPTIONS"))
        .add(("Access-Control-Allow-Headers", "*"));

    if config.cors_origins.iter().any(|origin| origin == "*") {
        headers = headers.add(("Access-Control-Allow-Origin", "*"));
    }

    headers
}
