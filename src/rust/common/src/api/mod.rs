//! 共通APIモジュール

pub mod cors;
pub mod handlers;
pub mod models;

// 再エクスポート
pub use cors::{build_cors, cors_headers};
pub use handlers::{
    decode_image_field, process_fallback, process_health, process_not_found,
    process_remove_json, process_remove_multipart, run_pipeline, PipelineOutput,
};
pub use models::{ErrorResponse, HealthResponse, RemoveBackgroundRequest, RemoveBackgroundResponse};

use crate::segmentation::Segmenter;
use actix_web::guard::{self, GuardContext};
use actix_web::http::header;
use actix_web::web;

/// multipart/form-dataボディの判定
fn is_multipart(ctx: &GuardContext<'_>) -> bool {
    ctx.head()
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("multipart/form-data"))
        .unwrap_or(false)
}

/// ルート登録
///
/// サーバー本体とテストの両方から同じルート表を使う。
/// `/remove-background`はコンテンツタイプでJSON/multipartに振り分け、
/// その他メソッドはOPTIONS=200／それ以外405のフォールバックへ落とす。
pub fn configure_routes<S: Segmenter>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/")
            .route(web::get().to(process_health::<S>))
            .route(web::route().to(process_fallback)),
    )
    .service(
        web::resource("/remove-background")
            .route(
                web::post()
                    .guard(guard::fn_guard(is_multipart))
                    .to(process_remove_multipart::<S>),
            )
            .route(web::post().to(process_remove_json::<S>))
            .route(web::route().to(process_fallback)),
    )
    .default_service(web::route().to(process_not_found));
}
