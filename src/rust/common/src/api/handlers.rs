//! 共通APIハンドラー実装

use actix_web::http::{Method, StatusCode};
use actix_web::{web, HttpRequest, HttpResponse};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use futures_util::stream::StreamExt as _;
use tracing::{error, info, warn};

use crate::config::{ImageConfig, Settings};
use crate::error::{KirinukiError, Result};
use crate::image::ImageProcessor;
use crate::segmentation::Segmenter;
use actix_multipart::{Field, Multipart};

use super::models::{ErrorResponse, HealthResponse, RemoveBackgroundRequest, RemoveBackgroundResponse};

/// パイプライン出力
#[derive(Debug)]
pub struct PipelineOutput {
    /// 透過背景のPNGデータ
    pub png_data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub original_format: String,
}

/// 背景除去パイプライン本体
///
/// HTTPレイヤーから独立した1パス処理：
/// 検証 → 正規化 → セグメンテーション → PNG再エンコード。
/// どの段階の失敗も`?`でそのままエラー分岐に落ちる。
pub async fn run_pipeline<S: Segmenter>(
    raw: Vec<u8>,
    config: &ImageConfig,
    segmenter: &S,
) -> Result<PipelineOutput> {
    // サイズ上限はセグメンター呼び出しより前に必ず確定させる
    crate::image::formats::validate_size(&raw, config.max_bytes)?;

    let normalized = ImageProcessor::new().normalize(raw, config)?;
    info!(
        "Image normalized: {}x{} ({} -> png, {}ms)",
        normalized.width, normalized.height, normalized.original_format, normalized.processing_time_ms
    );

    // セグメンテーションは1リクエストにつき1回のみ。リトライしない
    let output = segmenter
        .remove_background(&normalized.png_data)
        .await
        .map_err(|e| match e {
            KirinukiError::Segmentation(_) => e,
            other => KirinukiError::Segmentation(other.to_string()),
        })?;
    drop(normalized.png_data);

    let (png_data, width, height) = ImageProcessor::new().reencode_output(&output)?;
    drop(output);

    Ok(PipelineOutput {
        png_data,
        width,
        height,
        original_format: normalized.original_format,
    })
}

/// base64/data-URI文字列をデコードする
///
/// data-URI形式は最初のカンマまでを取り除く（カンマを含む入力は
/// 一律に後半をペイロードとして扱う）。デコード前にエンコード長から
/// 概算サイズを見積もり、上限超過はデコードせずに拒否する。
pub fn decode_image_field(value: &str, max_bytes: usize) -> Result<Vec<u8>> {
    let encoded = match value.find(',') {
        Some(idx) => &value[idx + 1..],
        None => value,
    };
    let encoded = encoded.trim();

    if encoded.is_empty() {
        return Err(KirinukiError::MissingImage("image field is empty".to_string()));
    }

    // base64は3/4の情報密度
    let estimated = encoded.len() / 4 * 3;
    if estimated > max_bytes {
        return Err(KirinukiError::PayloadTooLarge(estimated, max_bytes));
    }

    STANDARD
        .decode(encoded)
        .map_err(|e| KirinukiError::InvalidEncoding(e.to_string()))
}

/// エラーをJSONエンベロープ付きHTTPレスポンスに変換
fn error_response(e: &KirinukiError) -> HttpResponse {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status).json(ErrorResponse::from_error(e))
}

/// POST /remove-background ハンドラー（JSONボディ）
pub async fn process_remove_json<S: Segmenter>(
    body: web::Bytes,
    settings: web::Data<Settings>,
    segmenter: web::Data<S>,
) -> HttpResponse {
    info!("Processing remove-background request (JSON, {} bytes)", body.len());

    // 元サービス互換: JSONとして読めないボディもimageキー欠落と同じ扱い
    let request: RemoveBackgroundRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Request body is not valid JSON: {}", e);
            return error_response(&KirinukiError::MissingImage(
                "request body must be JSON with an 'image' field".to_string(),
            ));
        }
    };
    drop(body);

    let image_field = match request.image {
        Some(value) if !value.is_empty() => value,
        _ => {
            warn!("Request is missing the 'image' field");
            return error_response(&KirinukiError::MissingImage(
                "'image' field is required".to_string(),
            ));
        }
    };

    let decoded = match decode_image_field(&image_field, settings.image.max_bytes) {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!("Failed to decode image field: {}", e);
            return error_response(&e);
        }
    };
    drop(image_field);

    match run_pipeline(decoded, &settings.image, segmenter.get_ref()).await {
        Ok(output) => {
            info!(
                "Background removed: {}x{} (input format: {})",
                output.width, output.height, output.original_format
            );
            HttpResponse::Ok().json(RemoveBackgroundResponse::ok(&output.png_data))
        }
        Err(e) => {
            error!("Pipeline failed: {}", e);
            error_response(&e)
        }
    }
}

/// POST /remove-background ハンドラー（multipart/form-data）
pub async fn process_remove_multipart<S: Segmenter>(
    mut payload: Multipart,
    settings: web::Data<Settings>,
    segmenter: web::Data<S>,
) -> HttpResponse {
    info!("Processing remove-background request (multipart)");

    let mut image_data: Option<Vec<u8>> = None;

    while let Some(field_result) = payload.next().await {
        let mut field = match field_result {
            Ok(field) => field,
            Err(e) => {
                warn!("Multipart field error: {}", e);
                // ボディは存在するが読めない：欠落ではなくエンコード不正
                return error_response(&KirinukiError::InvalidEncoding(format!(
                    "multipart error: {}",
                    e
                )));
            }
        };

        let field_name = field.name().to_string();
        match field_name.as_str() {
            // 旧バリアント互換でfileも受け付ける
            "image" | "file" => {
                match read_field_data(&mut field, settings.image.max_bytes).await {
                    Ok(data) => {
                        info!("Image field received, size: {} bytes", data.len());
                        image_data = Some(data);
                    }
                    Err(e) => {
                        warn!("Failed to read image field: {}", e);
                        return error_response(&e);
                    }
                }
            }
            other => {
                warn!("Unknown multipart field ignored: {}", other);
            }
        }
    }

    let image_data = match image_data {
        Some(data) if !data.is_empty() => data,
        _ => {
            warn!("No image field in multipart request");
            return error_response(&KirinukiError::MissingImage(
                "multipart field 'image' is required".to_string(),
            ));
        }
    };

    match run_pipeline(image_data, &settings.image, segmenter.get_ref()).await {
        Ok(output) => {
            info!(
                "Background removed: {}x{} (input format: {})",
                output.width, output.height, output.original_format
            );
            HttpResponse::Ok().json(RemoveBackgroundResponse::ok(&output.png_data))
        }
        Err(e) => {
            error!("Pipeline failed: {}", e);
            error_response(&e)
        }
    }
}

/// フィールドデータを読み取る補助関数（上限付き）
async fn read_field_data(field: &mut Field, max_bytes: usize) -> Result<Vec<u8>> {
    let mut data = Vec::new();

    while let Some(chunk_result) = field.next().await {
        let chunk = chunk_result
            .map_err(|e| KirinukiError::InvalidEncoding(format!("field read error: {}", e)))?;

        // 上限を跨いだ時点で読み取りを打ち切る
        if data.len() + chunk.len() > max_bytes {
            return Err(KirinukiError::PayloadTooLarge(
                data.len() + chunk.len(),
                max_bytes,
            ));
        }
        data.extend_from_slice(&chunk);
    }

    Ok(data)
}

/// GET / ハンドラー（ヘルスチェック）
pub async fn process_health<S: Segmenter>(
    settings: web::Data<Settings>,
    segmenter: web::Data<S>,
) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse::healthy(
        settings.server.port,
        segmenter.name(),
    ))
}

/// 登録済みルートのメソッドフォールバック
///
/// OPTIONSはプリフライトとして常に200、それ以外は405。
pub async fn process_fallback(req: HttpRequest) -> HttpResponse {
    if req.method() == Method::OPTIONS {
        return HttpResponse::Ok().json(serde_json::json!({"status": "ok"}));
    }

    let e = KirinukiError::MethodNotAllowed(req.method().to_string());
    warn!("{} {} -> 405", req.method(), req.path());
    error_response(&e)
}

/// 未登録パスのフォールバック
pub async fn process_not_found(req: HttpRequest) -> HttpResponse {
    if req.method() == Method::OPTIONS {
        return HttpResponse::Ok().json(serde_json::json!({"status": "ok"}));
    }

    warn!("{} {} -> 404", req.method(), req.path());
    HttpResponse::NotFound().json(serde_json::json!({
        "error": "NOT_FOUND",
        "message": format!("No route for {}", req.path()),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
