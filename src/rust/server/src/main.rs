//! kirinuki 背景除去APIサーバー

use actix_web::{middleware, web, App, HttpServer};
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use kirinuki_common::{build_cors, configure_routes, cors_headers, Result, Settings, VERSION};

mod segmenter_impl;

use segmenter_impl::HttpSegmenter;

#[actix_web::main]
async fn main() -> Result<()> {
    // 設定読み込み
    let settings = Settings::new()?;
    settings.validate()?;

    // ログ初期化
    let level = settings
        .logging
        .level
        .parse::<Level>()
        .unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    const BUILD_NUMBER: &str = env!("BUILD_NUMBER");
    info!("kirinuki server starting (version {}, build #{})", VERSION, BUILD_NUMBER);

    let bind_address = format!("{}:{}", settings.server.host, settings.server.port);

    // セグメンター初期化
    info!("Segmenter endpoint: {}", settings.segmenter.endpoint);
    let segmenter = HttpSegmenter::new(&settings.segmenter)?;
    let segmenter_data = web::Data::new(segmenter);

    let max_body_size = settings.api.max_body_size;
    let workers = settings.server.workers;
    let request_timeout = Duration::from_secs(settings.server.request_timeout_secs);
    let api_config = settings.api.clone();
    let settings_data = web::Data::new(settings);

    info!("Starting HTTP server on {}", bind_address);

    // HTTPサーバー構築
    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(settings_data.clone())
            .app_data(segmenter_data.clone())
            .app_data(web::PayloadConfig::new(max_body_size))
            .wrap(middleware::Logger::default())
            // プリフライトに依らず全レスポンスへCORSヘッダーを付与する
            .wrap(cors_headers(&api_config))
            .wrap(build_cors(&api_config))
            .configure(configure_routes::<HttpSegmenter>)
    })
    .client_request_timeout(request_timeout)
    .bind(&bind_address)?;

    if let Some(workers) = workers {
        server = server.workers(workers);
    }

    info!("Server running at http://{}", bind_address);
    server.run().await?;

    info!("Server stopped");
    Ok(())
}
