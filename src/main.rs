// region:    --- Imports
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use skin_market_service::{auth, database::DatabaseManager, handlers};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // DatabaseManager 생성 (프로세스당 하나, 모든 핸들러에 주입)
    let db_manager = Arc::new(DatabaseManager::new().await);

    // 스키마 초기화 (멱등)
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // 인증 상태 생성 (JWT_SECRET)
    let auth_state = auth::AuthState::from_env();

    // 프론트엔드를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 인증이 필요한 라우트 (호출자 신원은 미들웨어가 주입)
    let protected = Router::new()
        .route("/purchases/:item_id", post(handlers::handle_purchase))
        .route("/listings/relist", post(handlers::handle_relist))
        .route("/inventory", get(handlers::handle_get_inventory))
        .route("/balance", get(handlers::handle_get_balance))
        .route_layer(middleware::from_fn_with_state(
            auth_state,
            auth::auth_middleware,
        ));

    // 라우터 설정
    let routes_all = Router::new()
        .merge(protected)
        .route("/items", get(handlers::handle_get_items))
        .route("/items/:id", get(handlers::handle_get_item))
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .with_state(Arc::clone(&db_manager));

    // 리스너 생성(3000번 포트)
    let listener = TcpListener::bind("0.0.0.0:3000").await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행 (ctrl-c 수신 시 graceful shutdown)
    if let Err(err) = axum::serve(listener, routes_all.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("{:<12} --> Server error: {}", "Main", err);
    }

    // 진행 중인 트랜잭션이 정리된 후 풀 종료
    db_manager.close().await;
    Ok(())
}

/// 종료 시그널 대기
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("{:<12} --> 종료 시그널 수신 실패: {}", "Main", e);
    }
    info!("{:<12} --> 종료 시그널 수신, 서버를 내립니다", "Main");
}
// endregion: --- Main
