// region:    --- Imports
use crate::auth::AuthUser;
use crate::database::DatabaseManager;
use crate::market::commands::{self, RelistCommand};
use crate::market::error::MarketError;
use crate::query;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use std::sync::Arc;
use tracing::{error, info};

// endregion: --- Imports

// region:    --- Command Handlers

/// 구매 요청 처리 (구매자 식별자는 인증 컨텍스트에서만 읽는다)
pub async fn handle_purchase(
    State(db_manager): State<Arc<DatabaseManager>>,
    Extension(user): Extension<AuthUser>,
    Path(item_id): Path<String>,
) -> impl IntoResponse {
    info!(
        "{:<12} --> 구매 요청: buyer={} item={}",
        "Handler", user.id, item_id
    );

    match commands::handle_purchase(user.id, item_id, &db_manager).await {
        Ok(receipt) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "newBalance": receipt.new_balance,
                "purchasedPrice": receipt.purchased_price
            })),
        )
            .into_response(),
        Err(e) => market_error_response(e),
    }
}

/// 재등록 요청 처리
pub async fn handle_relist(
    State(db_manager): State<Arc<DatabaseManager>>,
    Extension(user): Extension<AuthUser>,
    Json(cmd): Json<RelistCommand>,
) -> impl IntoResponse {
    info!(
        "{:<12} --> 재등록 요청: user={} cmd={:?}",
        "Handler", user.id, cmd
    );

    match commands::handle_relist(user.id, cmd, &db_manager).await {
        Ok(receipt) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "message": format!(
                    "{}(이)가 {}에 다시 등록되었습니다",
                    receipt.item_name, receipt.new_price
                ),
                "itemName": receipt.item_name,
                "newPrice": receipt.new_price
            })),
        )
            .into_response(),
        Err(e) => market_error_response(e),
    }
}

/// 거래 실패를 HTTP 응답으로 변환
/// 비즈니스 실패는 4xx, 정합성 실패는 500, 저장소 실패는 재시도 가능한 503
fn market_error_response(e: MarketError) -> Response {
    let status = match &e {
        MarketError::ItemUnavailable
        | MarketError::BuyerNotFound
        | MarketError::HoldingNotFound => StatusCode::NOT_FOUND,
        MarketError::InsufficientBalance { .. } | MarketError::InvalidPrice(_) => {
            StatusCode::BAD_REQUEST
        }
        MarketError::InvalidItemState(_) | MarketError::Consistency(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        MarketError::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
    };

    // 정합성/저장소 실패는 조용히 넘기지 않고 전체 맥락과 함께 기록한다
    if status.is_server_error() {
        error!("{:<12} --> 거래 실패: {:?}", "Handler", e);
    }

    (
        status,
        Json(serde_json::json!({
            "success": false,
            "error": e.to_string(),
            "code": e.code()
        })),
    )
        .into_response()
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// 판매 중인 상품 목록 조회
pub async fn handle_get_items(
    State(db_manager): State<Arc<DatabaseManager>>,
) -> impl IntoResponse {
    match query::handlers::get_available_items(&db_manager).await {
        Ok(items) => Json(items).into_response(),
        Err(e) => query_error_response(e),
    }
}

/// 상품 조회
pub async fn handle_get_item(
    State(db_manager): State<Arc<DatabaseManager>>,
    Path(item_id): Path<String>,
) -> impl IntoResponse {
    match query::handlers::get_item(&db_manager, &item_id).await {
        Ok(Some(item)) => Json(item).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": "상품을 찾을 수 없습니다",
                "code": "ITEM_NOT_FOUND"
            })),
        )
            .into_response(),
        Err(e) => query_error_response(e),
    }
}

/// 호출자 잔액 조회
pub async fn handle_get_balance(
    State(db_manager): State<Arc<DatabaseManager>>,
    Extension(user): Extension<AuthUser>,
) -> impl IntoResponse {
    match query::handlers::get_user_balance(&db_manager, user.id).await {
        Ok(Some(balance)) => Json(serde_json::json!({ "balance": balance })).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": "사용자를 찾을 수 없습니다",
                "code": "USER_NOT_FOUND"
            })),
        )
            .into_response(),
        Err(e) => query_error_response(e),
    }
}

/// 호출자 보유 내역 조회
pub async fn handle_get_inventory(
    State(db_manager): State<Arc<DatabaseManager>>,
    Extension(user): Extension<AuthUser>,
) -> impl IntoResponse {
    match query::handlers::get_user_inventory(&db_manager, user.id).await {
        Ok(holdings) => Json(holdings).into_response(),
        Err(e) => query_error_response(e),
    }
}

fn query_error_response(e: sqlx::Error) -> Response {
    error!("{:<12} --> 조회 실패: {:?}", "Handler", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "error": "조회 중 오류가 발생했습니다",
            "code": "QUERY_ERROR"
        })),
    )
        .into_response()
}

// endregion: --- Query Handlers
