// region:    --- Imports
use super::queries;
use crate::database::DatabaseManager;
use crate::market::model::{Holding, Item};
use rust_decimal::Decimal;
use sqlx::Error as SqlxError;
use tracing::info;

// endregion: --- Imports

// region:    --- Query Handlers

/// 판매 중인 상품 목록 조회
pub async fn get_available_items(db_manager: &DatabaseManager) -> Result<Vec<Item>, SqlxError> {
    info!("{:<12} --> 판매 중인 상품 목록 조회", "Query");
    sqlx::query_as::<_, Item>(queries::GET_AVAILABLE_ITEMS)
        .fetch_all(db_manager.pool())
        .await
}

/// 상품 조회
pub async fn get_item(db_manager: &DatabaseManager, item_id: &str) -> Result<Option<Item>, SqlxError> {
    info!("{:<12} --> 상품 조회 id: {}", "Query", item_id);
    sqlx::query_as::<_, Item>(queries::GET_ITEM)
        .bind(item_id)
        .fetch_optional(db_manager.pool())
        .await
}

/// 사용자 잔액 조회
pub async fn get_user_balance(
    db_manager: &DatabaseManager,
    user_id: i64,
) -> Result<Option<Decimal>, SqlxError> {
    info!("{:<12} --> 사용자 잔액 조회 id: {}", "Query", user_id);
    sqlx::query_scalar::<_, Decimal>(queries::GET_USER_BALANCE)
        .bind(user_id)
        .fetch_optional(db_manager.pool())
        .await
}

/// 사용자 보유 내역 조회
pub async fn get_user_inventory(
    db_manager: &DatabaseManager,
    user_id: i64,
) -> Result<Vec<Holding>, SqlxError> {
    info!("{:<12} --> 사용자 보유 내역 조회 id: {}", "Query", user_id);
    sqlx::query_as::<_, Holding>(queries::GET_USER_INVENTORY)
        .bind(user_id)
        .fetch_all(db_manager.pool())
        .await
}

// endregion: --- Query Handlers
