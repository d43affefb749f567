//! 원장 저장소(Ledger Store)의 행 단위 연산
//! 모든 연산은 열려 있는 트랜잭션 안에서 실행되며, 변경 대상 행은 먼저
//! SELECT ... FOR UPDATE 로 잠근 후 변경한다 (비관적 잠금)
// region:    --- Imports
use crate::market::model::{Holding, Item, User};
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};

// endregion: --- Imports

// region:    --- Item

/// 판매 가능 상태의 상품 행 잠금 조회
/// 동일 상품에 대한 동시 구매를 이 잠금이 직렬화한다
pub async fn lock_available_item(
    tx: &mut Transaction<'_, Postgres>,
    item_id: &str,
) -> Result<Option<Item>, sqlx::Error> {
    sqlx::query_as::<_, Item>(
        "SELECT * FROM items WHERE id = $1 AND status = 'available' FOR UPDATE",
    )
    .bind(item_id)
    .fetch_optional(&mut **tx)
    .await
}

/// 상품 판매 완료 처리 (status = sold, buyer_id 기록)
pub async fn mark_item_sold(
    tx: &mut Transaction<'_, Postgres>,
    item_id: &str,
    buyer_id: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE items SET status = 'sold', buyer_id = $1 WHERE id = $2")
        .bind(buyer_id)
        .bind(item_id)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}

/// 상품 재등록 (status = available, 새 가격, 판매자 갱신, 구매자 해제)
/// 성공 시 확인 메시지용으로 상품 이름을 반환
pub async fn relist_item(
    tx: &mut Transaction<'_, Postgres>,
    item_id: &str,
    seller_id: i64,
    new_price: Decimal,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "UPDATE items
         SET status = 'available', price = $1, seller_id = $2, buyer_id = NULL
         WHERE id = $3
         RETURNING name",
    )
    .bind(new_price)
    .bind(seller_id)
    .bind(item_id)
    .fetch_optional(&mut **tx)
    .await
}

// endregion: --- Item

// region:    --- User

/// 사용자 행 잠금 조회
/// 동일 사용자의 동시 잔액 변경(확인 후 차감 경합)을 이 잠금이 직렬화한다
pub async fn lock_user(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await
}

/// 잔액 차감 후 새 잔액 반환
pub async fn debit_balance(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
    amount: Decimal,
) -> Result<Option<Decimal>, sqlx::Error> {
    sqlx::query_scalar::<_, Decimal>(
        "UPDATE users SET balance = balance - $1 WHERE id = $2 RETURNING balance",
    )
    .bind(amount)
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await
}

/// 잔액 입금, 변경된 행 수 반환
pub async fn credit_balance(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
    amount: Decimal,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET balance = balance + $1 WHERE id = $2")
        .bind(amount)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}

// endregion: --- User

// region:    --- Holding

/// 보유 내역 생성, 생성된 holding_id 반환
/// (user_id, item_id) 유니크 제약 위반은 호출 측에서 정합성 오류로 처리한다
pub async fn insert_holding(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
    item_id: &str,
    price: Decimal,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO user_inventory (user_id, item_id, price_at_purchase, purchase_date)
         VALUES ($1, $2, $3, now())
         RETURNING holding_id",
    )
    .bind(user_id)
    .bind(item_id)
    .bind(price)
    .fetch_one(&mut **tx)
    .await
}

/// 보유 내역 행 잠금 조회 — 세 키가 모두 일치해야 한다
/// (타인의 보유 내역으로 재등록하는 것을 막는다)
pub async fn lock_holding(
    tx: &mut Transaction<'_, Postgres>,
    holding_id: i64,
    user_id: i64,
    item_id: &str,
) -> Result<Option<Holding>, sqlx::Error> {
    sqlx::query_as::<_, Holding>(
        "SELECT * FROM user_inventory
         WHERE holding_id = $1 AND user_id = $2 AND item_id = $3
         FOR UPDATE",
    )
    .bind(holding_id)
    .bind(user_id)
    .bind(item_id)
    .fetch_optional(&mut **tx)
    .await
}

/// 보유 내역 삭제, 삭제된 행 수 반환
pub async fn delete_holding(
    tx: &mut Transaction<'_, Postgres>,
    holding_id: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM user_inventory WHERE holding_id = $1")
        .bind(holding_id)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}

// endregion: --- Holding
