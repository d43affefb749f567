use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// 상품 모델 (판매 단위, id는 외부에서 부여되는 고정 식별자)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub category: String,
    pub wear: Option<String>,
    pub float_value: Option<f64>,
    pub image_url: Option<String>,
    pub inspect_link: Option<String>,
    pub price: Decimal,
    pub status: String,
    pub seller_id: Option<i64>,
    pub buyer_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

// 사용자 모델
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub steam_id: Option<String>,
    pub username: String,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

// 보유 내역 모델 (구매와 재등록/출금 사이 구간에만 존재)
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Holding {
    pub holding_id: i64,
    pub user_id: i64,
    pub item_id: String,
    pub price_at_purchase: Decimal,
    pub purchase_date: DateTime<Utc>,
}
