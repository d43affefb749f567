//! 거래 실패 분류
//! 비즈니스 실패(재시도 불가) / 정합성 실패(잠금 하에서는 도달 불가, 발생 시 서버 오류)
//! / 인프라 실패(재시도 가능)를 구분한다
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketError {
    /// 판매 가능 상태의 상품이 없음 (이미 판매되었거나 존재하지 않음)
    #[error("판매 가능한 상품을 찾을 수 없습니다")]
    ItemUnavailable,

    /// 구매자 계정 없음
    #[error("구매자 계정을 찾을 수 없습니다")]
    BuyerNotFound,

    /// (holding_id, user_id, item_id) 세 키가 모두 일치하는 보유 내역 없음
    #[error("보유 내역을 찾을 수 없습니다")]
    HoldingNotFound,

    /// 잔액 부족 (아무 변경도 일어나지 않음)
    #[error("잔액이 부족합니다 (잔액: {balance}, 가격: {price})")]
    InsufficientBalance { balance: Decimal, price: Decimal },

    /// 0 이하의 재등록 가격
    #[error("유효하지 않은 가격입니다: {0}")]
    InvalidPrice(Decimal),

    /// 상품 가격이 0 이하 (정상 데이터에서는 도달하지 않음)
    #[error("상품 가격 상태가 유효하지 않습니다: {0}")]
    InvalidItemState(String),

    /// 잠금 후 변경 사이에 행이 사라짐 — 잠금 규율상 도달 불가, 발생 시 전체 롤백
    #[error("데이터 정합성 오류: {0}")]
    Consistency(String),

    /// 저장소 접근 실패 (재시도 가능한 실패로 노출)
    #[error("데이터베이스 오류: {0}")]
    Database(#[from] sqlx::Error),
}

impl MarketError {
    /// 클라이언트에 노출하는 고정 오류 코드
    pub fn code(&self) -> &'static str {
        match self {
            MarketError::ItemUnavailable => "ITEM_UNAVAILABLE",
            MarketError::BuyerNotFound => "BUYER_NOT_FOUND",
            MarketError::HoldingNotFound => "HOLDING_NOT_FOUND",
            MarketError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            MarketError::InvalidPrice(_) => "INVALID_PRICE",
            MarketError::InvalidItemState(_) => "INVALID_ITEM_STATE",
            MarketError::Consistency(_) => "CONSISTENCY_ERROR",
            MarketError::Database(_) => "STORE_ERROR",
        }
    }
}
