//! 거래 관련 커맨드 처리
//! 1. 구매 (판매자 -> 구매자 이전, 잔액 차감/입금, 보유 내역 생성)
//! 2. 재등록 (보유 상품을 새 가격으로 다시 판매 등록)
// region:    --- Imports
use crate::database::DatabaseManager;
use crate::market::error::MarketError;
use crate::market::store;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Commands

/// 재등록 명령 (구매자 식별자는 인증 컨텍스트에서 온다)
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelistCommand {
    pub holding_id: i64,
    pub item_id: String,
    pub new_price: Decimal,
}

/// 구매 성공 결과
#[derive(Debug, Serialize)]
pub struct PurchaseReceipt {
    pub new_balance: Decimal,
    pub purchased_price: Decimal,
}

/// 재등록 성공 결과
#[derive(Debug, Serialize)]
pub struct RelistReceipt {
    pub item_name: String,
    pub new_price: Decimal,
}

// endregion: --- Commands

// region:    --- Purchase

/// 1. 구매
/// 단일 트랜잭션 안에서 아래 순서로 실행된다:
/// 상품 잠금 -> 가격 검증 -> 구매자 잠금 -> 잔액 확인 -> 차감 -> 판매자 입금
/// -> 상품 판매 완료 -> 보유 내역 생성 -> 커밋
/// 어느 단계에서든 실패하면 전체 롤백된다 (부분 상태는 절대 남지 않음)
pub async fn handle_purchase(
    buyer_id: i64,
    item_id: String,
    db_manager: &DatabaseManager,
) -> Result<PurchaseReceipt, MarketError> {
    info!(
        "{:<12} --> 구매 처리 시작: buyer={} item={}",
        "Command", buyer_id, item_id
    );

    db_manager
        .transaction(move |tx| {
            Box::pin(async move {
                // 1. 판매 가능 상품 행 잠금 — 동시 구매는 여기서 직렬화된다
                let item = store::lock_available_item(tx, &item_id)
                    .await?
                    .ok_or(MarketError::ItemUnavailable)?;

                // 2. 가격 검증 (정상 데이터에서는 실패하지 않음)
                let price = item.price;
                if price <= Decimal::ZERO {
                    return Err(MarketError::InvalidItemState(format!(
                        "상품 {}의 가격이 0 이하입니다: {}",
                        item_id, price
                    )));
                }

                // 3. 구매자 행 잠금 — 동일 구매자의 동시 지출을 직렬화한다
                let buyer = store::lock_user(tx, buyer_id)
                    .await?
                    .ok_or(MarketError::BuyerNotFound)?;

                // 4. 잔액 확인 (부족 시 아무 변경 없이 종료)
                if buyer.balance < price {
                    return Err(MarketError::InsufficientBalance {
                        balance: buyer.balance,
                        price,
                    });
                }

                // 5. 구매자 잔액 차감
                let new_balance = store::debit_balance(tx, buyer_id, price)
                    .await?
                    .ok_or_else(|| {
                        MarketError::Consistency(format!(
                            "잔액 차감 대상 사용자 {} 행이 사라졌습니다",
                            buyer_id
                        ))
                    })?;

                // 6. 판매자 입금 (수수료 없음, 가격 전액)
                //    판매자가 없거나 구매자 본인인 리스팅은 입금 없이 차감만 된다
                //    (현행 동작 유지 — DESIGN.md의 열린 질문 참고)
                match item.seller_id {
                    Some(seller_id) if seller_id != buyer_id => {
                        let credited = store::credit_balance(tx, seller_id, price).await?;
                        if credited == 0 {
                            return Err(MarketError::Consistency(format!(
                                "입금 대상 판매자 {} 행을 찾을 수 없습니다",
                                seller_id
                            )));
                        }
                    }
                    _ => {
                        warn!(
                            "{:<12} --> 입금 대상 없는 구매: item={} seller={:?} buyer={}",
                            "Command", item_id, item.seller_id, buyer_id
                        );
                    }
                }

                // 7. 상품 판매 완료 처리
                let updated = store::mark_item_sold(tx, &item_id, buyer_id).await?;
                if updated == 0 {
                    return Err(MarketError::Consistency(format!(
                        "판매 완료 처리 대상 상품 {}이(가) 사라졌습니다",
                        item_id
                    )));
                }

                // 8. 보유 내역 생성 — 유니크 위반은 1단계 검사 이후 도달 불가, 발생 시 전체 중단
                match store::insert_holding(tx, buyer_id, &item_id, price).await {
                    Ok(_) => {}
                    Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                        return Err(MarketError::Consistency(format!(
                            "구매자 {}이(가) 상품 {}을(를) 이미 보유 중입니다",
                            buyer_id, item_id
                        )));
                    }
                    Err(e) => return Err(e.into()),
                }

                info!(
                    "{:<12} --> 구매 완료: buyer={} item={} price={} new_balance={}",
                    "Command", buyer_id, item_id, price, new_balance
                );

                Ok(PurchaseReceipt {
                    new_balance,
                    purchased_price: price,
                })
            })
        })
        .await
}

// endregion: --- Purchase

// region:    --- Relist

/// 2. 재등록 (구매의 역방향 흐름)
/// 보유 내역 잠금 -> 가격 검증 -> 상품 재등록 -> 보유 내역 삭제 -> 커밋
/// 잠금 순서는 보유 내역 -> 상품으로 고정한다 (사용자 행은 잠그지 않으므로
/// 구매의 상품 -> 사용자 순서와 교차 데드락이 생기지 않는다)
pub async fn handle_relist(
    user_id: i64,
    cmd: RelistCommand,
    db_manager: &DatabaseManager,
) -> Result<RelistReceipt, MarketError> {
    info!(
        "{:<12} --> 재등록 처리 시작: user={} cmd={:?}",
        "Command", user_id, cmd
    );

    db_manager
        .transaction(move |tx| {
            Box::pin(async move {
                // 1. 세 키 일치 보유 내역 잠금 — 보유하지 않은 상품의 재등록을 막는다
                let holding = store::lock_holding(tx, cmd.holding_id, user_id, &cmd.item_id)
                    .await?
                    .ok_or(MarketError::HoldingNotFound)?;

                // 2. 새 가격 검증
                if cmd.new_price <= Decimal::ZERO {
                    return Err(MarketError::InvalidPrice(cmd.new_price));
                }

                // 3. 상품 재등록 (0행 변경이면 상품이 사라진 것 — 정합성 오류)
                let item_name = store::relist_item(tx, &cmd.item_id, user_id, cmd.new_price)
                    .await?
                    .ok_or_else(|| {
                        MarketError::Consistency(format!(
                            "재등록 대상 상품 {}이(가) 존재하지 않습니다",
                            cmd.item_id
                        ))
                    })?;

                // 4. 보유 내역 삭제 (잠금 하에서 0행이면 정합성 오류)
                let deleted = store::delete_holding(tx, holding.holding_id).await?;
                if deleted == 0 {
                    return Err(MarketError::Consistency(format!(
                        "삭제 대상 보유 내역 {}이(가) 사라졌습니다",
                        holding.holding_id
                    )));
                }

                info!(
                    "{:<12} --> 재등록 완료: user={} item={} price={}",
                    "Command", user_id, cmd.item_id, cmd.new_price
                );

                Ok(RelistReceipt {
                    item_name,
                    new_price: cmd.new_price,
                })
            })
        })
        .await
}

// endregion: --- Relist
