use rust_decimal::Decimal;
use skin_market_service::database::DatabaseManager;
use skin_market_service::market::commands::{self, RelistCommand};
use skin_market_service::market::error::MarketError;
use skin_market_service::market::model::{Holding, Item, User};
use skin_market_service::query;
use std::sync::Arc;
use tokio::sync::OnceCell;

static SCHEMA_INIT: OnceCell<()> = OnceCell::const_new();

/// 데이터베이스 매니저 설정 (스키마는 테스트 바이너리당 한 번만 재생성)
/// 풀은 테스트(런타임)마다 새로 만든다 — #[tokio::test] 런타임 간에
/// sqlx 풀을 공유하면 런타임 종료 시 커넥션이 깨진다
async fn setup() -> Arc<DatabaseManager> {
    let db = Arc::new(DatabaseManager::new().await);
    SCHEMA_INIT
        .get_or_init(|| async {
            db.recreate_database().await.expect("스키마 재생성 실패");
        })
        .await;
    db
}

fn dec(s: &str) -> Decimal {
    s.parse().expect("유효하지 않은 Decimal 리터럴")
}

/// 테스트용 사용자 생성
async fn create_test_user(db: &DatabaseManager, username: &str, balance: Decimal) -> User {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (username, balance) VALUES ($1, $2) RETURNING *",
    )
    .bind(username)
    .bind(balance)
    .fetch_one(db.pool())
    .await
    .expect("테스트 사용자 생성 실패")
}

/// 테스트용 상품 생성 (판매 가능 상태)
async fn create_test_item(
    db: &DatabaseManager,
    id: &str,
    name: &str,
    price: Decimal,
    seller_id: Option<i64>,
) -> Item {
    sqlx::query_as::<_, Item>(
        "INSERT INTO items (id, name, category, wear, price, status, seller_id)
         VALUES ($1, $2, 'rifle', 'Field-Tested', $3, 'available', $4)
         RETURNING *",
    )
    .bind(id)
    .bind(name)
    .bind(price)
    .bind(seller_id)
    .fetch_one(db.pool())
    .await
    .expect("테스트 상품 생성 실패")
}

async fn get_balance(db: &DatabaseManager, user_id: i64) -> Decimal {
    query::handlers::get_user_balance(db, user_id)
        .await
        .unwrap()
        .expect("사용자 없음")
}

async fn get_item(db: &DatabaseManager, item_id: &str) -> Item {
    query::handlers::get_item(db, item_id)
        .await
        .unwrap()
        .expect("상품 없음")
}

async fn get_holdings(db: &DatabaseManager, user_id: i64) -> Vec<Holding> {
    query::handlers::get_user_inventory(db, user_id).await.unwrap()
}

/// 구매 성공 시나리오
/// 가격 10.00의 상품을 잔액 15.00의 구매자가 구매하면
/// 새 잔액 5.00, 판매자 잔액 +10.00, 상품 sold, 보유 내역 1건
#[tokio::test]
async fn test_purchase_success() {
    let db = setup().await;

    let seller = create_test_user(&db, "seller_42", dec("100.00")).await;
    let buyer = create_test_user(&db, "buyer_7", dec("15.00")).await;
    let item = create_test_item(&db, "ak47-ft", "AK-47 | Redline", dec("10.00"), Some(seller.id))
        .await;

    let receipt = commands::handle_purchase(buyer.id, item.id.clone(), &db)
        .await
        .expect("구매가 성공해야 합니다");

    assert_eq!(receipt.new_balance, dec("5.00"));
    assert_eq!(receipt.purchased_price, dec("10.00"));

    // 잔액: 구매자 -10.00, 판매자 +10.00 (합계 보존)
    assert_eq!(get_balance(&db, buyer.id).await, dec("5.00"));
    assert_eq!(get_balance(&db, seller.id).await, dec("110.00"));

    // 상품 상태: sold ⇔ buyer_id 설정
    let updated = get_item(&db, &item.id).await;
    assert_eq!(updated.status, "sold");
    assert_eq!(updated.buyer_id, Some(buyer.id));

    // 보유 내역 1건 생성
    let holdings = get_holdings(&db, buyer.id).await;
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0].item_id, item.id);
    assert_eq!(holdings[0].price_at_purchase, dec("10.00"));
}

/// 이미 판매된 상품 재구매 시도 — ItemUnavailable, 아무 변경 없음
#[tokio::test]
async fn test_purchase_already_sold() {
    let db = setup().await;

    let seller = create_test_user(&db, "seller_sold", dec("0.00")).await;
    let first = create_test_user(&db, "buyer_first", dec("50.00")).await;
    let second = create_test_user(&db, "buyer_second", dec("50.00")).await;
    let item = create_test_item(&db, "awp-sold", "AWP | Asiimov", dec("20.00"), Some(seller.id))
        .await;

    commands::handle_purchase(first.id, item.id.clone(), &db)
        .await
        .expect("첫 구매는 성공해야 합니다");

    let err = commands::handle_purchase(second.id, item.id.clone(), &db)
        .await
        .expect_err("두 번째 구매는 실패해야 합니다");
    assert!(matches!(err, MarketError::ItemUnavailable));

    // 두 번째 구매자는 아무 변경도 겪지 않는다
    assert_eq!(get_balance(&db, second.id).await, dec("50.00"));
    assert!(get_holdings(&db, second.id).await.is_empty());
}

/// 잔액 부족 — 상품 상태, 양쪽 잔액, 보유 내역 모두 변경 없음
#[tokio::test]
async fn test_purchase_insufficient_balance() {
    let db = setup().await;

    let seller = create_test_user(&db, "seller_poor", dec("0.00")).await;
    let buyer = create_test_user(&db, "buyer_poor", dec("5.00")).await;
    let item = create_test_item(&db, "m4-poor", "M4A4 | Howl", dec("10.00"), Some(seller.id))
        .await;

    let err = commands::handle_purchase(buyer.id, item.id.clone(), &db)
        .await
        .expect_err("잔액 부족으로 실패해야 합니다");
    assert!(matches!(
        err,
        MarketError::InsufficientBalance { balance, price }
            if balance == dec("5.00") && price == dec("10.00")
    ));

    assert_eq!(get_balance(&db, buyer.id).await, dec("5.00"));
    assert_eq!(get_balance(&db, seller.id).await, dec("0.00"));
    assert_eq!(get_item(&db, &item.id).await.status, "available");
    assert!(get_holdings(&db, buyer.id).await.is_empty());
}

/// 존재하지 않는 구매자 — BuyerNotFound, 상품은 그대로 남는다
#[tokio::test]
async fn test_purchase_buyer_not_found() {
    let db = setup().await;

    let seller = create_test_user(&db, "seller_ghost", dec("0.00")).await;
    let item = create_test_item(&db, "usp-ghost", "USP-S | Kill Confirmed", dec("3.00"), Some(seller.id)).await;

    let err = commands::handle_purchase(987_654_321, item.id.clone(), &db)
        .await
        .expect_err("없는 구매자는 실패해야 합니다");
    assert!(matches!(err, MarketError::BuyerNotFound));

    assert_eq!(get_item(&db, &item.id).await.status, "available");
}

/// 동시성 구매 테스트 — 같은 상품에 대한 동시 구매는 정확히 한 건만 성공
#[tokio::test]
async fn test_concurrent_purchase_single_winner() {
    let db = setup().await;

    let seller = create_test_user(&db, "seller_race", dec("0.00")).await;
    let buyer_a = create_test_user(&db, "buyer_race_a", dec("30.00")).await;
    let buyer_b = create_test_user(&db, "buyer_race_b", dec("30.00")).await;
    let item = create_test_item(&db, "knife-race", "Karambit | Fade", dec("25.00"), Some(seller.id)).await;

    let mut handles = vec![];
    for buyer_id in [buyer_a.id, buyer_b.id] {
        let db = Arc::clone(&db);
        let item_id = item.id.clone();
        handles.push(tokio::spawn(async move {
            commands::handle_purchase(buyer_id, item_id, &db).await
        }));
    }

    let mut successes = 0;
    let mut unavailable = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(receipt) => {
                successes += 1;
                assert_eq!(receipt.purchased_price, dec("25.00"));
            }
            Err(MarketError::ItemUnavailable) => unavailable += 1,
            Err(e) => panic!("예상치 못한 오류: {:?}", e),
        }
    }

    assert_eq!(successes, 1, "정확히 한 건만 성공해야 합니다");
    assert_eq!(unavailable, 1, "패자는 ItemUnavailable을 받아야 합니다");

    // 잔액 합계 보존: 한 명만 25.00 차감, 판매자 25.00 입금
    let total = get_balance(&db, buyer_a.id).await
        + get_balance(&db, buyer_b.id).await
        + get_balance(&db, seller.id).await;
    assert_eq!(total, dec("60.00"));

    // 보유 내역도 정확히 1건
    let holdings = get_holdings(&db, buyer_a.id).await.len()
        + get_holdings(&db, buyer_b.id).await.len();
    assert_eq!(holdings, 1);
}

/// 재등록은 구매의 역연산
/// 구매 후 새 가격으로 재등록하면 상품은 available, 가격 갱신,
/// 판매자는 재등록자, 보유 내역은 삭제된다
#[tokio::test]
async fn test_relist_inverts_purchase() {
    let db = setup().await;

    let seller = create_test_user(&db, "seller_relist", dec("0.00")).await;
    let buyer = create_test_user(&db, "buyer_relist", dec("40.00")).await;
    let item = create_test_item(&db, "glock-relist", "Glock-18 | Fade", dec("12.00"), Some(seller.id)).await;

    commands::handle_purchase(buyer.id, item.id.clone(), &db)
        .await
        .expect("구매가 성공해야 합니다");
    let holding = get_holdings(&db, buyer.id).await.remove(0);

    let receipt = commands::handle_relist(
        buyer.id,
        RelistCommand {
            holding_id: holding.holding_id,
            item_id: item.id.clone(),
            new_price: dec("18.50"),
        },
        &db,
    )
    .await
    .expect("재등록이 성공해야 합니다");

    assert_eq!(receipt.item_name, "Glock-18 | Fade");
    assert_eq!(receipt.new_price, dec("18.50"));

    let relisted = get_item(&db, &item.id).await;
    assert_eq!(relisted.status, "available");
    assert_eq!(relisted.price, dec("18.50"));
    assert_eq!(relisted.seller_id, Some(buyer.id));
    assert_eq!(relisted.buyer_id, None);

    // 보유 내역은 삭제되었다
    assert!(get_holdings(&db, buyer.id).await.is_empty());

    // 같은 보유 내역으로 다시 재등록하면 HoldingNotFound
    let err = commands::handle_relist(
        buyer.id,
        RelistCommand {
            holding_id: holding.holding_id,
            item_id: item.id.clone(),
            new_price: dec("20.00"),
        },
        &db,
    )
    .await
    .expect_err("삭제된 보유 내역은 재등록할 수 없습니다");
    assert!(matches!(err, MarketError::HoldingNotFound));
}

/// 0 이하의 가격으로 재등록 시도 — InvalidPrice, 보유 내역은 그대로
#[tokio::test]
async fn test_relist_invalid_price() {
    let db = setup().await;

    let buyer = create_test_user(&db, "buyer_badprice", dec("10.00")).await;
    let item = create_test_item(&db, "p250-badprice", "P250 | Sand Dune", dec("1.00"), None).await;

    commands::handle_purchase(buyer.id, item.id.clone(), &db)
        .await
        .expect("구매가 성공해야 합니다");
    let holding = get_holdings(&db, buyer.id).await.remove(0);

    let err = commands::handle_relist(
        buyer.id,
        RelistCommand {
            holding_id: holding.holding_id,
            item_id: item.id.clone(),
            new_price: dec("0.00"),
        },
        &db,
    )
    .await
    .expect_err("0원 재등록은 실패해야 합니다");
    assert!(matches!(err, MarketError::InvalidPrice(_)));

    // 전체 롤백: 보유 내역과 상품 상태는 변하지 않는다
    assert_eq!(get_holdings(&db, buyer.id).await.len(), 1);
    assert_eq!(get_item(&db, &item.id).await.status, "sold");
}

/// 타인의 보유 내역으로 재등록 시도 — 세 키가 모두 일치해야 한다
#[tokio::test]
async fn test_relist_holding_not_found() {
    let db = setup().await;

    let owner = create_test_user(&db, "owner_guard", dec("10.00")).await;
    let intruder = create_test_user(&db, "intruder_guard", dec("10.00")).await;
    let item = create_test_item(&db, "deagle-guard", "Desert Eagle | Blaze", dec("6.00"), None).await;

    commands::handle_purchase(owner.id, item.id.clone(), &db)
        .await
        .expect("구매가 성공해야 합니다");
    let holding = get_holdings(&db, owner.id).await.remove(0);

    // 다른 사용자가 같은 holding_id 로 시도
    let err = commands::handle_relist(
        intruder.id,
        RelistCommand {
            holding_id: holding.holding_id,
            item_id: item.id.clone(),
            new_price: dec("9.00"),
        },
        &db,
    )
    .await
    .expect_err("타인의 보유 내역은 재등록할 수 없습니다");
    assert!(matches!(err, MarketError::HoldingNotFound));

    // 소유자의 보유 내역은 그대로
    assert_eq!(get_holdings(&db, owner.id).await.len(), 1);
}

/// 본인 리스팅 구매 — 차감만 되고 입금은 없다 (현행 동작 유지)
#[tokio::test]
async fn test_self_purchase_no_credit() {
    let db = setup().await;

    let user = create_test_user(&db, "self_buyer", dec("20.00")).await;
    let item = create_test_item(&db, "mp9-self", "MP9 | Hot Rod", dec("4.00"), Some(user.id)).await;

    let receipt = commands::handle_purchase(user.id, item.id.clone(), &db)
        .await
        .expect("본인 구매도 성공합니다");

    // 입금 없이 차감만: 20.00 - 4.00
    assert_eq!(receipt.new_balance, dec("16.00"));
    assert_eq!(get_balance(&db, user.id).await, dec("16.00"));
    assert_eq!(get_item(&db, &item.id).await.status, "sold");
}

/// 판매자 없는 리스팅 구매 — 입금 대상 없이 구매는 성공한다
#[tokio::test]
async fn test_purchase_ownerless_listing() {
    let db = setup().await;

    let buyer = create_test_user(&db, "buyer_ownerless", dec("8.00")).await;
    let item = create_test_item(&db, "nova-ownerless", "Nova | Predator", dec("2.50"), None).await;

    let receipt = commands::handle_purchase(buyer.id, item.id.clone(), &db)
        .await
        .expect("판매자 없는 상품도 구매 가능합니다");

    assert_eq!(receipt.new_balance, dec("5.50"));

    let sold = get_item(&db, &item.id).await;
    assert_eq!(sold.status, "sold");
    assert_eq!(sold.buyer_id, Some(buyer.id));
    assert_eq!(get_holdings(&db, buyer.id).await.len(), 1);
}
