//! 조회용 SQL 모음

/// 판매 중인 상품 목록
pub const GET_AVAILABLE_ITEMS: &str =
    "SELECT * FROM items WHERE status = 'available' ORDER BY created_at DESC";

/// 상품 단건 조회
pub const GET_ITEM: &str = "SELECT * FROM items WHERE id = $1";

/// 사용자 잔액 조회
pub const GET_USER_BALANCE: &str = "SELECT balance FROM users WHERE id = $1";

/// 사용자 보유 내역 조회
pub const GET_USER_INVENTORY: &str =
    "SELECT * FROM user_inventory WHERE user_id = $1 ORDER BY purchase_date DESC";
