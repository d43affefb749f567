//! 인증 미들웨어
//! 토큰 발급은 별도 인증 서비스의 책임이고, 여기서는 HS256 JWT 검증만 한다
//! 검증에 성공하면 요청 확장에 AuthUser(호출자 id)를 넣어준다
// region:    --- Imports
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

// endregion: --- Imports

// region:    --- Auth State

/// JWT 클레임 (sub = 사용자 id)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub exp: i64,
}

/// 검증 키 상태 (프로세스 시작 시 한 번 생성)
#[derive(Clone)]
pub struct AuthState {
    decoding_key: Arc<DecodingKey>,
}

impl AuthState {
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").expect("JWT_SECRET must be set");
        Self::from_secret(secret.as_bytes())
    }

    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            decoding_key: Arc::new(DecodingKey::from_secret(secret)),
        }
    }
}

/// 검증이 끝난 호출자 식별자 (요청 본문이 아니라 여기서만 신원을 읽는다)
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: i64,
}

// endregion: --- Auth State

// region:    --- Middleware

/// 인증 미들웨어: Bearer 토큰 검증 후 AuthUser 주입
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = extract_bearer(req.headers())?;

    let claims = decode_token(token, &state.decoding_key).map_err(|e| {
        warn!("{:<12} --> 토큰 검증 실패: {}", "Auth", e);
        StatusCode::UNAUTHORIZED
    })?;

    req.extensions_mut().insert(AuthUser { id: claims.sub });

    Ok(next.run(req).await)
}

/// 토큰 디코드 및 검증 (만료 검사는 jsonwebtoken 기본 검증에 포함)
pub fn decode_token(
    token: &str,
    key: &DecodingKey,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(token, key, &Validation::new(Algorithm::HS256))?;
    Ok(data.claims)
}

/// Authorization 헤더에서 Bearer 토큰 추출
fn extract_bearer(headers: &HeaderMap) -> Result<&str, StatusCode> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let header = header.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?
        .trim();

    if token.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(token)
}

// endregion: --- Middleware

// endregion: --- Tests
