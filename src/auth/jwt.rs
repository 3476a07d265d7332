use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{config::JwtConfig, state::AppState};

pub const SESSION_COOKIE: &str = "session_token";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,   // user ID
    pub iat: usize,  // issued at (unix timestamp)
    pub exp: usize,  // expires at (unix timestamp)
    pub iss: String, // issuer
    pub aud: String, // audience
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid or expired session token")]
    InvalidToken,
}

/// HS256 keys plus the claims every session token must carry.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: TimeDuration,
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::from_config(&state.config.jwt)
    }
}

impl SessionKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: TimeDuration::days(cfg.ttl_days),
        }
    }

    pub fn ttl(&self) -> TimeDuration {
        self.ttl
    }

    pub fn issue(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.issue_at(user_id, OffsetDateTime::now_utc())
    }

    fn issue_at(&self, user_id: Uuid, now: OffsetDateTime) -> anyhow::Result<String> {
        let exp = now
            .checked_add(self.ttl)
            .ok_or_else(|| anyhow::anyhow!("session expiry out of range"))?;
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "session token issued");
        Ok(token)
    }

    /// Bad signature, bad structure, wrong issuer/audience and expiry all collapse
    /// into `InvalidToken`.
    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "session token rejected");
            TokenError::InvalidToken
        })?;
        Ok(data.claims.sub)
    }
}

pub fn session_cookie(token: String, ttl: TimeDuration) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(ttl)
        .expires(OffsetDateTime::now_utc() + ttl)
        .build()
}

pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::ZERO)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
}

/// Caller identity resolved from the session cookie.
///
/// Rejects with a redirect to `/login`; an unusable cookie is cleared on the way out.
/// Use `Option<SessionUser>` on public pages that only want to know whether someone
/// is signed in.
pub struct SessionUser(pub Uuid);

#[axum::async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = match jar.get(SESSION_COOKIE) {
            Some(c) if !c.value().is_empty() => c.value().to_owned(),
            _ => {
                debug!("no session cookie");
                return Err(Redirect::to("/login").into_response());
            }
        };

        let keys = SessionKeys::from_ref(state);
        match keys.verify(&token) {
            Ok(user_id) => Ok(SessionUser(user_id)),
            Err(_) => {
                warn!("invalid or expired session cookie");
                Err((jar.add(removal_cookie()), Redirect::to("/login")).into_response())
            }
        }
    }
}
