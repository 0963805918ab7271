//! HS256 access tokens.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::models::Role;

/// Claims carried by every access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id.
    pub sub: String,
    /// Role wire name (`member` or `admin`).
    pub role: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

/// Signing secret and token lifetime.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub token_ttl_hours: i64,
}

impl JwtConfig {
    /// Build from application config. Without a configured secret a random one
    /// is generated, so tokens do not survive a restart.
    pub fn from_config(config: &Config) -> Self {
        let secret = match &config.jwt_secret {
            Some(secret) => secret.clone(),
            None => {
                tracing::warn!(
                    "No TEAMTIME_JWT_SECRET configured; using a random secret. Tokens will not survive a restart."
                );
                format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
            }
        };

        Self {
            secret,
            token_ttl_hours: config.token_ttl_hours.max(1),
        }
    }
}

/// Issue a token for `user_id`. Returns the token and its expiry.
pub fn generate_access_token(
    user_id: &str,
    role: Role,
    config: &JwtConfig,
) -> Result<(String, DateTime<Utc>), jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let expires_at = now + Duration::hours(config.token_ttl_hours);

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.as_str().to_string(),
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
        jti: Uuid::new_v4().to_string(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;
    Ok((token, expires_at))
}

/// Check signature and expiry and return the claims.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.to_string(),
            token_ttl_hours: 1,
        }
    }

    #[test]
    fn test_generate_and_validate() {
        let config = test_config("test-secret-that-is-long-enough");
        let (token, expires_at) = generate_access_token("u-1", Role::Admin, &config).unwrap();

        let claims = validate_token(&token, &config).unwrap();
        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.exp, expires_at.timestamp());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = test_config("test-secret-that-is-long-enough");
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "u-1".into(),
            role: "member".into(),
            exp: now - 600,
            iat: now - 1200,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        assert!(validate_token(&token, &config).is_err());
    }

    #[test]
    fn test_other_secret_rejected() {
        let (token, _) =
            generate_access_token("u-1", Role::Member, &test_config("alpha")).unwrap();
        assert!(validate_token(&token, &test_config("bravo")).is_err());
    }
}
