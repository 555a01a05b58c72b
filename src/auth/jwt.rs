use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::{auth::claims::Claims, config::JwtConfig};

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("token has no subject claim")]
    MissingSubject,
}

/// Holds the process-wide signing secret and the default access TTL.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    pub access_ttl: TimeDuration,
}

impl JwtKeys {
    pub fn new(secret: &str, access_ttl: TimeDuration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
        }
    }

    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self::new(&cfg.secret, TimeDuration::minutes(cfg.ttl_minutes))
    }

    /// Signs an access token for `subject` using the configured TTL.
    pub fn issue(&self, subject: &str) -> anyhow::Result<String> {
        self.issue_with_ttl(subject, self.access_ttl)
    }

    pub fn issue_with_ttl(&self, subject: &str, ttl: TimeDuration) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + ttl;
        let claims = Claims {
            sub: Some(subject.to_owned()),
            iat: now.unix_timestamp().max(0) as usize,
            exp: exp.unix_timestamp().max(0) as usize,
        };
        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding)?;
        debug!(subject = %subject, exp = claims.exp, "jwt signed");
        Ok(token)
    }

    /// Checks signature and expiry and returns the subject claim.
    pub fn validate(&self, token: &str) -> Result<String, TokenError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            TokenError::InvalidToken
        })?;
        match data.claims.sub {
            Some(sub) if !sub.is_empty() => Ok(sub),
            _ => Err(TokenError::MissingSubject),
        }
    }
}
