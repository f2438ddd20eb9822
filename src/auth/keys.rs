use jsonwebtoken::{decode, DecodingKey, Validation};
use tracing::debug;

use super::claims::Claims;
use crate::config::JwtConfig;

/// Verifies tokens minted by the external identity provider.
#[derive(Clone)]
pub struct JwtKeys {
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&cfg.audience));
        validation.set_issuer(std::slice::from_ref(&cfg.issuer));
        Self {
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        anyhow::ensure!(!data.claims.sub.is_empty(), "empty subject");
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
pub(crate) fn sign_for_tests(cfg: &JwtConfig, sub: &str) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use time::{Duration, OffsetDateTime};

    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        sub: sub.to_string(),
        iat: now.unix_timestamp() as usize,
        exp: (now + Duration::minutes(5)).unix_timestamp() as usize,
        iss: cfg.issuer.clone(),
        aud: cfg.audience.clone(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(cfg.secret.as_bytes()))
        .expect("sign test token")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> JwtConfig {
        JwtConfig {
            secret: "test".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
        }
    }

    #[test]
    fn verify_accepts_matching_issuer_and_audience() {
        let token = sign_for_tests(&cfg(), "openid-123");
        let claims = JwtKeys::new(&cfg()).verify(&token).unwrap();
        assert_eq!(claims.sub, "openid-123");
        assert_eq!(claims.iss, "test-issuer");
    }

    #[test]
    fn verify_rejects_other_audience() {
        let token = sign_for_tests(&cfg(), "openid-123");
        let other = JwtConfig {
            audience: "someone-else".into(),
            ..cfg()
        };
        assert!(JwtKeys::new(&other).verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_garbage() {
        assert!(JwtKeys::new(&cfg()).verify("not-a-jwt").is_err());
    }
}
