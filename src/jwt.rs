//! Session token codec. The single encode/decode path shared by the
//! login handler, the request extractor and the route gate, so no two
//! call sites can disagree about secret or algorithm.

use std::sync::Arc;

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::errors::AppError;
use crate::policy::Role;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: Arc<Vec<u8>>,
    pub exp_days: i64,
}

impl JwtConfig {
    /// Reads the signing secret from the environment. There is no default:
    /// a deployment without `JWT_SECRET` must refuse to start rather than
    /// sign tokens with a guessable value.
    pub fn from_env() -> Result<Self, AppError> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| AppError::configuration("JWT_SECRET not set"))?;
        let exp_days = std::env::var("JWT_EXP_DAYS")
            .map(|val| val.parse::<i64>())
            .unwrap_or(Ok(7))
            .map_err(|_| AppError::configuration("JWT_EXP_DAYS must be a valid integer"))?;

        Ok(Self {
            secret: Arc::new(secret.into_bytes()),
            exp_days,
        })
    }

    /// Cookie lifetime matching the token expiry.
    pub fn max_age_secs(&self) -> i64 {
        self.exp_days * 24 * 60 * 60
    }

    pub fn encode(&self, user_id: Uuid, email: &str, role: Role) -> Result<String, AppError> {
        use chrono::{Duration, Utc};

        let now = Utc::now();
        let exp = now + Duration::days(self.exp_days);

        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            role,
            iat: now.timestamp() as usize,
            exp: exp.timestamp() as usize,
        };

        jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(&self.secret))
            .map_err(|err| AppError::token(err.to_string()))
    }

    /// Verifies signature and expiry. Any mismatch, malformed payload or
    /// past expiry is an error; there is no partial result.
    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&self.secret), &validation)
            .map(|data| data.claims)
            .map_err(|err| AppError::token(err.to_string()))
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str, exp_days: i64) -> JwtConfig {
        JwtConfig {
            secret: Arc::new(secret.as_bytes().to_vec()),
            exp_days,
        }
    }

    #[test]
    fn round_trip_preserves_claims() {
        let jwt = config("round-trip-secret", 7);
        let user_id = Uuid::new_v4();

        let token = jwt.encode(user_id, "ada@trackr.gov", Role::ItOfficer).unwrap();
        let claims = jwt.decode(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "ada@trackr.gov");
        assert_eq!(claims.role, Role::ItOfficer);
        assert!(claims.exp > claims.iat);
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn expired_token_is_rejected() {
        // Negative lifetime puts exp two days in the past, well beyond the
        // validator's leeway.
        let jwt = config("expiry-secret", -2);
        let token = jwt.encode(Uuid::new_v4(), "late@trackr.gov", Role::Staff).unwrap();

        assert!(jwt.decode(&token).is_err());
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let ours = config("the-real-secret", 7);
        let theirs = config("a-different-secret", 7);

        let token = theirs.encode(Uuid::new_v4(), "spoof@trackr.gov", Role::Admin).unwrap();

        assert!(ours.decode(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let jwt = config("garbage-secret", 7);

        assert!(jwt.decode("").is_err());
        assert!(jwt.decode("not-a-token").is_err());
        assert!(jwt.decode("aaaa.bbbb.cccc").is_err());
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let jwt = config("tamper-secret", 7);
        let token = jwt.encode(Uuid::new_v4(), "a@trackr.gov", Role::Staff).unwrap();

        // Swap the payload segment for a different (validly encoded) one.
        let other = jwt.encode(Uuid::new_v4(), "b@trackr.gov", Role::Admin).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let other_payload = other.split('.').nth(1).unwrap();
        parts[1] = other_payload;
        let franken = parts.join(".");

        assert!(jwt.decode(&franken).is_err());
    }
}
