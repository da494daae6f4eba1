use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{OtpRecord, User};
use crate::store::{OtpStore, Store, UserStore};

use super::email::EmailSender;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

/// Signs and verifies the opaque bearer credential: subject identity plus
/// expiry, HS256. No refresh, no revocation list.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_days: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::days(ttl_days),
        }
    }

    pub fn sign(&self, user_id: Uuid) -> AppResult<String> {
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (Utc::now() + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(|_| AppError::Internal)
    }

    /// Resolves a token to its subject. Expiry is enforced here; account
    /// state changes after issuance do not invalidate a token.
    pub fn verify(&self, token: &str) -> AppResult<Uuid> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| AppError::Auth("invalid or expired token".into()))?;
        Uuid::parse_str(&data.claims.sub)
            .map_err(|_| AppError::Auth("invalid token subject".into()))
    }
}

#[derive(Debug, Serialize)]
pub struct VerifiedLogin {
    pub token: String,
    pub user: User,
    pub is_new_user: bool,
}

pub struct AuthService;

impl AuthService {
    /// Issues a fresh 6-digit code for the email, superseding any prior
    /// codes, and mails it. A delivery failure fails the request: the caller
    /// would otherwise wait for a code that never arrives.
    pub async fn request_otp(
        store: &Store,
        mailer: &dyn EmailSender,
        email: &str,
        ttl_minutes: i64,
    ) -> AppResult<()> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(AppError::Validation("email is required".into()));
        }

        let code = rand::thread_rng().gen_range(100_000..1_000_000).to_string();
        store
            .otps
            .replace_for_email(OtpRecord::new(email.clone(), code.clone(), ttl_minutes))
            .await?;

        let html = format!(
            "<div style=\"font-family: Arial, sans-serif;\">\
             <h2>Your OTP Code</h2>\
             <p>Your OTP is:</p>\
             <h1>{code}</h1>\
             <p>This OTP expires in {ttl_minutes} minutes.</p>\
             </div>"
        );
        mailer.send(&email, "Your OTP Code", &html).await
    }

    /// Verifies a code, creating the account on first login. The email's
    /// codes are consumed only on success; an expired code advances nothing.
    pub async fn verify_otp(
        store: &Store,
        tokens: &TokenIssuer,
        email: &str,
        code: &str,
    ) -> AppResult<VerifiedLogin> {
        let email = email.trim().to_lowercase();
        let record = store
            .otps
            .find(&email, code)
            .await?
            .ok_or_else(|| AppError::Validation("invalid OTP".into()))?;

        if record.is_expired() {
            return Err(AppError::Validation("OTP expired".into()));
        }

        let (user, is_new_user) = match store.users.find_by_email(&email).await? {
            Some(user) => (user, false),
            None => (store.users.insert(User::new(email.clone())).await?, true),
        };

        store.otps.delete_for_email(&email).await?;
        let token = tokens.sign(user.id)?;

        Ok(VerifiedLogin {
            token,
            user,
            is_new_user,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip_preserves_subject() {
        let tokens = TokenIssuer::new("secret", 7);
        let user_id = Uuid::new_v4();
        let token = tokens.sign(user_id).unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), user_id);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let tokens = TokenIssuer::new("secret", 7);
        let other = TokenIssuer::new("other-secret", 7);
        let token = other.sign(Uuid::new_v4()).unwrap();
        assert!(matches!(tokens.verify(&token), Err(AppError::Auth(_))));
        assert!(matches!(tokens.verify("not-a-token"), Err(AppError::Auth(_))));
    }
}
