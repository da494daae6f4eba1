use dotenvy::dotenv;
use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub relay: String,
    pub username: String,
    pub password: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct PushConfig {
    pub gateway_url: String,
}

#[derive(Debug, Clone)]
pub struct BlobConfig {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub otp_ttl_minutes: i64,
    pub smtp: Option<SmtpConfig>,
    pub push: Option<PushConfig>,
    pub blob: Option<BlobConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();
        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(4001);
        let jwt_secret = env::var("JWT_SECRET_KEY")
            .map_err(|_| AppError::Config("JWT_SECRET_KEY missing".into()))?;
        let token_ttl_days = env::var("TOKEN_TTL_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(7);
        let otp_ttl_minutes = env::var("OTP_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);

        let smtp = match env::var("SMTP_RELAY") {
            Ok(relay) if !relay.trim().is_empty() => {
                let username = env::var("SMTP_USERNAME")
                    .map_err(|_| AppError::Config("SMTP_USERNAME missing".into()))?;
                let password = env::var("SMTP_PASSWORD")
                    .map_err(|_| AppError::Config("SMTP_PASSWORD missing".into()))?;
                let from = env::var("SMTP_FROM")
                    .unwrap_or_else(|_| "Chat App <no-reply@localhost>".into());
                Some(SmtpConfig {
                    relay,
                    username,
                    password,
                    from,
                })
            }
            _ => None,
        };

        let push = match env::var("PUSH_GATEWAY_URL") {
            Ok(url) if !url.trim().is_empty() => Some(PushConfig { gateway_url: url }),
            _ => None,
        };

        let blob = match env::var("BLOB_STORE_URL") {
            Ok(base_url) if !base_url.trim().is_empty() => {
                let api_key = env::var("BLOB_STORE_API_KEY")
                    .map_err(|_| AppError::Config("BLOB_STORE_API_KEY missing".into()))?;
                Some(BlobConfig { base_url, api_key })
            }
            _ => None,
        };

        Ok(Self {
            port,
            jwt_secret,
            token_ttl_days,
            otp_ttl_minutes,
            smtp,
            push,
            blob,
        })
    }

    pub fn test_defaults() -> Self {
        Self {
            port: 4001,
            jwt_secret: "test-secret".into(),
            token_ttl_days: 7,
            otp_ttl_minutes: 5,
            smtp: None,
            push: None,
            blob: None,
        }
    }
}
