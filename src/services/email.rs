use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::SmtpConfig;
use crate::error::{AppError, AppResult};

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> AppResult<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(cfg: &SmtpConfig) -> AppResult<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.relay)
            .map_err(|e| AppError::Config(format!("smtp relay: {e}")))?
            .credentials(Credentials::new(cfg.username.clone(), cfg.password.clone()))
            .build();
        Ok(Self {
            transport,
            from: cfg.from.clone(),
        })
    }
}

#[async_trait]
impl EmailSender for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> AppResult<()> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|_| AppError::Config("invalid SMTP_FROM address".into()))?,
            )
            .to(to
                .parse()
                .map_err(|_| AppError::Validation("invalid email address".into()))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
            .map_err(|e| AppError::ExternalService(format!("email build: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::ExternalService(format!("email send: {e}")))?;
        Ok(())
    }
}

/// Development fallback when SMTP is unconfigured: the mail is logged instead
/// of sent.
pub struct LogMailer;

#[async_trait]
impl EmailSender for LogMailer {
    async fn send(&self, to: &str, subject: &str, _html: &str) -> AppResult<()> {
        tracing::info!(%to, %subject, "SMTP not configured; logging email instead of sending");
        Ok(())
    }
}
