use lettre::message::{Mailbox, Message, header};
use lettre::transport::smtp::{AsyncSmtpTransport, authentication::Credentials};
use lettre::{AsyncTransport, Tokio1Executor};
use tracing::info;

use crate::error::MailError;
use crate::render::Digest;

/// SMTP settings, read from `SMTP_HOST`, `SMTP_PORT` (default 587),
/// `SMTP_USER`, `SMTP_PASS`, `EMAIL_FROM` (default `SMTP_USER`) and
/// `EMAIL_TO` (comma-separated).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
    pub to: Vec<String>,
}

impl MailSettings {
    pub fn from_env() -> Result<Self, MailError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, MailError> {
        let required = |k: &'static str| {
            get(k)
                .filter(|v| !v.trim().is_empty())
                .ok_or(MailError::MissingEnv(k))
        };
        let host = required("SMTP_HOST")?;
        let user = required("SMTP_USER")?;
        let pass = required("SMTP_PASS")?;
        let port = match get("SMTP_PORT") {
            Some(p) => p.trim().parse::<u16>().map_err(|_| MailError::Port(p))?,
            None => 587,
        };
        let from = get("EMAIL_FROM")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| user.clone());
        let to: Vec<String> = required("EMAIL_TO")?
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        if to.is_empty() {
            return Err(MailError::MissingEnv("EMAIL_TO"));
        }
        Ok(Self {
            host,
            port,
            user,
            pass,
            from,
            to,
        })
    }
}

pub struct EmailSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

impl EmailSender {
    pub fn new(settings: &MailSettings) -> Result<Self, MailError> {
        let creds = Credentials::new(settings.user.clone(), settings.pass.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
            .port(settings.port)
            .credentials(creds)
            .build();
        let from = parse_mailbox(&settings.from)?;
        let to = settings
            .to
            .iter()
            .map(|a| parse_mailbox(a))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { mailer, from, to })
    }

    pub async fn send_digest(&self, digest: &Digest) -> Result<(), MailError> {
        let msg = build_message(&self.from, &self.to, digest)?;
        self.mailer.send(msg).await?;
        info!(recipients = self.to.len(), "digest sent");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse().map_err(|source| MailError::Address {
        address: address.to_string(),
        source,
    })
}

fn build_message(from: &Mailbox, to: &[Mailbox], digest: &Digest) -> Result<Message, MailError> {
    let mut builder = Message::builder()
        .from(from.clone())
        .subject(digest.subject.as_str())
        .header(header::ContentType::TEXT_PLAIN);
    for rcpt in to {
        builder = builder.to(rcpt.clone());
    }
    Ok(builder.body(digest.body.clone())?)
}
