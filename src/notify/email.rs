use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::{AlertMessage, Notifier, NotifyError};

pub struct EmailSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailSender {
    /// `Ok(None)` when SMTP_HOST is unset; an error if it is set but the rest is incomplete.
    pub fn from_env() -> Result<Option<Self>> {
        let Some(host) = std::env::var("SMTP_HOST").ok().filter(|s| !s.trim().is_empty()) else {
            return Ok(None);
        };
        let var = |k: &str| std::env::var(k).map_err(|_| anyhow!("{k} missing"));
        let user = var("SMTP_USER")?;
        let pass = var("SMTP_PASS")?;
        let from_addr = var("NOTIFY_EMAIL_FROM")?;
        let to_addr = var("NOTIFY_EMAIL_TO")?;

        let creds = Credentials::new(user, pass);
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
            .context("invalid SMTP_HOST")?
            .credentials(creds)
            .build();

        let from = from_addr.parse::<Mailbox>().context("invalid NOTIFY_EMAIL_FROM")?;
        let to = to_addr.parse::<Mailbox>().context("invalid NOTIFY_EMAIL_TO")?;

        Ok(Some(Self { mailer, from, to }))
    }
}

fn email_body(msg: &AlertMessage) -> String {
    format!(
        "{}\n\nLocation: {}\nTime: {}\nDetails: {}\n\n{}\n",
        msg.title, msg.place, msg.local_time, msg.url, msg.footer
    )
}

#[async_trait]
impl Notifier for EmailSender {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn send(&self, msg: &AlertMessage) -> Result<(), NotifyError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(msg.title.clone())
            .header(header::ContentType::TEXT_PLAIN)
            .body(email_body(msg))
            .map_err(|e| NotifyError::Delivery(format!("build email: {e}")))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| NotifyError::Delivery(format!("send email: {e}")))?;
        Ok(())
    }
}
