use anyhow::Context;
use async_trait::async_trait;
use lettre::message::{header::ContentType, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{Mailer, OutgoingMail};
use crate::config::AppConfig;

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(
        host: &str,
        port: u16,
        credentials: Option<Credentials>,
        from: String,
    ) -> anyhow::Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .with_context(|| format!("invalid SMTP relay {host}"))?
            .port(port);
        if let Some(credentials) = credentials {
            builder = builder.credentials(credentials);
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    /// `None` when no SMTP host is configured.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Option<Self>> {
        if config.smtp_host.is_empty() {
            return Ok(None);
        }

        let credentials = (!config.smtp_user.is_empty() && !config.smtp_pass.is_empty())
            .then(|| Credentials::new(config.smtp_user.clone(), config.smtp_pass.clone()));

        Self::new(
            &config.smtp_host,
            config.smtp_port,
            credentials,
            config.mail_from.clone(),
        )
        .map(Some)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_mail(&self, mail: &OutgoingMail) -> anyhow::Result<()> {
        let builder = Message::builder()
            .from(self.from.parse().context("invalid from address")?)
            .to(mail.to.parse().context("invalid recipient address")?)
            .subject(mail.subject.clone());

        let message = match &mail.html {
            Some(html) => builder.multipart(MultiPart::alternative_plain_html(
                mail.text.clone(),
                html.clone(),
            )),
            None => builder.singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_PLAIN)
                    .body(mail.text.clone()),
            ),
        }
        .context("failed to build email")?;

        self.transport
            .send(message)
            .await
            .context("failed to send email")?;

        Ok(())
    }
}
