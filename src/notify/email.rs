//! SMTP email notifier.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::{SmtpConfig, SmtpTls};
use crate::notify::{Notice, Notifier, NotifyError, Templates};

/// Sends HTML notifications to a single recipient.
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
    recipient: Mailbox,
    templates: Templates,
}

impl EmailNotifier {
    pub fn new(config: &SmtpConfig, templates: Templates) -> Result<Self, NotifyError> {
        let builder = match config.tls {
            SmtpTls::Starttls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?,
            SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?,
            SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
        };

        let mut builder = builder.port(config.port);
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            sender: parse_mailbox(&config.sender)?,
            recipient: parse_mailbox(&config.recipient)?,
            templates,
        })
    }

    fn build_message(&self, notice: &Notice) -> Result<Message, NotifyError> {
        let message = Message::builder()
            .from(self.sender.clone())
            .to(self.recipient.clone())
            .subject(notice.kind.subject())
            .header(ContentType::TEXT_HTML)
            .body(self.templates.render(notice))?;
        Ok(message)
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address.parse().map_err(|source| NotifyError::Address {
        address: address.to_string(),
        source,
    })
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, notice: &Notice) -> Result<(), NotifyError> {
        let message = self.build_message(notice)?;
        self.transport.send(message).await?;

        tracing::info!(
            kind = %notice.kind,
            recipient = %self.recipient,
            "Notification email sent"
        );
        Ok(())
    }
}
