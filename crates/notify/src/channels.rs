//! Mail and Voice Delivery Channels

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Serialize;
use tracing::debug;

use crate::{ChannelError, NotifyConfig, NotifyError};

/// Sends a plain-text mail to one address
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, address: &str, subject: &str, body: &str) -> Result<(), ChannelError>;
}

/// Attributes handed to the outbound call flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceAttributes {
    pub message: String,
    pub loop_count: String,
    pub status: String,
}

impl VoiceAttributes {
    pub fn call(message: String, loop_count: u32) -> Self {
        Self {
            message,
            loop_count: loop_count.to_string(),
            status: "call".to_string(),
        }
    }
}

/// Places an outbound voice call to an E.164 number
#[async_trait]
pub trait VoiceCaller: Send + Sync {
    async fn call(&self, e164_number: &str, attributes: &VoiceAttributes) -> Result<(), ChannelError>;
}

/// SMTP mail sender
pub struct SmtpMailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpMailSender {
    pub fn new(config: &NotifyConfig) -> Result<Self, NotifyError> {
        let sender = config
            .sender_address
            .parse()
            .map_err(|e| NotifyError::Setup(format!("sender address {}: {}", config.sender_address, e)))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| NotifyError::Setup(format!("SMTP relay {}: {}", config.smtp_host, e)))?
            .port(config.smtp_port)
            .timeout(Some(config.dispatch_timeout()));
        if !config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            sender,
        })
    }
}

#[async_trait]
impl MailSender for SmtpMailSender {
    async fn send(&self, address: &str, subject: &str, body: &str) -> Result<(), ChannelError> {
        let recipient: Mailbox = address
            .parse()
            .map_err(|e| ChannelError::InvalidAddress(format!("{}: {}", address, e)))?;

        let email = Message::builder()
            .from(self.sender.clone())
            .to(recipient)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| ChannelError::Provider(format!("build mail: {}", e)))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| ChannelError::Provider(e.to_string()))?;

        debug!("Mail sent to {}", address);
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct OutboundCall<'a> {
    destination_phone_number: &'a str,
    contact_flow_id: &'a str,
    instance_id: &'a str,
    source_phone_number: &'a str,
    attributes: &'a VoiceAttributes,
}

/// Voice caller backed by an HTTP outbound-call API
pub struct HttpVoiceCaller {
    client: reqwest::Client,
    endpoint: String,
    source_number: String,
    flow_id: String,
    instance_id: String,
}

impl HttpVoiceCaller {
    pub fn new(config: &NotifyConfig) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(config.dispatch_timeout())
            .build()
            .map_err(|e| NotifyError::Setup(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.voice_endpoint.clone(),
            source_number: config.voice_source_number.clone(),
            flow_id: config.voice_flow_id.clone(),
            instance_id: config.voice_instance_id.clone(),
        })
    }
}

#[async_trait]
impl VoiceCaller for HttpVoiceCaller {
    async fn call(&self, e164_number: &str, attributes: &VoiceAttributes) -> Result<(), ChannelError> {
        let request = OutboundCall {
            destination_phone_number: e164_number,
            contact_flow_id: &self.flow_id,
            instance_id: &self.instance_id,
            source_phone_number: &self.source_number,
            attributes,
        };

        self.client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ChannelError::Provider(e.to_string()))?;

        debug!("Voice call placed to {}", e164_number);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_attributes() {
        let attributes = VoiceAttributes::call("hello".to_string(), 3);
        let json = serde_json::to_value(&attributes).unwrap();

        assert_eq!(json["message"], "hello");
        assert_eq!(json["loop_count"], "3");
        assert_eq!(json["status"], "call");
    }

    #[test]
    fn test_outbound_call_shape() {
        let attributes = VoiceAttributes::call("hello".to_string(), 3);
        let request = OutboundCall {
            destination_phone_number: "+819012345678",
            contact_flow_id: "flow",
            instance_id: "instance",
            source_phone_number: "+81312345678",
            attributes: &attributes,
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["DestinationPhoneNumber"], "+819012345678");
        assert_eq!(json["ContactFlowId"], "flow");
        assert_eq!(json["Attributes"]["loop_count"], "3");
    }

    #[test]
    fn test_smtp_sender_rejects_bad_sender() {
        let config = NotifyConfig {
            sender_address: "not an address".to_string(),
            ..Default::default()
        };
        assert!(matches!(SmtpMailSender::new(&config), Err(NotifyError::Setup(_))));
    }
}
