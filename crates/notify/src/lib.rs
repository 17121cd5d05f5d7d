//! Notification Module
//!
//! Resolves the live notification groups of an account and fans an alert
//! (or a schedule result) out to each of their destinations over mail or
//! voice.

mod channels;
mod destination;
mod dispatcher;
mod error;
mod phone;
mod template;
mod topology;

#[cfg(test)]
mod testing;

pub use channels::{HttpVoiceCaller, MailSender, SmtpMailSender, VoiceAttributes, VoiceCaller};
pub use destination::{DeliveryOutcome, DestinationChannels, Schedule};
pub use dispatcher::{DestinationResult, FanoutDispatcher};
pub use error::{ChannelError, NotifyError};
pub use phone::to_e164;
pub use template::NotifyConfig;
pub use topology::NotificationTopology;
