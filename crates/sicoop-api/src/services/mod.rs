//! Service layer for notification processing.

pub mod delivery;
pub mod notification_processor;

pub use delivery::{LogDelivery, NotificationDelivery, WebhookDelivery};
pub use notification_processor::PendingNotificationProcessor;
