//! Batch processing of pending notification logs.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use sicoop_core::{
    CollectionProvider, Error, ListQuery, NotificationLog, NotificationLogDraft,
    NotificationLogStatus, NotificationProcessor, PageRequest, ProcessingResponse,
    RemoteCollection, Result,
};

use super::delivery::NotificationDelivery;

/// Delivers pending notification logs and records each outcome.
///
/// Each call takes the oldest pending rows up to the batch limit. A
/// delivered row becomes `sent` with `sent_at`; a failed one becomes
/// `failed` with the delivery error. Overlapping calls are refused with
/// [`Error::Busy`].
pub struct PendingNotificationProcessor {
    logs: Arc<dyn RemoteCollection<NotificationLog>>,
    delivery: Arc<dyn NotificationDelivery>,
    batch_limit: usize,
    running: Mutex<()>,
}

impl PendingNotificationProcessor {
    pub fn new(
        logs: Arc<dyn RemoteCollection<NotificationLog>>,
        delivery: Arc<dyn NotificationDelivery>,
        batch_limit: usize,
    ) -> Self {
        Self {
            logs,
            delivery,
            batch_limit,
            running: Mutex::new(()),
        }
    }

    pub fn from_provider<P: CollectionProvider>(
        provider: &P,
        delivery: Arc<dyn NotificationDelivery>,
        batch_limit: usize,
    ) -> Self {
        Self::new(provider.collection::<NotificationLog>(), delivery, batch_limit)
    }

    pub fn batch_limit(&self) -> usize {
        self.batch_limit
    }

    /// Deliver one row and build the draft recording the outcome.
    async fn deliver_one(&self, log: &NotificationLog) -> NotificationLogDraft {
        let mut draft = NotificationLogDraft::from_log(log);
        match self.delivery.deliver(log).await {
            Ok(()) => {
                draft.status = NotificationLogStatus::Sent;
                draft.sent_at = Some(Utc::now());
                draft.error_message = None;
            }
            Err(e) => {
                warn!(
                    subsystem = "api",
                    component = "notification_processor",
                    record_id = %log.id,
                    error = %e,
                    "Notification delivery failed"
                );
                draft.status = NotificationLogStatus::Failed;
                draft.error_message = Some(e.user_message());
            }
        }
        draft
    }
}

#[async_trait]
impl NotificationProcessor for PendingNotificationProcessor {
    async fn process_pending(&self) -> Result<ProcessingResponse> {
        let _running = self
            .running
            .try_lock()
            .map_err(|_| Error::Busy("Processamento já em andamento".to_string()))?;
        let started = Instant::now();

        let query = ListQuery::new()
            .eq("status", NotificationLogStatus::Pending)
            .order_by("created_at", true);
        let window = PageRequest::new(1, u32::try_from(self.batch_limit).unwrap_or(u32::MAX));
        let batch = self.logs.list_page(&query, window).await?.items;

        let mut sent = 0u64;
        let mut failed = 0u64;
        for log in &batch {
            let draft = self.deliver_one(log).await;
            let delivered = draft.status == NotificationLogStatus::Sent;
            // A row whose outcome could not be written stays pending and is
            // picked up again by the next call.
            if let Err(e) = self.logs.update(&log.id, &draft).await {
                warn!(
                    subsystem = "api",
                    component = "notification_processor",
                    record_id = %log.id,
                    error = %e,
                    "Failed to record delivery outcome"
                );
                continue;
            }
            if delivered {
                sent += 1;
            } else {
                failed += 1;
            }
        }

        info!(
            subsystem = "api",
            component = "notification_processor",
            op = "process_pending",
            result_count = batch.len(),
            sent,
            failed,
            duration_ms = started.elapsed().as_millis() as u64,
            "Pending notifications processed"
        );

        let message = if failed == 0 {
            format!("{} notificações enviadas", sent)
        } else {
            format!("{} notificações enviadas, {} com falha", sent, failed)
        };
        Ok(ProcessingResponse::processed(sent + failed, message))
    }
}
