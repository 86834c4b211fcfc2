//! Outbound notifications to matched donors.
//!
//! Delivery (email, SMS, push) belongs to an external service. [`LogNotifier`] records what would
//! have been sent.

use crate::matching::BloodRequestView;
use crate::CoreResult;
use async_trait::async_trait;
use hemo_types::{BloodType, Urgency};
use hemo_uuid::RecordId;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub request_id: RecordId,
    pub blood_type: BloodType,
    pub units_needed: u32,
    pub urgency: Urgency,
    pub message: String,
}

impl Notice {
    pub fn for_request(request: &BloodRequestView) -> Self {
        Self {
            request_id: request.id().clone(),
            blood_type: request.blood_type(),
            units_needed: request.units_needed(),
            urgency: request.urgency(),
            message: format!(
                "{} urgency request for {} unit(s) of {}",
                request.urgency(),
                request.units_needed(),
                request.blood_type()
            ),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Hands `notice` to each recipient. Returns the number of recipients accepted.
    async fn notify(&self, recipients: &[RecordId], notice: &Notice) -> CoreResult<usize>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, recipients: &[RecordId], notice: &Notice) -> CoreResult<usize> {
        tracing::info!(
            request_id = %notice.request_id,
            blood_type = %notice.blood_type,
            urgency = %notice.urgency,
            recipients = recipients.len(),
            "{}",
            notice.message
        );
        Ok(recipients.len())
    }
}
