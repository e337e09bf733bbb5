//! Inline two-step delete: arm on the first click, delete on the second.

use entity::Resource;
use platform_api::ApiResult;
use tracing::info;
use uuid::Uuid;

use crate::source::RecordSink;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeleteConfirm {
    #[default]
    Idle,
    Confirming(Uuid),
    Deleting(Uuid),
}

impl DeleteConfirm {
    /// Arm for `id`. Ignored while a delete is in flight.
    pub fn request(&mut self, id: Uuid) {
        if !matches!(self, DeleteConfirm::Deleting(_)) {
            *self = DeleteConfirm::Confirming(id);
        }
    }

    pub fn cancel(&mut self) {
        if let DeleteConfirm::Confirming(_) = self {
            *self = DeleteConfirm::Idle;
        }
    }

    pub fn is_confirming(&self, id: Uuid) -> bool {
        *self == DeleteConfirm::Confirming(id)
    }

    pub fn is_deleting(&self) -> bool {
        matches!(self, DeleteConfirm::Deleting(_))
    }

    /// Delete `id` if and only if the control is armed for it.
    ///
    /// Returns `Ok(false)` without touching the backend when it is not. The
    /// control returns to `Idle` afterwards whatever the outcome.
    pub async fn confirm<R, S>(&mut self, sink: &S, id: Uuid) -> ApiResult<bool>
    where
        R: Resource,
        S: RecordSink<R>,
    {
        if !self.is_confirming(id) {
            return Ok(false);
        }
        *self = DeleteConfirm::Deleting(id);
        let result = sink.delete(id).await;
        *self = DeleteConfirm::Idle;
        result?;
        info!(resource = R::PATH, %id, "record deleted");
        Ok(true)
    }
}
