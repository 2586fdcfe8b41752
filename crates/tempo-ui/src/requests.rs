//! Outbound side of the UI's pipe connection: the three requests the editor
//! layer sends when the user touches a task.

use std::sync::Arc;

use tracing::warn;

use tempo_core::RecordId;
use tempo_pipe::PipeClient;
use tempo_protocol::ServerFn;

/// Thin handle the task-editing layer holds. Sends are fire-and-forget;
/// a lost request merely delays the monitor until the next daily resync.
#[derive(Clone)]
pub struct TaskRequests {
    client: Arc<PipeClient>,
}

impl TaskRequests {
    pub fn new(client: Arc<PipeClient>) -> Self {
        Self { client }
    }

    /// The task was deleted or completed: stop monitoring it.
    pub async fn cancel(&self, id: RecordId) {
        self.send(ServerFn::Cancel, id).await;
    }

    /// The task's dates changed: rebind its monitor to the new timing.
    pub async fn rebind(&self, id: RecordId) {
        self.send(ServerFn::Rebind, id).await;
    }

    /// The task was just created: give it a shot at a monitor slot.
    pub async fn ensure(&self, id: RecordId) {
        self.send(ServerFn::Ensure, id).await;
    }

    async fn send(&self, function: ServerFn, id: RecordId) {
        if let Err(e) = self.client.send(&function.with_id(id).encode()).await {
            warn!(?function, %id, "request not delivered: {e}");
        }
    }
}
