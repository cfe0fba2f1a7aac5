//! Requests running in the background while the UI keeps drawing.

use crate::app::App;
use clanker_engine::{dispatch, ClientError, ConversationReply, ConversationService, Outbound};
use std::sync::Arc;
use tokio::task::JoinHandle;

type RequestHandle = JoinHandle<Result<ConversationReply, ClientError>>;

/// Spawned requests, each paired with the placeholder it will resolve.
#[derive(Default)]
pub(crate) struct InFlight {
    requests: Vec<(Outbound, RequestHandle)>,
}

impl InFlight {
    /// Send `outbound` on a background task.
    pub(crate) fn spawn(&mut self, service: &Arc<dyn ConversationService>, outbound: Outbound) {
        let service = Arc::clone(service);
        let request = outbound.request.clone();
        let handle = tokio::spawn(async move { dispatch(service.as_ref(), &request).await });
        self.requests.push((outbound, handle));
    }

    /// Apply every finished request to the app.
    pub(crate) async fn drain_finished(&mut self, app: &mut App) {
        let mut i = 0;
        while i < self.requests.len() {
            if !self.requests[i].1.is_finished() {
                i += 1;
                continue;
            }
            let (outbound, handle) = self.requests.remove(i);
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(error = %e, "Request task failed");
                    Err(ClientError::Interrupted(e.to_string()))
                }
            };
            app.complete(outbound, result);
        }
    }

    /// Abort requests that are still running.
    pub(crate) fn abort_all(self) {
        for (_, handle) in self.requests {
            handle.abort();
        }
    }
}
