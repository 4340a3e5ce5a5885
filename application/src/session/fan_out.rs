//! Bounded parallel fan-out over member model calls
//!
//! The three parallel steps of the protocol (leader election, seconding,
//! voting) all share this shape: spawn one JSON call per member, join them
//! all, and hand the replies back keyed by member id. No event is emitted
//! and no shared state is touched until the join completes; callers re-order
//! replies into member turn order themselves.
//!
//! A transport error from any call, or a cancellation observed mid-fan-out,
//! aborts every outstanding call and fails the session.

use std::collections::HashMap;
use std::sync::Arc;

use conclave_domain::JsonReply;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use super::error::SessionError;
use crate::ports::model_client::{CompletionOptions, ModelClient};

/// One member's pending JSON call
pub(crate) struct JsonCall {
    pub member_id: String,
    pub client: Arc<dyn ModelClient>,
    pub system_prompt: String,
    pub user_prompt: String,
    pub options: CompletionOptions,
}

/// Fail fast if cancellation has been requested.
pub(crate) fn check_cancelled(cancel: &Option<CancellationToken>) -> Result<(), SessionError> {
    if let Some(token) = cancel
        && token.is_cancelled()
    {
        return Err(SessionError::Cancelled);
    }
    Ok(())
}

/// Run all calls concurrently and join them.
///
/// Returns replies keyed by member id; the map covers every call on
/// success. The iteration order of the result is unspecified; callers must
/// re-order by member turn order before emitting events.
pub(crate) async fn collect_json_replies(
    calls: Vec<JsonCall>,
    cancel: &Option<CancellationToken>,
) -> Result<HashMap<String, JsonReply>, SessionError> {
    check_cancelled(cancel)?;
    let token = cancel.clone().unwrap_or_default();

    let mut join_set = JoinSet::new();
    for call in calls {
        join_set.spawn(async move {
            let reply = call
                .client
                .complete_json(&call.system_prompt, &call.user_prompt, &call.options)
                .await;
            (call.member_id, reply)
        });
    }

    let mut replies = HashMap::new();
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                warn!("fan-out cancelled; aborting outstanding calls");
                join_set.abort_all();
                return Err(SessionError::Cancelled);
            }
            joined = join_set.join_next() => {
                let Some(joined) = joined else { break };
                match joined {
                    Ok((member_id, Ok(reply))) => {
                        replies.insert(member_id, reply);
                    }
                    Ok((member_id, Err(client_error))) => {
                        error!(member = %member_id, error = %client_error, "model call failed; aborting fan-out");
                        join_set.abort_all();
                        return Err(SessionError::Client(client_error));
                    }
                    Err(join_error) => {
                        join_set.abort_all();
                        return Err(SessionError::Join(join_error.to_string()));
                    }
                }
            }
        }
    }

    Ok(replies)
}
