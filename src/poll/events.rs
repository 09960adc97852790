use super::PollError;
use crate::cloud::event::{is_terminal_status, EventRecord};
use crate::cloud::resource::ResourceRef;
use crate::cloud::transport::Transport;
use crate::config::{DEFAULT_STATUS_ATTRIBUTE, EMPTY_POLLS_BEFORE_STATUS_FALLBACK};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

/// Terminal outcome of an orchestration operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// The terminal status, e.g. `CREATE_COMPLETE`
    pub status: String,
    /// Backend-provided reason text, verbatim
    pub message: String,
}

/// Block until the event log for `scope` reports a terminal status.
///
/// Events are consumed in ascending arrival order; the last-seen id
/// becomes the marker for the next fetch and is never moved backward.
/// With `action` given, only `{ACTION}_COMPLETE` / `{ACTION}_FAILED` end
/// the wait; without one, any `_COMPLETE` / `_FAILED` suffix on a
/// scope-level event does. Those two shapes are deliberately kept side by
/// side - see [`is_terminal_status`].
///
/// Event feeds are not guaranteed to emit a final record promptly, so
/// after two consecutive empty polls the loop escalates to one direct
/// status fetch on the scope itself, bounding the staleness window. The
/// fallback does not advance or rewind the marker.
///
/// There is no intrinsic deadline: callers needing a bounded wait wrap
/// this future in `tokio::time::timeout` and treat expiry as a stop
/// condition not yet reached, not a distinct error.
///
/// # Errors
///
/// - [`PollError::Fatal`] when the event fetch or the fallback status
///   fetch fails
/// - [`PollError::MissingStatusAttribute`] when the fallback state does
///   not expose a `status` attribute
pub async fn poll_for_completion<T: Transport + ?Sized>(
    transport: &T,
    scope: &ResourceRef,
    action: Option<&str>,
    poll_period: Duration,
    marker: Option<String>,
) -> Result<Completion, PollError> {
    let started = Instant::now();
    let mut marker = marker;
    let mut last_status = "no events seen".to_string();
    let mut no_event_polls: u32 = 0;

    debug!(
        "polling events for {} (action: {:?}, marker: {:?})",
        scope, action, marker
    );

    loop {
        let events = match transport.events_since(scope, marker.as_deref()).await {
            Ok(events) => events,
            Err(source) => return Err(fatal(source, started, last_status)),
        };

        if events.is_empty() {
            no_event_polls += 1;
        } else {
            no_event_polls = 0;
            if let Some(last) = events.last() {
                marker = Some(last.id.clone());
            }

            for event in &events {
                log_event(event);
                if !event.is_scope_event(scope) {
                    continue;
                }
                if is_terminal_status(&event.resource_status, action) {
                    return Ok(Completion {
                        status: event.resource_status.clone(),
                        message: event
                            .resource_status_reason
                            .clone()
                            .unwrap_or_default(),
                    });
                }
                last_status = event.resource_status.clone();
            }
        }

        if no_event_polls >= EMPTY_POLLS_BEFORE_STATUS_FALLBACK {
            // the event feed has gone quiet; ask the scope itself
            debug!(
                "no events from {} in {} polls, checking status directly",
                scope, no_event_polls
            );
            let state = match transport.direct_status(scope).await {
                Ok(state) => state,
                Err(source) => return Err(fatal(source, started, last_status)),
            };

            let Some(status) = state.status(DEFAULT_STATUS_ATTRIBUTE).map(str::to_string)
            else {
                return Err(PollError::MissingStatusAttribute {
                    attribute: DEFAULT_STATUS_ATTRIBUTE.to_string(),
                });
            };

            if is_terminal_status(&status, action) {
                return Ok(Completion {
                    status,
                    message: state.status_reason().unwrap_or_default().to_string(),
                });
            }
            last_status = status;
            no_event_polls = 0;
        }

        sleep(poll_period).await;
    }
}

fn fatal(source: crate::error::Error, started: Instant, last_status: String) -> PollError {
    PollError::Fatal {
        elapsed: started.elapsed(),
        last_status,
        source: Box::new(source),
    }
}

fn log_event(event: &EventRecord) {
    info!(
        "[{}] {} {}{}",
        event.timestamp.format("%Y-%m-%d %H:%M:%S"),
        event.resource_name,
        event.resource_status,
        event
            .resource_status_reason
            .as_deref()
            .map(|reason| format!(": {reason}"))
            .unwrap_or_default()
    );
}
