use super::spec::{DeleteSpec, PollSpec, ProgressCallback};
use super::PollError;
use crate::cloud::resource::{Fetch, ResourceRef, ResourceState};
use crate::cloud::transport::Transport;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

/// Block until `resource` reaches the spec's target status.
///
/// Each iteration checks the deadline, fetches a fresh snapshot (no cache
/// sits between this loop and the transport), and classifies the status:
/// target means success, a member of the failure set means
/// [`PollError::Failure`] carrying the backend's own reason text. Anything
/// else reports progress and sleeps out the interval.
///
/// # Errors
///
/// - [`PollError::Timeout`] when the deadline elapses first
/// - [`PollError::Failure`] on the first observation of a failure status,
///   even if the target would have been reached later
/// - [`PollError::MissingStatusAttribute`] when the fetched state does not
///   expose the named attribute; the resource type is misconfigured, so
///   this is never retried
/// - [`PollError::Gone`] when the resource disappears mid-wait
/// - [`PollError::Fatal`] on any transport fault
pub async fn wait_for_status<T: Transport + ?Sized>(
    transport: &T,
    resource: &ResourceRef,
    spec: &PollSpec,
) -> Result<ResourceState, PollError> {
    let started = Instant::now();
    let mut last_status = "unknown".to_string();

    debug!("waiting for {} to reach {}", resource, spec.target_status);

    loop {
        if let Some(deadline) = spec.deadline {
            if started.elapsed() >= deadline {
                return Err(PollError::Timeout {
                    target: spec.target_status.clone(),
                    elapsed: started.elapsed(),
                    last_status,
                });
            }
        }

        let state = match transport.fetch(resource).await {
            Ok(Fetch::Found(state)) => state,
            Ok(Fetch::Missing) => {
                return Err(PollError::Gone {
                    resource: resource.to_string(),
                });
            }
            Err(source) => {
                return Err(PollError::Fatal {
                    elapsed: started.elapsed(),
                    last_status,
                    source: Box::new(source),
                });
            }
        };

        let Some(status) = state.status(&spec.status_attribute).map(str::to_string) else {
            return Err(PollError::MissingStatusAttribute {
                attribute: spec.status_attribute.clone(),
            });
        };

        if status == spec.target_status {
            debug!(
                "{} reached {} after {:?}",
                resource,
                status,
                started.elapsed()
            );
            return Ok(state);
        }

        if spec.failure_statuses.contains(&status) {
            return Err(PollError::Failure {
                status,
                reason: state.status_reason().unwrap_or_default().to_string(),
            });
        }

        report_progress(spec.progress_callback.as_ref(), &state, resource);
        last_status = status;

        sleep(spec.interval).await;
    }
}

/// Block until `resource` no longer exists.
///
/// Success is the transport's distinguished "not found" answer. Any error
/// from the transport is fatal immediately: expected absence arrives as
/// [`Fetch::Missing`], so an error here indicates a backend fault rather
/// than eventual consistency, and retrying it would only mask the fault.
///
/// # Errors
///
/// - [`PollError::Timeout`] when the deadline elapses while the resource
///   still exists
/// - [`PollError::Fatal`] on any transport fault
pub async fn wait_for_delete<T: Transport + ?Sized>(
    transport: &T,
    resource: &ResourceRef,
    spec: &DeleteSpec,
) -> Result<(), PollError> {
    let started = Instant::now();
    let mut last_status = "unknown".to_string();

    debug!("waiting for {} to be deleted", resource);

    loop {
        if started.elapsed() >= spec.deadline {
            return Err(PollError::Timeout {
                target: "deletion".to_string(),
                elapsed: started.elapsed(),
                last_status,
            });
        }

        match transport.fetch(resource).await {
            Ok(Fetch::Missing) => {
                debug!("{} deleted after {:?}", resource, started.elapsed());
                return Ok(());
            }
            Ok(Fetch::Found(state)) => {
                if let Some(status) = state.status("status") {
                    last_status = status.to_string();
                }
                report_progress(spec.progress_callback.as_ref(), &state, resource);
            }
            Err(source) => {
                return Err(PollError::Fatal {
                    elapsed: started.elapsed(),
                    last_status,
                    source: Box::new(source),
                });
            }
        }

        sleep(spec.interval).await;
    }
}

fn report_progress(
    callback: Option<&ProgressCallback>,
    state: &ResourceState,
    resource: &ResourceRef,
) {
    let (Some(callback), Some(progress)) = (callback, state.progress()) else {
        return;
    };
    let call = std::panic::AssertUnwindSafe(|| callback(progress));
    if std::panic::catch_unwind(call).is_err() {
        warn!("progress callback panicked; continuing to poll {}", resource);
    }
}
