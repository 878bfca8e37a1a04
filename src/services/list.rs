use crate::endpoints::{ListEndpoint, Notifier};
use crate::services::controller::{ApplyOutcome, ListController, PendingFetch};
use crate::services::errors::{ServiceError, ServiceResult, endpoint_notification};
use crate::services::reconcile::PageOutcome;

const LOAD_ACTION: &str = "Loading records";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The query was already loaded or is in flight.
    Skipped,
    /// A newer request overtook this one.
    Stale,
    Loaded(PageOutcome),
}

/// Brings the loaded page in line with the current query, fetching only when
/// the coordinator asks for it.
pub async fn sync<E, N>(
    controller: &mut ListController,
    endpoint: &E,
    notifier: &N,
) -> ServiceResult<SyncOutcome>
where
    E: ListEndpoint + ?Sized,
    N: Notifier + ?Sized,
{
    let Some(pending) = controller.next_fetch() else {
        return Ok(SyncOutcome::Skipped);
    };
    let outcome = run_fetch(controller, endpoint, notifier, pending).await?;

    // A clamped page has not been fetched yet.
    if outcome == SyncOutcome::Loaded(PageOutcome::Clamped) {
        if let Some(pending) = controller.next_fetch() {
            return run_fetch(controller, endpoint, notifier, pending).await;
        }
    }
    Ok(outcome)
}

/// Fetches the current query again, e.g. after a failure or a bulk action.
pub async fn reload<E, N>(
    controller: &mut ListController,
    endpoint: &E,
    notifier: &N,
) -> ServiceResult<SyncOutcome>
where
    E: ListEndpoint + ?Sized,
    N: Notifier + ?Sized,
{
    let pending = controller.reload();
    run_fetch(controller, endpoint, notifier, pending).await
}

async fn run_fetch<E, N>(
    controller: &mut ListController,
    endpoint: &E,
    notifier: &N,
    pending: PendingFetch,
) -> ServiceResult<SyncOutcome>
where
    E: ListEndpoint + ?Sized,
    N: Notifier + ?Sized,
{
    let result = endpoint.fetch_page(pending.request).await;
    match controller.apply_list_response(pending.seq, result) {
        ApplyOutcome::Applied(outcome) => Ok(SyncOutcome::Loaded(outcome)),
        ApplyOutcome::Stale => Ok(SyncOutcome::Stale),
        ApplyOutcome::Failed(err) => {
            notifier.notify(endpoint_notification(LOAD_ACTION, &err));
            Err(ServiceError::Endpoint(err))
        }
    }
}
