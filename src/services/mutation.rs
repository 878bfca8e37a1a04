use crate::domain::notification::Notification;
use crate::domain::record::{RecordPatch, RecordStatus};
use crate::domain::types::RecordId;
use crate::endpoints::{ListEndpoint, MutationEndpoint, Notifier};
use crate::forms::record::{NotesForm, StatusForm};
use crate::services::controller::{ListController, MutationOutcome};
use crate::services::errors::{ServiceError, ServiceResult, endpoint_notification};
use crate::services::list;

const SAVE_ACTION: &str = "Saving";
const DELETE_ACTION: &str = "Deleting";

/// Applies `patch` locally, then sends it to the server.
///
/// The edit is visible before the request is made; the success notice waits
/// for the server. The list is never refetched by a mutation.
pub async fn update_record<M, N>(
    controller: &mut ListController,
    endpoint: &M,
    notifier: &N,
    id: RecordId,
    patch: RecordPatch,
) -> ServiceResult<MutationOutcome>
where
    M: MutationEndpoint + ?Sized,
    N: Notifier + ?Sized,
{
    if patch.is_empty() {
        return Err(ServiceError::InvalidQuery("nothing to update".to_string()));
    }

    let pending = match controller.begin_mutation(id, patch.clone()) {
        Ok(pending) => pending,
        Err(err) => {
            notifier.notify(err.notification(SAVE_ACTION));
            return Err(err);
        }
    };

    let result = endpoint.update_record(id, patch).await;
    let outcome = controller.complete_mutation(pending, result);
    match &outcome {
        MutationOutcome::Failed { error, rolled_back } => {
            log::error!("Updating record {id} failed (rolled back: {rolled_back}): {error}");
            notifier.notify(endpoint_notification(SAVE_ACTION, error));
        }
        MutationOutcome::Confirmed | MutationOutcome::Acknowledged => {
            notifier.notify(Notification::success(format!("Record #{id} updated.")));
        }
    }
    Ok(outcome)
}

pub async fn set_status<M, N>(
    controller: &mut ListController,
    endpoint: &M,
    notifier: &N,
    id: RecordId,
    status: RecordStatus,
) -> ServiceResult<MutationOutcome>
where
    M: MutationEndpoint + ?Sized,
    N: Notifier + ?Sized,
{
    update_record(controller, endpoint, notifier, id, RecordPatch::status(status)).await
}

/// Submits the status dropdown of a row or the detail view.
pub async fn submit_status_form<M, N>(
    controller: &mut ListController,
    endpoint: &M,
    notifier: &N,
    form: StatusForm,
) -> ServiceResult<MutationOutcome>
where
    M: MutationEndpoint + ?Sized,
    N: Notifier + ?Sized,
{
    let (id, patch) = form.into_patch()?;
    update_record(controller, endpoint, notifier, id, patch).await
}

pub async fn submit_notes_form<M, N>(
    controller: &mut ListController,
    endpoint: &M,
    notifier: &N,
    form: NotesForm,
) -> ServiceResult<MutationOutcome>
where
    M: MutationEndpoint + ?Sized,
    N: Notifier + ?Sized,
{
    let (id, patch) = form.into_patch()?;
    update_record(controller, endpoint, notifier, id, patch).await
}

/// Deletes every selected record, then reloads the current page.
///
/// Each deleted id leaves the selection as soon as the server accepts it, so
/// after a failure only the records still present stay selected. Returns the
/// number of deleted records.
pub async fn delete_selected<E, N>(
    controller: &mut ListController,
    endpoint: &E,
    notifier: &N,
) -> ServiceResult<usize>
where
    E: MutationEndpoint + ListEndpoint + ?Sized,
    N: Notifier + ?Sized,
{
    let ids = controller.selection().ids();
    if ids.is_empty() {
        let err = ServiceError::EmptySelection;
        notifier.notify(err.notification(DELETE_ACTION));
        return Err(err);
    }

    let mut deleted = 0;
    let mut failure = None;
    for id in ids {
        match endpoint.delete_record(id).await {
            Ok(()) => {
                controller.deselect(id);
                deleted += 1;
            }
            Err(err) => {
                log::error!("Deleting record {id} failed: {err}");
                failure = Some(err);
                break;
            }
        }
    }

    if let Some(err) = failure {
        notifier.notify(endpoint_notification(DELETE_ACTION, &err));
        if deleted > 0 {
            // A failed reload has already been reported by `list::reload`.
            if let Err(reload_err) = list::reload(controller, endpoint, notifier).await {
                log::warn!("Reload after partial delete failed: {reload_err}");
            }
        }
        return Err(ServiceError::Endpoint(err));
    }

    notifier.notify(Notification::success(format!("Deleted {deleted} records.")));
    list::reload(controller, endpoint, notifier).await?;
    Ok(deleted)
}
