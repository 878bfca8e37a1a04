use crate::domain::notification::Notification;
use crate::dto::export::{ExportColumn, ExportTable};
use crate::endpoints::{ExportEndpoint, ExportSink, Notifier};
use crate::services::controller::ListController;
use crate::services::errors::{ServiceError, ServiceResult, endpoint_notification};

const EXPORT_ACTION: &str = "Export";

/// Exports every record matching the live filters and sort.
///
/// Only reads the controller: the loaded page, the selection and the page
/// number are untouched. Returns the number of exported rows; an empty result
/// is not an error.
pub async fn export_records<E, S, N>(
    controller: &ListController,
    endpoint: &E,
    sink: &S,
    notifier: &N,
    columns: &[ExportColumn],
) -> ServiceResult<usize>
where
    E: ExportEndpoint + ?Sized,
    S: ExportSink + ?Sized,
    N: Notifier + ?Sized,
{
    let request = controller.export_request();
    let records = match endpoint.fetch_all(request).await {
        Ok(records) => records,
        Err(err) => {
            log::error!("Export fetch failed: {err}");
            notifier.notify(endpoint_notification(EXPORT_ACTION, &err));
            return Err(ServiceError::Endpoint(err));
        }
    };

    if records.is_empty() {
        notifier.notify(Notification::info("Nothing to export."));
        return Ok(0);
    }

    let table = ExportTable::build(&records, columns);
    if let Err(err) = sink.write_table(&table) {
        log::error!("Writing export failed: {err}");
        notifier.notify(endpoint_notification(EXPORT_ACTION, &err));
        return Err(ServiceError::Endpoint(err));
    }

    let rows = table.rows.len();
    notifier.notify(Notification::success(format!("Exported {rows} records.")));
    Ok(rows)
}
