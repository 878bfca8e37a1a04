//! Collaborators the list controller talks to.
//!
//! The controller itself never performs I/O. Services drive these traits and
//! feed the results back into it, which keeps the state machine testable with
//! the mocks from [`mock`].

use async_trait::async_trait;

use crate::domain::notification::Notification;
use crate::domain::record::{Record, RecordPatch};
use crate::domain::types::RecordId;
use crate::dto::export::{ExportRequest, ExportTable};
use crate::dto::list::{ListPage, ListRequest};
use crate::endpoints::errors::EndpointResult;

pub mod csv;
pub mod errors;
#[cfg(feature = "http")]
pub mod http;
#[cfg(any(test, feature = "test-mocks"))]
pub mod mock;
pub mod notify;

/// Remote paginated list.
#[async_trait]
pub trait ListEndpoint: Send + Sync {
    async fn fetch_page(&self, request: ListRequest) -> EndpointResult<ListPage>;
}

/// Per-record partial updates.
#[async_trait]
pub trait MutationEndpoint: Send + Sync {
    /// Returns the record echoed by the server, or `None` when the server only
    /// acknowledged the update.
    async fn update_record(
        &self,
        id: RecordId,
        patch: RecordPatch,
    ) -> EndpointResult<Option<Record>>;

    async fn delete_record(&self, id: RecordId) -> EndpointResult<()>;
}

/// Unpaged fetch of every record matching the current criteria.
#[async_trait]
pub trait ExportEndpoint: Send + Sync {
    async fn fetch_all(&self, request: ExportRequest) -> EndpointResult<Vec<Record>>;
}

/// Turns an export table into a file.
pub trait ExportSink {
    fn write_table(&self, table: &ExportTable) -> EndpointResult<()>;
}

/// Receives human-readable outcomes of user actions.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}
