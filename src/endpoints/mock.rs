//! Mock collaborators for isolating services in tests.

use async_trait::async_trait;
use mockall::mock;

use crate::domain::notification::Notification;
use crate::domain::record::{Record, RecordPatch};
use crate::domain::types::RecordId;
use crate::dto::export::{ExportRequest, ExportTable};
use crate::dto::list::{ListPage, ListRequest};
use crate::endpoints::errors::EndpointResult;
use crate::endpoints::{ExportEndpoint, ExportSink, ListEndpoint, MutationEndpoint, Notifier};

mock! {
    pub Endpoints {}

    #[async_trait]
    impl ListEndpoint for Endpoints {
        async fn fetch_page(&self, request: ListRequest) -> EndpointResult<ListPage>;
    }

    #[async_trait]
    impl MutationEndpoint for Endpoints {
        async fn update_record(
            &self,
            id: RecordId,
            patch: RecordPatch,
        ) -> EndpointResult<Option<Record>>;
        async fn delete_record(&self, id: RecordId) -> EndpointResult<()>;
    }

    #[async_trait]
    impl ExportEndpoint for Endpoints {
        async fn fetch_all(&self, request: ExportRequest) -> EndpointResult<Vec<Record>>;
    }
}

mock! {
    pub ExportSink {}

    impl ExportSink for ExportSink {
        fn write_table(&self, table: &ExportTable) -> EndpointResult<()>;
    }
}

mock! {
    pub Notifier {}

    impl Notifier for Notifier {
        fn notify(&self, notification: Notification);
    }
}
