//! reqwest-backed implementation of the list, mutation and export endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;

use crate::domain::record::{Record, RecordPatch};
use crate::domain::types::RecordId;
use crate::dto::export::{ExportRequest, normalize_export_response};
use crate::dto::list::{ListPage, ListRequest, normalize_list_response};
use crate::dto::mutation::normalize_mutation_response;
use crate::endpoints::errors::{EndpointError, EndpointResult};
use crate::endpoints::{ExportEndpoint, ListEndpoint, MutationEndpoint};
use crate::models::config::ClientConfig;

/// Talks to the admin JSON API described by a [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct HttpEndpoints {
    client: Client,
    base_url: String,
    list_path: String,
    mutation_path: String,
    export_path: String,
    auth_token: Option<String>,
}

impl HttpEndpoints {
    pub fn new(config: &ClientConfig) -> EndpointResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|err| EndpointError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            list_path: config.list_path.clone(),
            mutation_path: config.mutation_path.clone(),
            export_path: config.export_path.clone(),
            auth_token: config.auth_token.clone(),
        })
    }

    fn record_route(&self, id: RecordId) -> String {
        self.mutation_path.replace("{id}", &id.to_string())
    }

    fn request(&self, method: Method, route: &str, query: Option<&str>) -> RequestBuilder {
        let url = match query {
            Some(query) if !query.is_empty() => format!("{}{route}?{query}", self.base_url),
            _ => format!("{}{route}", self.base_url),
        };
        log::debug!("{method} {url}");

        let builder = self
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends the request and returns the raw body of a successful response.
    async fn send(&self, builder: RequestBuilder, route: &str) -> EndpointResult<String> {
        let response: Response = builder
            .send()
            .await
            .map_err(|err| EndpointError::Transport(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| EndpointError::Transport(err.to_string()))?;

        if status.is_success() {
            Ok(body)
        } else {
            let err = EndpointError::from_status(status.as_u16(), route, &body);
            log::error!("{route} answered {status}: {err}");
            Err(err)
        }
    }
}

fn parse_json(body: &str) -> EndpointResult<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|err| EndpointError::Decode(err.to_string()))
}

#[async_trait]
impl ListEndpoint for HttpEndpoints {
    async fn fetch_page(&self, request: ListRequest) -> EndpointResult<ListPage> {
        let query = request.query_string()?;
        let builder = self.request(Method::GET, &self.list_path, Some(&query));
        let body = self.send(builder, &self.list_path).await?;
        normalize_list_response(&parse_json(&body)?, &request)
    }
}

#[async_trait]
impl MutationEndpoint for HttpEndpoints {
    async fn update_record(
        &self,
        id: RecordId,
        patch: RecordPatch,
    ) -> EndpointResult<Option<Record>> {
        let route = self.record_route(id);
        let builder = self.request(Method::PATCH, &route, None).json(&patch);
        let body = self.send(builder, &route).await?;
        normalize_mutation_response(&parse_json(&body)?)
    }

    async fn delete_record(&self, id: RecordId) -> EndpointResult<()> {
        let route = self.record_route(id);
        let builder = self.request(Method::DELETE, &route, None);
        let body = self.send(builder, &route).await?;
        // Some backends answer 200 with `success: false` instead of an error status.
        normalize_mutation_response(&parse_json(&body)?).map(|_| ())
    }
}

#[async_trait]
impl ExportEndpoint for HttpEndpoints {
    async fn fetch_all(&self, request: ExportRequest) -> EndpointResult<Vec<Record>> {
        let query = request.query_string()?;
        let builder = self.request(Method::GET, &self.export_path, Some(&query));
        let body = self.send(builder, &self.export_path).await?;
        normalize_export_response(&parse_json(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_route_substitutes_id() {
        let config = ClientConfig {
            base_url: "https://admin.example.com/".to_string(),
            mutation_path: "/api/leads/{id}".to_string(),
            ..ClientConfig::default()
        };
        let endpoints = HttpEndpoints::new(&config).expect("client builds");

        assert_eq!(endpoints.base_url, "https://admin.example.com");
        assert_eq!(
            endpoints.record_route(RecordId::new(7).expect("valid id")),
            "/api/leads/7"
        );
    }

    #[test]
    fn blank_body_is_null() {
        assert_eq!(parse_json("  "), Ok(Value::Null));
        assert!(matches!(parse_json("{"), Err(EndpointError::Decode(_))));
    }
}
