//! Analytic model metadata service for the Visier Model API.

use std::sync::Arc;

use reqwest::header::ACCEPT;
use serde_json::Value;

use crate::client::ClientInner;
use crate::Result;

/// Service for analytic model metadata: analytic objects, their dimensions,
/// members, properties and selection concepts, and metrics.
///
/// Responses are returned as raw JSON values; the model schema varies per
/// tenant configuration.
pub struct ModelService {
    inner: Arc<ClientInner>,
}

impl ModelService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Get analytic objects, optionally restricted to the given ids.
    pub async fn analytic_objects(&self, ids: Option<&[&str]>) -> Result<Value> {
        self.get_json(format!("/v1/data/model/analytic-objects{}", ids_query(ids)))
            .await
    }

    /// Get the dimensions of an analytic object, optionally restricted to
    /// the given ids.
    pub async fn dimensions(&self, object_id: &str, ids: Option<&[&str]>) -> Result<Value> {
        self.get_json(format!(
            "/v1/data/model/analytic-objects/{object_id}/dimensions{}",
            ids_query(ids)
        ))
        .await
    }

    /// Get the members of a dimension on an analytic object.
    pub async fn members(&self, object_id: &str, dimension_id: &str) -> Result<Value> {
        self.get_json(format!(
            "/v1/data/model/analytic-objects/{object_id}/dimensions/{dimension_id}/members"
        ))
        .await
    }

    /// Get the selection concepts of an analytic object, optionally
    /// restricted to the given ids.
    pub async fn selection_concepts(
        &self,
        object_id: &str,
        ids: Option<&[&str]>,
    ) -> Result<Value> {
        self.get_json(format!(
            "/v1/data/model/analytic-objects/{object_id}/selection-concepts{}",
            ids_query(ids)
        ))
        .await
    }

    /// Get the properties of an analytic object, optionally restricted to
    /// the given ids.
    pub async fn properties(&self, object_id: &str, ids: Option<&[&str]>) -> Result<Value> {
        self.get_json(format!(
            "/v1/data/model/analytic-objects/{object_id}/properties{}",
            ids_query(ids)
        ))
        .await
    }

    /// Get metrics, optionally restricted to the given ids.
    pub async fn metrics(&self, ids: Option<&[&str]>) -> Result<Value> {
        self.get_json(format!("/v1/data/model/metrics{}", ids_query(ids)))
            .await
    }

    /// Get the dimensions of a metric.
    pub async fn metric_dimensions(&self, metric_id: &str) -> Result<Value> {
        self.get_json(format!("/v1/data/model/metrics/{metric_id}/dimensions"))
            .await
    }

    async fn get_json(&self, path: String) -> Result<Value> {
        let response = self
            .inner
            .session
            .execute(|ctx| {
                let path = path.clone();
                async move {
                    ctx.get(&path)
                        .header(ACCEPT, "application/json")
                        .send()
                        .await
                }
            })
            .await?;
        Ok(response.json().await?)
    }
}

/// Render an optional id list as repeated `ids` query arguments.
fn ids_query(ids: Option<&[&str]>) -> String {
    match ids {
        Some(ids) if !ids.is_empty() => {
            let args = ids
                .iter()
                .map(|id| format!("ids={}", urlencoding::encode(id)))
                .collect::<Vec<_>>()
                .join("&");
            format!("?{args}")
        }
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_query_empty() {
        assert_eq!(ids_query(None), "");
        assert_eq!(ids_query(Some(&[])), "");
    }

    #[test]
    fn test_ids_query_encodes_values() {
        assert_eq!(
            ids_query(Some(&["Employee", "Compensation Payout"])),
            "?ids=Employee&ids=Compensation%20Payout"
        );
    }
}
