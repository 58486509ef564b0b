//! Query service for the Visier Query API.

use std::sync::Arc;

use reqwest::header::ACCEPT;
use serde_json::{json, Value};

use crate::client::ClientInner;
use crate::table::ResultTable;
use crate::Result;

/// Query results are requested as JSON Lines so they can be decoded
/// line-by-line without buffering the body.
const JSONLINES_ACCEPT: &str = "application/jsonlines, application/json";

/// Service for aggregate, list, and SQL-like queries.
///
/// # Example
///
/// ```no_run
/// use futures_util::StreamExt;
///
/// # async fn example(client: visier_rs::VisierClient) -> visier_rs::Result<()> {
/// let mut table = client
///     .query()
///     .sqllike("SELECT employeeId FROM Employee", None)
///     .await?;
/// println!("columns: {:?}", table.header());
/// while let Some(row) = table.rows().next().await {
///     println!("{:?}", row?);
/// }
/// # Ok(())
/// # }
/// ```
pub struct QueryService {
    inner: Arc<ClientInner>,
}

impl QueryService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Execute an aggregate query and return the tabular result.
    pub async fn aggregate(&self, query: &Value) -> Result<ResultTable> {
        self.run_query("/v1/data/query/aggregate", query.clone()).await
    }

    /// Execute a list (detail) query and return the tabular result.
    pub async fn list(&self, query: &Value) -> Result<ResultTable> {
        self.run_query("/v1/data/query/list", query.clone()).await
    }

    /// Execute a SQL-like query statement and return the tabular result.
    pub async fn sqllike(&self, sql_query: &str, options: Option<Value>) -> Result<ResultTable> {
        let mut body = json!({ "query": sql_query });
        if let Some(options) = options {
            body["options"] = options;
        }
        self.run_query("/v1/data/query/sql", body).await
    }

    async fn run_query(&self, path: &'static str, body: Value) -> Result<ResultTable> {
        let response = self
            .inner
            .session
            .execute(|ctx| {
                let body = body.clone();
                async move {
                    ctx.post(path)
                        .header(ACCEPT, JSONLINES_ACCEPT)
                        .json(&body)
                        .send()
                        .await
                }
            })
            .await?;
        ResultTable::from_response(response).await
    }
}
