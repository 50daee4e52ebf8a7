//! PostgREST client for the Supabase tables.
//!
//! Every call is a single request with the client-level timeout; there is
//! no retry. Row selectors use `id=eq.{id}`, pagination uses the `Range`
//! header with `Prefer: count=exact`, and procedures are posted to
//! `/rest/v1/rpc/{function}`.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_RANGE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};
use tracing::{debug, info, warn};

use sicoop_core::{
    defaults, CollectionProvider, Error, ListQuery, Page, PageRequest, Record, RecordId,
    RemoteCollection, Result,
};

use crate::config::SupabaseConfig;

/// Error body returned by PostgREST.
#[derive(Debug, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// Map a non-success HTTP status to an error.
///
/// Authorization failures get a generic permission message; the store's
/// own message is kept for everything else.
pub fn error_for_status(status: StatusCode, body: &str) -> Error {
    let parsed: Option<PostgrestError> = serde_json::from_str(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|e| e.message.clone().or_else(|| e.details.clone()))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status.to_string()
            } else {
                body.trim().to_string()
            }
        });
    // Row-level security violations come back as 400/403 with code 42501.
    let rls_denied = parsed
        .as_ref()
        .and_then(|e| e.code.as_deref())
        .map(|code| code == "42501")
        .unwrap_or(false);

    match status {
        StatusCode::UNAUTHORIZED => Error::Unauthorized("Sessão expirada ou inválida".into()),
        StatusCode::FORBIDDEN => Error::Forbidden("Permissão negada".into()),
        _ if rls_denied => Error::Forbidden("Permissão negada".into()),
        StatusCode::NOT_FOUND => Error::NotFound(message),
        _ => Error::Remote(message),
    }
}

/// Total row count from a `Content-Range` value such as `0-9/23` or `*/0`.
pub fn parse_content_range(value: &str) -> Option<u64> {
    let (_, total) = value.trim().rsplit_once('/')?;
    if total == "*" {
        return None;
    }
    total.parse().ok()
}

fn total_from_headers(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_content_range)
}

/// Quote a filter value so PostgREST reserved characters survive.
fn quote_value(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Query-string pairs for a list call.
pub fn query_params(query: &ListQuery, search_columns: &[&str]) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    for (column, value) in &query.equals {
        params.push((column.clone(), format!("eq.{}", value)));
    }
    if let Some(term) = query.search.as_deref() {
        if !search_columns.is_empty() {
            let pattern = quote_value(&format!("*{}*", term));
            let clauses: Vec<String> = search_columns
                .iter()
                .map(|column| format!("{}.ilike.{}", column, pattern))
                .collect();
            params.push(("or".to_string(), format!("({})", clauses.join(","))));
        }
    }
    if let Some(order) = &query.order {
        let direction = if order.ascending { "asc" } else { "desc" };
        params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
    }
    params
}

/// Authenticated PostgREST client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
    config: Arc<SupabaseConfig>,
}

impl RestClient {
    pub fn new(config: SupabaseConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "db",
            component = "rest",
            url = %config.url,
            timeout_secs = config.timeout_secs,
            "Initializing PostgREST client"
        );

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(SupabaseConfig::from_env())
    }

    pub fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    fn table_url(&self, collection: &str) -> String {
        format!("{}{}/{}", self.config.base_url(), defaults::REST_PATH, collection)
    }

    fn rpc_url(&self, function: &str) -> String {
        format!("{}{}/{}", self.config.base_url(), defaults::RPC_PATH, function)
    }

    /// Build a request with the `apikey` and bearer headers.
    fn build_request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.bearer_token()),
            )
    }

    /// Send and turn non-success statuses into errors.
    async fn execute(&self, op: &str, target: &str, request: RequestBuilder) -> Result<Response> {
        let started = Instant::now();
        let response = request.send().await?;
        let status = response.status();
        let duration_ms = started.elapsed().as_millis() as u64;

        if status.is_success() {
            debug!(
                subsystem = "db",
                component = "rest",
                op,
                collection = target,
                status_code = status.as_u16(),
                duration_ms,
                "Request completed"
            );
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = error_for_status(status, &body);
        warn!(
            subsystem = "db",
            component = "rest",
            op,
            collection = target,
            status_code = status.as_u16(),
            duration_ms,
            error = %error,
            "Request failed"
        );
        Err(error)
    }

    /// `GET /rest/v1/{collection}` with filters, ordering and search.
    pub async fn select<T: DeserializeOwned>(
        &self,
        collection: &str,
        query: &ListQuery,
        search_columns: &[&str],
    ) -> Result<Vec<T>> {
        let request = self
            .build_request(Method::GET, &self.table_url(collection))
            .query(&query_params(query, search_columns));
        let response = self.execute("list", collection, request).await?;
        Ok(response.json().await?)
    }

    /// One page of rows plus the exact total.
    pub async fn select_page<T: DeserializeOwned>(
        &self,
        collection: &str,
        query: &ListQuery,
        search_columns: &[&str],
        page: PageRequest,
    ) -> Result<Page<T>> {
        let request = self
            .build_request(Method::GET, &self.table_url(collection))
            .query(&query_params(query, search_columns))
            .header("Range-Unit", "items")
            .header("Range", format!("{}-{}", page.offset(), page.last_index()))
            .header("Prefer", "count=exact");

        let started = Instant::now();
        let response = request.send().await?;
        let status = response.status();

        // Past the last row PostgREST answers 416 with `*/total`.
        if status == StatusCode::RANGE_NOT_SATISFIABLE {
            let total = total_from_headers(response.headers()).unwrap_or(0);
            debug!(
                subsystem = "db",
                component = "rest",
                op = "list_page",
                collection,
                page = page.page,
                total,
                "Requested page is past the end"
            );
            return Ok(Page::new(Vec::new(), total, page));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, &body));
        }

        let header_total = total_from_headers(response.headers());
        let items: Vec<T> = response.json().await?;
        let total = header_total.unwrap_or(page.offset() + items.len() as u64);
        debug!(
            subsystem = "db",
            component = "rest",
            op = "list_page",
            collection,
            page = page.page,
            result_count = items.len(),
            total,
            duration_ms = started.elapsed().as_millis() as u64,
            "Page fetched"
        );
        Ok(Page::new(items, total, page))
    }

    /// `POST /rest/v1/{collection}`.
    pub async fn insert<T: Serialize + ?Sized>(&self, collection: &str, body: &T) -> Result<()> {
        let request = self
            .build_request(Method::POST, &self.table_url(collection))
            .header("Prefer", "return=minimal")
            .json(body);
        self.execute("create", collection, request).await?;
        Ok(())
    }

    /// `PATCH /rest/v1/{collection}?id=eq.{id}`; a selector matching no row
    /// is reported as `NotFound`.
    pub async fn patch<T: Serialize + ?Sized>(
        &self,
        collection: &str,
        id: &RecordId,
        body: &T,
    ) -> Result<()> {
        let request = self
            .build_request(Method::PATCH, &self.table_url(collection))
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(body);
        let response = self.execute("update", collection, request).await?;
        ensure_affected(collection, id, response).await
    }

    /// `DELETE /rest/v1/{collection}?id=eq.{id}`.
    pub async fn delete(&self, collection: &str, id: &RecordId) -> Result<()> {
        let request = self
            .build_request(Method::DELETE, &self.table_url(collection))
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation");
        let response = self.execute("delete", collection, request).await?;
        ensure_affected(collection, id, response).await
    }

    /// `POST /rest/v1/rpc/{function}` with named arguments.
    pub async fn rpc(&self, function: &str, args: &JsonValue) -> Result<JsonValue> {
        let request = self
            .build_request(Method::POST, &self.rpc_url(function))
            .json(args);
        let response = self.execute("rpc", function, request).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(JsonValue::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

async fn ensure_affected(collection: &str, id: &RecordId, response: Response) -> Result<()> {
    let rows: Vec<JsonValue> = response.json().await?;
    if rows.is_empty() {
        return Err(Error::NotFound(format!("{} {}", collection, id)));
    }
    Ok(())
}

fn single_field(column: &str, value: JsonValue) -> JsonValue {
    let mut body = Map::new();
    body.insert(column.to_string(), value);
    JsonValue::Object(body)
}

impl CollectionProvider for RestClient {
    fn collection<R: Record>(&self) -> Arc<dyn RemoteCollection<R>> {
        Arc::new(RestCollection::<R>::new(self.clone()))
    }
}

/// One Supabase table seen through [`RemoteCollection`].
pub struct RestCollection<R> {
    client: RestClient,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> RestCollection<R> {
    pub fn new(client: RestClient) -> Self {
        Self {
            client,
            _record: PhantomData,
        }
    }
}

#[async_trait]
impl<R: Record> RemoteCollection<R> for RestCollection<R> {
    async fn list(&self, query: &ListQuery) -> Result<Vec<R>> {
        self.client
            .select(R::COLLECTION, query, R::SEARCH_COLUMNS)
            .await
    }

    async fn list_page(&self, query: &ListQuery, page: PageRequest) -> Result<Page<R>> {
        self.client
            .select_page(R::COLLECTION, query, R::SEARCH_COLUMNS, page)
            .await
    }

    async fn create(&self, draft: &R::Draft) -> Result<()> {
        self.client.insert(R::COLLECTION, draft).await
    }

    async fn update(&self, id: &RecordId, draft: &R::Draft) -> Result<()> {
        self.client.patch(R::COLLECTION, id, draft).await
    }

    async fn delete(&self, id: &RecordId) -> Result<()> {
        self.client.delete(R::COLLECTION, id).await
    }

    async fn set_status(&self, id: &RecordId, status: R::Status) -> Result<()> {
        match R::STATUS_PROCEDURE {
            Some(procedure) => {
                let mut args = Map::new();
                args.insert(procedure.id_arg.to_string(), json!(id));
                args.insert(procedure.value_arg.to_string(), R::status_value(status));
                self.client
                    .rpc(procedure.function, &JsonValue::Object(args))
                    .await?;
                Ok(())
            }
            None => {
                let body = single_field(R::STATUS_FIELD, R::status_value(status));
                self.client.patch(R::COLLECTION, id, &body).await
            }
        }
    }

    async fn assign(&self, id: &RecordId, assignee: Option<RecordId>) -> Result<()> {
        let field = R::ASSIGNEE_FIELD.ok_or_else(|| {
            Error::InvalidInput(format!("{} rows cannot be assigned", R::COLLECTION))
        })?;
        let body = single_field(field, json!(assignee));
        self.client.patch(R::COLLECTION, id, &body).await
    }
}
