//! HTTP resource client for PostgREST-style collections.
//!
//! Transport lives in [`RestResource`]; every rule about status codes and body
//! shapes lives in the `decode_*` functions, which work on a [`RawResponse`] so
//! they can be exercised without a server.

use std::marker::PhantomData;

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Client, Method, Request, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

const PREFER_REPRESENTATION: &str = "return=representation";

#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-2xx answer from the server.
    #[error("HTTP Error {status}: {status_text}.{}", server_message(.body))]
    Status {
        status: u16,
        status_text: String,
        body: Option<String>,
    },
    #[error("{method} {url} failed: {source}")]
    Transport {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    /// A write asked for its representation but none came back.
    #[error("expected one created row but the server returned none")]
    EmptyRepresentation,
    #[error("expected a JSON array but the server returned {0}")]
    UnexpectedShape(&'static str),
    #[error("local store error: {0}")]
    Storage(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn storage(err: anyhow::Error) -> Self {
        ApiError::Storage(format!("{:#}", err))
    }
}

fn server_message(body: &Option<String>) -> String {
    match body {
        Some(body) => format!(" Server Message: {}", body),
        None => String::new(),
    }
}

/// Status line and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new<B: Into<Vec<u8>>>(status: u16, body: B) -> Self {
        let status_text = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or_default()
            .to_string();
        Self {
            status,
            status_text,
            body: body.into(),
        }
    }

    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn has_no_content(&self) -> bool {
        self.status == 204 || self.body.iter().all(|b| b.is_ascii_whitespace())
    }

    fn json(&self, url: &str) -> Result<Value, ApiError> {
        serde_json::from_slice(&self.body).map_err(|source| ApiError::Json {
            context: format!("invalid JSON body from {}", url),
            source,
        })
    }
}

/// Turn a non-2xx response into [`ApiError::Status`], keeping the server's
/// JSON error body when it parses.
pub fn check_status(response: &RawResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    let body = serde_json::from_slice::<Value>(&response.body)
        .ok()
        .map(|value| value.to_string());
    Err(ApiError::Status {
        status: response.status,
        status_text: response.status_text.clone(),
        body,
    })
}

pub fn decode_list<T: DeserializeOwned>(
    response: &RawResponse,
    url: &str,
) -> Result<Vec<T>, ApiError> {
    check_status(response)?;
    if response.has_no_content() {
        return Ok(Vec::new());
    }
    let value = response.json(url)?;
    if !value.is_array() {
        warn!(url, "list endpoint returned data that is not an array");
        return Ok(Vec::new());
    }
    from_value(value, url)
}

pub fn decode_created<T: DeserializeOwned>(
    response: &RawResponse,
    url: &str,
) -> Result<T, ApiError> {
    check_status(response)?;
    if response.has_no_content() {
        return Err(ApiError::EmptyRepresentation);
    }
    let Value::Array(mut rows) = response.json(url)? else {
        return Err(ApiError::UnexpectedShape("a non-array value"));
    };
    if rows.is_empty() {
        return Err(ApiError::EmptyRepresentation);
    }
    if rows.len() > 1 {
        warn!(
            url,
            count = rows.len(),
            "expected one created row but got more; using the first one"
        );
    }
    from_value(rows.swap_remove(0), url)
}

pub fn decode_updated<T: DeserializeOwned>(
    response: &RawResponse,
    url: &str,
) -> Result<Option<T>, ApiError> {
    check_status(response)?;
    if response.has_no_content() {
        return Ok(None);
    }
    match response.json(url)? {
        Value::Array(mut rows) => {
            if rows.is_empty() {
                Ok(None)
            } else {
                from_value(rows.swap_remove(0), url).map(Some)
            }
        }
        other => from_value(other, url).map(Some),
    }
}

fn from_value<T: DeserializeOwned>(value: Value, url: &str) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|source| ApiError::Json {
        context: format!("unexpected row shape from {}", url),
        source,
    })
}

/// Client for one REST collection, e.g. `http://localhost:3000/todos`.
#[derive(Debug, Clone)]
pub struct RestResource<T> {
    client: Client,
    url: String,
    token: Option<String>,
    _row: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> RestResource<T> {
    pub fn new(client: Client, base_url: &str, collection: &str) -> Self {
        Self {
            client,
            url: format!("{}/{}", base_url.trim_end_matches('/'), collection),
            token: None,
            _row: PhantomData,
        }
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn list(&self) -> Result<Vec<T>, ApiError> {
        self.list_with(&[]).await
    }

    /// List with raw PostgREST query parameters such as `("select", "*,categories(*)")`.
    pub async fn list_with(&self, query: &[(&str, &str)]) -> Result<Vec<T>, ApiError> {
        let request = self.list_request(query)?;
        let url = request.url().to_string();
        let response = self.execute("list", request).await?;
        decode_list(&response, &url).inspect_err(|err| log_failure("list", &url, err))
    }

    pub async fn create<P>(&self, payload: &P) -> Result<T, ApiError>
    where
        P: Serialize + ?Sized,
    {
        let request = self.create_request(payload)?;
        let response = self.execute("create", request).await?;
        decode_created(&response, &self.url)
            .inspect_err(|err| log_failure("create", &self.url, err))
    }

    pub async fn update<P>(&self, id: i64, patch: &P) -> Result<Option<T>, ApiError>
    where
        P: Serialize + ?Sized,
    {
        let request = self.update_request(id, patch)?;
        let url = request.url().to_string();
        let response = self.execute("update", request).await?;
        decode_updated(&response, &url).inspect_err(|err| log_failure("update", &url, err))
    }

    pub async fn remove(&self, id: i64) -> Result<(), ApiError> {
        self.remove_where("id", id).await
    }

    /// Delete every row whose `column` equals `value`.
    pub async fn remove_where(&self, column: &str, value: i64) -> Result<(), ApiError> {
        let request = self.remove_where_request(column, value)?;
        let url = request.url().to_string();
        let response = self.execute("delete", request).await?;
        check_status(&response).inspect_err(|err| log_failure("delete", &url, err))
    }

    pub async fn remove_all(&self) -> Result<(), ApiError> {
        let request = self.remove_all_request()?;
        let response = self.execute("delete all", request).await?;
        check_status(&response).inspect_err(|err| log_failure("delete all", &self.url, err))
    }

    fn row_url(&self, column: &str, value: i64) -> String {
        format!("{}?{}=eq.{}", self.url, column, value)
    }

    fn list_request(&self, query: &[(&str, &str)]) -> Result<Request, ApiError> {
        self.build(Method::GET, &with_query(&self.url, query), None, false)
    }

    fn create_request<P: Serialize + ?Sized>(&self, payload: &P) -> Result<Request, ApiError> {
        let body = encode(payload, &self.url)?;
        self.build(Method::POST, &self.url, Some(body), true)
    }

    // Asks for the row back too, so a commit can adopt the server's copy.
    fn update_request<P>(&self, id: i64, patch: &P) -> Result<Request, ApiError>
    where
        P: Serialize + ?Sized,
    {
        let url = self.row_url("id", id);
        let body = encode(patch, &url)?;
        self.build(Method::PATCH, &url, Some(body), true)
    }

    fn remove_where_request(&self, column: &str, value: i64) -> Result<Request, ApiError> {
        self.build(Method::DELETE, &self.row_url(column, value), None, false)
    }

    fn remove_all_request(&self) -> Result<Request, ApiError> {
        self.build(Method::DELETE, &self.url, None, false)
    }

    fn build(
        &self,
        method: Method,
        url: &str,
        body: Option<Vec<u8>>,
        want_representation: bool,
    ) -> Result<Request, ApiError> {
        let mut request: RequestBuilder = self.client.request(method.clone(), url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(body);
        }
        if want_representation {
            request = request.header("Prefer", PREFER_REPRESENTATION);
        }
        request.build().map_err(|source| {
            let err = ApiError::Transport {
                method,
                url: url.to_string(),
                source,
            };
            log_failure("build request", url, &err);
            err
        })
    }

    /// Run one request; transport failures are logged here with the URL.
    async fn execute(&self, operation: &str, request: Request) -> Result<RawResponse, ApiError> {
        let method = request.method().clone();
        let url = request.url().to_string();
        debug!(method = %method, url = %url, "sending request");

        let transport = |source| ApiError::Transport {
            method: method.clone(),
            url: url.clone(),
            source,
        };
        let exchange = async {
            let response = self.client.execute(request).await.map_err(transport)?;
            let status = response.status();
            let body = response.bytes().await.map_err(transport)?;
            Ok::<_, ApiError>((status, body))
        };
        let (status, body) = exchange
            .await
            .inspect_err(|err| log_failure(operation, &url, err))?;
        debug!(method = %method, url = %url, status = status.as_u16(), "received response");

        Ok(RawResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body: body.to_vec(),
        })
    }
}

fn with_query(url: &str, query: &[(&str, &str)]) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    let pairs: Vec<String> = query.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    format!("{}?{}", url, pairs.join("&"))
}

fn encode<P: Serialize + ?Sized>(payload: &P, url: &str) -> Result<Vec<u8>, ApiError> {
    serde_json::to_vec(payload).map_err(|source| ApiError::Json {
        context: format!("failed to encode request body for {}", url),
        source,
    })
}

fn log_failure(operation: &str, url: &str, err: &ApiError) {
    error!(operation, url, error = %err, "request failed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, NewTask, Task, TaskPatch};
    use pretty_assertions::assert_eq;
    use reqwest::header::AUTHORIZATION;
    use rstest::rstest;
    use serde_json::json;

    const URL: &str = "http://localhost:3000/todos";

    fn task_json(id: i64, title: &str) -> String {
        format!(
            r#"{{"id":{},"title":"{}","due_date":null,"done":false}}"#,
            id, title
        )
    }

    #[test]
    fn list_returns_rows() {
        let body = format!("[{},{}]", task_json(1, "a"), task_json(2, "b"));
        let tasks: Vec<Task> = decode_list(&RawResponse::new(200, body), URL).unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].title, "b");
    }

    #[test]
    fn list_on_no_content_is_empty() {
        let tasks: Vec<Task> = decode_list(&RawResponse::new(204, ""), URL).unwrap();
        assert!(tasks.is_empty());
    }

    #[test]
    fn list_with_non_array_body_is_empty() {
        let body = task_json(1, "lonely");
        let tasks: Vec<Task> = decode_list(&RawResponse::new(200, body), URL).unwrap();
        assert!(tasks.is_empty());
    }

    #[test]
    fn create_returns_the_single_row() {
        let body = format!("[{}]", task_json(9, "created"));
        let task: Task = decode_created(&RawResponse::new(201, body), URL).unwrap();
        assert_eq!(task.id, 9);
    }

    #[test]
    fn create_with_several_rows_uses_the_first() {
        let body = format!("[{},{}]", task_json(4, "first"), task_json(5, "second"));
        let task: Task = decode_created(&RawResponse::new(201, body), URL).unwrap();
        assert_eq!(task.title, "first");
    }

    #[rstest]
    #[case(201, "[]")]
    #[case(204, "")]
    fn create_without_rows_is_an_error(#[case] status: u16, #[case] body: &str) {
        let err = decode_created::<Task>(&RawResponse::new(status, body), URL).unwrap_err();
        assert!(matches!(err, ApiError::EmptyRepresentation));
    }

    #[test]
    fn create_with_object_body_is_a_shape_error() {
        let err =
            decode_created::<Task>(&RawResponse::new(201, task_json(1, "x")), URL).unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedShape(_)));
    }

    #[test]
    fn update_no_content_is_none() {
        let updated: Option<Task> = decode_updated(&RawResponse::new(204, ""), URL).unwrap();
        assert!(updated.is_none());
    }

    #[test]
    fn update_representation_is_returned() {
        let body = r##"[{"id":2,"title":"Work","color":"#0000ff"}]"##;
        let updated: Option<Category> = decode_updated(&RawResponse::new(200, body), URL).unwrap();
        assert_eq!(updated.map(|c| c.color), Some("#0000ff".to_string()));
    }

    #[rstest]
    #[case(400)]
    #[case(401)]
    #[case(404)]
    #[case(409)]
    #[case(500)]
    #[case(503)]
    fn every_operation_reports_the_status_code(#[case] status: u16) {
        let response = RawResponse::new(status, r#"{"message":"nope"}"#);
        let needle = status.to_string();

        let errors = [
            decode_list::<Task>(&response, URL).unwrap_err(),
            decode_created::<Task>(&response, URL).unwrap_err(),
            decode_updated::<Task>(&response, URL).unwrap_err(),
            check_status(&response).unwrap_err(),
        ];
        for err in errors {
            assert_eq!(err.status(), Some(status));
            assert!(err.to_string().contains(&needle), "{}", err);
        }
    }

    #[test]
    fn status_error_carries_server_message() {
        let response = RawResponse::new(409, r#"{"code":"23503","message":"fk"}"#);
        let err = check_status(&response).unwrap_err();
        let text = err.to_string();
        assert!(text.starts_with("HTTP Error 409: Conflict."));
        assert!(text.contains("Server Message:"));
        assert!(text.contains("23503"));
    }

    #[test]
    fn status_error_without_json_body_omits_message() {
        let response = RawResponse::new(502, "<html>bad gateway</html>");
        let err = check_status(&response).unwrap_err();
        assert_eq!(err.to_string(), "HTTP Error 502: Bad Gateway.");
    }

    #[test]
    fn resource_urls_follow_postgrest_conventions() {
        let resource: RestResource<Task> =
            RestResource::new(Client::new(), "http://localhost:3000/", "todos");
        assert_eq!(resource.url(), URL);
        assert_eq!(resource.row_url("id", 7), "http://localhost:3000/todos?id=eq.7");
        assert_eq!(
            with_query(resource.url(), &[("select", "*,categories(*)"), ("order", "id.asc")]),
            "http://localhost:3000/todos?select=*,categories(*)&order=id.asc"
        );
    }

    fn todos(token: Option<&str>) -> RestResource<Task> {
        RestResource::new(Client::new(), "http://localhost:3000", "todos")
            .with_token(token.map(str::to_string))
    }

    fn header<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
        request.headers().get(name).and_then(|value| value.to_str().ok())
    }

    fn body_json(request: &Request) -> Value {
        let bytes = request.body().and_then(|body| body.as_bytes()).unwrap();
        serde_json::from_slice(bytes).unwrap()
    }

    #[test]
    fn create_request_asks_for_the_representation() {
        let task = NewTask {
            title: "Buy milk".into(),
            due_date: Some("2024-03-12".into()),
            done: false,
        };
        let request = todos(None).create_request(&task).unwrap();

        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.url().as_str(), URL);
        assert_eq!(header(&request, "Prefer"), Some("return=representation"));
        assert_eq!(header(&request, CONTENT_TYPE.as_str()), Some("application/json"));
        assert_eq!(header(&request, AUTHORIZATION.as_str()), None);
        assert_eq!(
            body_json(&request),
            json!({"title": "Buy milk", "due_date": "2024-03-12", "done": false})
        );
    }

    #[test]
    fn update_request_targets_one_row_and_sends_only_set_fields() {
        let request = todos(None).update_request(7, &TaskPatch::done(true)).unwrap();

        assert_eq!(request.method(), &Method::PATCH);
        assert_eq!(request.url().as_str(), "http://localhost:3000/todos?id=eq.7");
        assert_eq!(header(&request, "Prefer"), Some("return=representation"));
        assert_eq!(header(&request, CONTENT_TYPE.as_str()), Some("application/json"));
        assert_eq!(body_json(&request), json!({"done": true}));
    }

    #[test]
    fn delete_requests_filter_by_column_unless_deleting_all() {
        let resource = todos(None);

        let by_id = resource.remove_where_request("id", 7).unwrap();
        assert_eq!(by_id.method(), &Method::DELETE);
        assert_eq!(by_id.url().as_str(), "http://localhost:3000/todos?id=eq.7");
        assert!(by_id.body().is_none());
        assert_eq!(header(&by_id, "Prefer"), None);

        let by_link = resource.remove_where_request("todo_id", 3).unwrap();
        assert_eq!(by_link.url().as_str(), "http://localhost:3000/todos?todo_id=eq.3");

        let all = resource.remove_all_request().unwrap();
        assert_eq!(all.method(), &Method::DELETE);
        assert_eq!(all.url().as_str(), URL);
        assert_eq!(all.url().query(), None);
    }

    #[test]
    fn list_request_carries_embedding_and_order() {
        let request = todos(None)
            .list_request(&[("select", "*,categories(*)"), ("order", "id.asc")])
            .unwrap();
        assert_eq!(request.method(), &Method::GET);
        assert_eq!(
            request.url().query(),
            Some("select=*,categories(*)&order=id.asc")
        );
        assert_eq!(header(&request, "Prefer"), None);
    }

    #[test]
    fn token_is_sent_as_bearer_on_every_request() {
        let resource = todos(Some("secret"));
        let task = NewTask {
            title: "x".into(),
            due_date: None,
            done: false,
        };
        let requests = [
            resource.list_request(&[]).unwrap(),
            resource.create_request(&task).unwrap(),
            resource.update_request(1, &TaskPatch::title("y")).unwrap(),
            resource.remove_where_request("id", 1).unwrap(),
            resource.remove_all_request().unwrap(),
        ];
        for request in &requests {
            assert_eq!(header(request, AUTHORIZATION.as_str()), Some("Bearer secret"));
        }
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error_naming_the_request() {
        let resource: RestResource<Task> =
            RestResource::new(Client::new(), "http://127.0.0.1:9", "todos");
        let err = resource.remove(4).await.unwrap_err();
        match err {
            ApiError::Transport { method, url, .. } => {
                assert_eq!(method, Method::DELETE);
                assert_eq!(url, "http://127.0.0.1:9/todos?id=eq.4");
            }
            other => panic!("expected transport error, got {:?}", other),
        }
    }
}
