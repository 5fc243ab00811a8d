//! Delta Sharing recipient routes.

use axum::Json;
use axum::Router;
use axum::extract::{Extension, Path, Query, State};
use axum::http::header::{CONTENT_TYPE, HeaderName};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tidepool_core::model::{Metadata, Protocol, Schema, Share, SharedTable, TableFile};
use tidepool_core::observability::sharing_span;
use tidepool_core::pagination::ContentAndToken;
use tidepool_sharing::QueryRequest;
use tracing::Instrument;

use crate::context::RequestContext;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Response header carrying the resolved table version.
pub const DELTA_TABLE_VERSION_HEADER: &str = "delta-table-version";

const NDJSON: &str = "application/x-ndjson; charset=utf-8";

/// Sharing route group.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/shares", get(list_shares))
        .route("/shares/:share", get(get_share))
        .route("/shares/:share/schemas", get(list_schemas))
        .route("/shares/:share/schemas/:schema/tables", get(list_tables))
        .route("/shares/:share/all-tables", get(list_all_tables))
        .route(
            "/shares/:share/schemas/:schema/tables/:table/version",
            get(get_table_version),
        )
        .route(
            "/shares/:share/schemas/:schema/tables/:table/metadata",
            get(get_table_metadata),
        )
        .route(
            "/shares/:share/schemas/:schema/tables/:table/query",
            post(query_table),
        )
        .route(
            "/shares/:share/schemas/:schema/tables/:table/changes",
            get(table_changes),
        )
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct ListQuery {
    max_results: Option<i64>,
    page_token: Option<String>,
}

impl ListQuery {
    fn max_results(&self) -> ApiResult<Option<usize>> {
        self.max_results
            .map(|n| {
                usize::try_from(n).map_err(|_| {
                    ApiError::bad_request(format!("maxResults must be non-negative, got {n}"))
                })
            })
            .transpose()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct TimestampQuery {
    starting_timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListResponse<T> {
    items: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_page_token: Option<String>,
}

impl<T> ListResponse<T> {
    fn from_page<U>(page: ContentAndToken<U>, f: impl FnMut(U) -> T) -> Self {
        let page = page.map(f);
        Self {
            items: page.content,
            next_page_token: page.token.map(|token| token.encode()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ShareItem {
    name: String,
    id: String,
}

impl From<Share> for ShareItem {
    fn from(share: Share) -> Self {
        Self {
            name: share.name,
            id: share.id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct GetShareResponse {
    share: ShareItem,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SchemaItem {
    name: String,
    share: String,
}

impl From<Schema> for SchemaItem {
    fn from(schema: Schema) -> Self {
        Self {
            name: schema.name,
            share: schema.share,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TableItem {
    name: String,
    schema: String,
    share: String,
}

impl From<SharedTable> for TableItem {
    fn from(table: SharedTable) -> Self {
        Self {
            name: table.name,
            schema: table.schema,
            share: table.share,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProtocolLine {
    min_reader_version: i32,
}

/// One line of an NDJSON table response.
#[derive(Debug, Serialize)]
enum Line<'a> {
    #[serde(rename = "protocol")]
    Protocol(ProtocolLine),
    #[serde(rename = "metaData")]
    MetaData(&'a Metadata),
    #[serde(rename = "file")]
    File(&'a TableFile),
}

fn ndjson_response(
    version: i64,
    protocol: Protocol,
    metadata: &Metadata,
    files: &[TableFile],
) -> ApiResult<Response> {
    let mut body = String::new();
    let lines = [
        Line::Protocol(ProtocolLine {
            min_reader_version: protocol.effective_min_reader_version(),
        }),
        Line::MetaData(metadata),
    ]
    .into_iter()
    .chain(files.iter().map(Line::File));
    for line in lines {
        let json = serde_json::to_string(&line).map_err(|e| ApiError::Internal {
            message: format!("failed to encode response line: {e}"),
        })?;
        body.push_str(&json);
        body.push('\n');
    }
    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, HeaderValue::from_static(NDJSON)),
            (version_header(), HeaderValue::from(version)),
        ],
        body,
    )
        .into_response())
}

fn version_header() -> HeaderName {
    HeaderName::from_static(DELTA_TABLE_VERSION_HEADER)
}

fn table_not_found(share: &str, schema: &str, table: &str) -> ApiError {
    ApiError::not_found(format!("table {share}.{schema}.{table} not found"))
}

/// `GET /shares`
pub(crate) async fn list_shares(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ListResponse<ShareItem>>> {
    tracing::debug!(request_id = %ctx.request_id, page_token = ?query.page_token, "list shares");
    let page = state
        .sharing
        .list_shares(query.page_token.as_deref(), query.max_results()?)
        .await?;
    Ok(Json(ListResponse::from_page(page, ShareItem::from)))
}

/// `GET /shares/{share}`
pub(crate) async fn get_share(
    State(state): State<AppState>,
    Path(share): Path<String>,
) -> ApiResult<Json<GetShareResponse>> {
    let found = state
        .sharing
        .get_share(&share)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("share {share} not found")))?;
    Ok(Json(GetShareResponse {
        share: found.into(),
    }))
}

/// `GET /shares/{share}/schemas`
pub(crate) async fn list_schemas(
    State(state): State<AppState>,
    Path(share): Path<String>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ListResponse<SchemaItem>>> {
    let page = state
        .sharing
        .list_schemas(&share, query.page_token.as_deref(), query.max_results()?)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("share {share} not found")))?;
    Ok(Json(ListResponse::from_page(page, SchemaItem::from)))
}

/// `GET /shares/{share}/schemas/{schema}/tables`
pub(crate) async fn list_tables(
    State(state): State<AppState>,
    Path((share, schema)): Path<(String, String)>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ListResponse<TableItem>>> {
    let page = state
        .sharing
        .list_tables(
            &share,
            &schema,
            query.page_token.as_deref(),
            query.max_results()?,
        )
        .await?
        .ok_or_else(|| ApiError::not_found(format!("schema {share}.{schema} not found")))?;
    Ok(Json(ListResponse::from_page(page, TableItem::from)))
}

/// `GET /shares/{share}/all-tables`
pub(crate) async fn list_all_tables(
    State(state): State<AppState>,
    Path(share): Path<String>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ListResponse<TableItem>>> {
    let page = state
        .sharing
        .list_tables_of_share(&share, query.page_token.as_deref(), query.max_results()?)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("share {share} not found")))?;
    Ok(Json(ListResponse::from_page(page, TableItem::from)))
}

/// `GET /shares/{share}/schemas/{schema}/tables/{table}/version`
pub(crate) async fn get_table_version(
    State(state): State<AppState>,
    Path((share, schema, table)): Path<(String, String, String)>,
    Query(query): Query<TimestampQuery>,
) -> ApiResult<Response> {
    let version = state
        .sharing
        .get_table_version(&share, &schema, &table, query.starting_timestamp.as_deref())
        .instrument(sharing_span("get_table_version", &share, &schema, &table))
        .await?
        .ok_or_else(|| table_not_found(&share, &schema, &table))?;
    Ok((
        StatusCode::OK,
        [(version_header(), HeaderValue::from(version))],
    )
        .into_response())
}

/// `GET /shares/{share}/schemas/{schema}/tables/{table}/metadata`
pub(crate) async fn get_table_metadata(
    State(state): State<AppState>,
    Path((share, schema, table)): Path<(String, String, String)>,
    Query(query): Query<TimestampQuery>,
) -> ApiResult<Response> {
    let found = state
        .sharing
        .get_table_metadata(&share, &schema, &table, query.starting_timestamp.as_deref())
        .instrument(sharing_span("get_table_metadata", &share, &schema, &table))
        .await?
        .ok_or_else(|| table_not_found(&share, &schema, &table))?;
    ndjson_response(found.version, found.protocol, &found.metadata, &[])
}

/// `POST /shares/{share}/schemas/{schema}/tables/{table}/query`
///
/// An empty body reads the current version.
pub(crate) async fn query_table(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((share, schema, table)): Path<(String, String, String)>,
    body: Bytes,
) -> ApiResult<Response> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        QueryRequest::current()
    } else {
        serde_json::from_slice::<QueryRequest>(&body)
            .map_err(|e| ApiError::bad_request(format!("invalid query request: {e}")))?
    };
    tracing::debug!(request_id = %ctx.request_id, "query table");
    let result = state
        .sharing
        .query_table(&share, &schema, &table, &request)
        .instrument(sharing_span("query_table", &share, &schema, &table))
        .await?
        .ok_or_else(|| table_not_found(&share, &schema, &table))?;
    ndjson_response(
        result.version,
        result.protocol,
        &result.metadata,
        &result.files,
    )
}

/// `GET /shares/{share}/schemas/{schema}/tables/{table}/changes`
pub(crate) async fn table_changes() -> ApiError {
    ApiError::NotImplemented {
        message: "table changes are not supported".to_string(),
    }
}
