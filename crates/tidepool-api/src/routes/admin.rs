//! Catalog management routes.
//!
//! Every route requires an `X-Principal` header; creations are stamped with it.

use axum::Json;
use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use tidepool_catalog::{
    AddSharedTable, CreateInternalTable, CreateMetastore, CreateProvider, CreateSchema,
    CreateShare, CreateStorage,
};
use tidepool_core::model::{InternalTable, Metastore, Provider, Schema, Share, SharedTable, Storage};
use tidepool_core::observability::catalog_span;
use tracing::Instrument;

use crate::context::AdminPrincipal;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Management route group.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/storages", post(create_storage))
        .route("/admin/storages/:name", get(get_storage))
        .route("/admin/metastores", post(create_metastore))
        .route("/admin/metastores/:name", get(get_metastore))
        .route("/admin/providers", post(create_provider))
        .route("/admin/providers/:name", get(get_provider))
        .route("/admin/providers/:provider/tables", post(create_table))
        .route("/admin/providers/:provider/tables/:table", get(get_table))
        .route("/admin/shares", post(create_share))
        .route("/admin/shares/:share/schemas", post(create_schema))
        .route(
            "/admin/shares/:share/schemas/:schema/tables",
            post(add_shared_table),
        )
}

type Created<T> = (StatusCode, Json<T>);

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

/// `POST /admin/storages`
pub(crate) async fn create_storage(
    State(state): State<AppState>,
    AdminPrincipal(principal): AdminPrincipal,
    payload: Result<Json<CreateStorage>, JsonRejection>,
) -> ApiResult<Created<Storage>> {
    let request = body(payload)?;
    let span = catalog_span("create", "storage", &request.name);
    let storage = state
        .catalog
        .storages
        .create_storage(request, &principal)
        .instrument(span)
        .await?;
    Ok((StatusCode::CREATED, Json(storage)))
}

/// `GET /admin/storages/{name}`
pub(crate) async fn get_storage(
    State(state): State<AppState>,
    AdminPrincipal(_): AdminPrincipal,
    Path(name): Path<String>,
) -> ApiResult<Json<Storage>> {
    state
        .catalog
        .storages
        .get_storage(&name)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("storage {name} not found")))
}

/// `POST /admin/metastores`
pub(crate) async fn create_metastore(
    State(state): State<AppState>,
    AdminPrincipal(principal): AdminPrincipal,
    payload: Result<Json<CreateMetastore>, JsonRejection>,
) -> ApiResult<Created<Metastore>> {
    let request = body(payload)?;
    let span = catalog_span("create", "metastore", &request.name);
    let metastore = state
        .catalog
        .metastores
        .create_metastore(request, &principal)
        .instrument(span)
        .await?;
    Ok((StatusCode::CREATED, Json(metastore)))
}

/// `GET /admin/metastores/{name}`
pub(crate) async fn get_metastore(
    State(state): State<AppState>,
    AdminPrincipal(_): AdminPrincipal,
    Path(name): Path<String>,
) -> ApiResult<Json<Metastore>> {
    state
        .catalog
        .metastores
        .get_metastore(&name)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("metastore {name} not found")))
}

/// `POST /admin/providers`
pub(crate) async fn create_provider(
    State(state): State<AppState>,
    AdminPrincipal(principal): AdminPrincipal,
    payload: Result<Json<CreateProvider>, JsonRejection>,
) -> ApiResult<Created<Provider>> {
    let request = body(payload)?;
    let span = catalog_span("create", "provider", &request.name);
    let provider = state
        .catalog
        .providers
        .create_provider(request, &principal)
        .instrument(span)
        .await?;
    Ok((StatusCode::CREATED, Json(provider)))
}

/// `GET /admin/providers/{name}`
pub(crate) async fn get_provider(
    State(state): State<AppState>,
    AdminPrincipal(_): AdminPrincipal,
    Path(name): Path<String>,
) -> ApiResult<Json<Provider>> {
    state
        .catalog
        .providers
        .get_provider(&name)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("provider {name} not found")))
}

/// `POST /admin/providers/{provider}/tables`
pub(crate) async fn create_table(
    State(state): State<AppState>,
    AdminPrincipal(principal): AdminPrincipal,
    Path(provider): Path<String>,
    payload: Result<Json<CreateInternalTable>, JsonRejection>,
) -> ApiResult<Created<InternalTable>> {
    let request = body(payload)?;
    let span = catalog_span("create", "table", &request.name);
    let table = state
        .catalog
        .tables
        .create_internal_table(&provider, request, &principal)
        .instrument(span)
        .await?;
    Ok((StatusCode::CREATED, Json(table)))
}

/// `GET /admin/providers/{provider}/tables/{table}`
pub(crate) async fn get_table(
    State(state): State<AppState>,
    AdminPrincipal(_): AdminPrincipal,
    Path((provider, table)): Path<(String, String)>,
) -> ApiResult<Json<InternalTable>> {
    state
        .catalog
        .tables
        .get_internal_table(&provider, &table)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("table {provider}.{table} not found")))
}

/// `POST /admin/shares`
pub(crate) async fn create_share(
    State(state): State<AppState>,
    AdminPrincipal(principal): AdminPrincipal,
    payload: Result<Json<CreateShare>, JsonRejection>,
) -> ApiResult<Created<Share>> {
    let request = body(payload)?;
    let span = catalog_span("create", "share", &request.name);
    let share = state
        .catalog
        .shares
        .create_share(request, &principal)
        .instrument(span)
        .await?;
    Ok((StatusCode::CREATED, Json(share)))
}

/// `POST /admin/shares/{share}/schemas`
pub(crate) async fn create_schema(
    State(state): State<AppState>,
    AdminPrincipal(principal): AdminPrincipal,
    Path(share): Path<String>,
    payload: Result<Json<CreateSchema>, JsonRejection>,
) -> ApiResult<Created<Schema>> {
    let request = body(payload)?;
    let span = catalog_span("create", "schema", &request.name);
    let schema = state
        .catalog
        .shares
        .create_schema(&share, request, &principal)
        .instrument(span)
        .await?;
    Ok((StatusCode::CREATED, Json(schema)))
}

/// `POST /admin/shares/{share}/schemas/{schema}/tables`
pub(crate) async fn add_shared_table(
    State(state): State<AppState>,
    AdminPrincipal(principal): AdminPrincipal,
    Path((share, schema)): Path<(String, String)>,
    payload: Result<Json<AddSharedTable>, JsonRejection>,
) -> ApiResult<Created<SharedTable>> {
    let request = body(payload)?;
    let span = catalog_span("create", "shared table", &request.name);
    let table = state
        .catalog
        .shares
        .add_table_to_schema(&share, &schema, request, &principal)
        .instrument(span)
        .await?;
    Ok((StatusCode::CREATED, Json(table)))
}
