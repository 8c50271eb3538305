use std::net::SocketAddr;

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use pulseboard_api::{
    wire::{
        DeleteRequest, FetchOneResponse, FetchRequest, FetchResponse, MutationRequest,
        MutationResponse, RecordResult, OPERATOR_EQUAL_TO,
    },
    Error, EntityKind, Query, Record, RecordId,
};

use crate::MockStore;

#[derive(Clone)]
pub struct HttpState {
    pub store: MockStore,
    pub api_key: String,
}

/// Failures of the request itself, as opposed to failures of single records
enum Reject {
    Unauthorized,
    Api(Error),
}

impl IntoResponse for Reject {
    fn into_response(self) -> Response {
        match self {
            Reject::Unauthorized => (StatusCode::UNAUTHORIZED, "missing or bad api key").into_response(),
            Reject::Api(err) => {
                tracing::info!("returning error to client: {err}");
                (err.status_code(), err.contents()).into_response()
            }
        }
    }
}

fn check(state: &HttpState, headers: &HeaderMap, table: &str) -> Result<EntityKind, Reject> {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|tok| tok == state.api_key)
        .unwrap_or(false);
    if !authorized {
        return Err(Reject::Unauthorized);
    }
    EntityKind::from_table(table)
        .ok_or_else(|| Reject::Api(Error::Store(format!("unknown table {table:?}"))))
}

/// Keeps only the requested fields, `Id` is always returned
fn project(record: Record, fields: &[&str]) -> Record {
    if fields.is_empty() {
        return record;
    }
    Record(
        record
            .0
            .into_iter()
            .filter(|(n, _)| n == "Id" || fields.contains(&(n as &str)))
            .collect(),
    )
}

async fn fetch(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Path(table): Path<String>,
    Json(req): Json<FetchRequest>,
) -> Result<Json<FetchResponse>, Reject> {
    let kind = check(&state, &headers, &table)?;
    let mut query = Query::all();
    for w in req.where_clauses.iter() {
        if w.operator != OPERATOR_EQUAL_TO || w.values.len() != 1 {
            return Ok(Json(FetchResponse {
                success: false,
                message: Some(format!("unsupported condition on {}", w.field_name)),
                data: None,
            }));
        }
        query = query.filter(w.field_name.clone(), w.values[0].clone());
    }
    if let Some(o) = req.order_by.first() {
        query = query.order_by(o.field_name.clone(), o.sorttype);
    }
    let fields: Vec<&str> = req.field_names().collect();
    Ok(Json(match state.store.with(|s| s.fetch_many(kind, &query)) {
        Ok(records) => FetchResponse {
            success: true,
            message: None,
            data: Some(records.into_iter().map(|r| project(r, &fields)).collect()),
        },
        Err(e) => FetchResponse {
            success: false,
            message: Some(e.to_string()),
            data: None,
        },
    }))
}

async fn fetch_one(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Path((table, id)): Path<(String, i64)>,
) -> Result<Json<FetchOneResponse>, Reject> {
    let kind = check(&state, &headers, &table)?;
    match state.store.with(|s| s.fetch_one(kind, RecordId(id))) {
        Ok(record) => Ok(Json(FetchOneResponse {
            success: true,
            message: None,
            data: Some(record),
        })),
        Err(e @ Error::NotFound { .. }) => Err(Reject::Api(e)),
        Err(e) => Ok(Json(FetchOneResponse {
            success: false,
            message: Some(e.to_string()),
            data: None,
        })),
    }
}

fn mutation_response(results: Vec<RecordResult>) -> Json<MutationResponse> {
    Json(MutationResponse {
        success: true,
        message: None,
        results: Some(results),
    })
}

async fn create(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Path(table): Path<String>,
    Json(req): Json<MutationRequest>,
) -> Result<Json<MutationResponse>, Reject> {
    let kind = check(&state, &headers, &table)?;
    let results = req
        .records
        .into_iter()
        .map(|fields| match state.store.with(|s| s.create_one(kind, fields)) {
            Ok(record) => RecordResult::ok(Some(record)),
            Err(e) => RecordResult::failed(&e),
        })
        .collect();
    Ok(mutation_response(results))
}

async fn update(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Path(table): Path<String>,
    Json(req): Json<MutationRequest>,
) -> Result<Json<MutationResponse>, Reject> {
    let kind = check(&state, &headers, &table)?;
    let results = req
        .records
        .into_iter()
        .map(|mut fields| {
            let res = fields
                .id()
                .and_then(|id| {
                    fields.remove("Id");
                    state.store.with(|s| s.update_one(kind, id, fields))
                });
            match res {
                Ok(record) => RecordResult::ok(Some(record)),
                Err(e) => RecordResult::failed(&e),
            }
        })
        .collect();
    Ok(mutation_response(results))
}

async fn delete(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Path(table): Path<String>,
    Json(req): Json<DeleteRequest>,
) -> Result<Json<MutationResponse>, Reject> {
    let kind = check(&state, &headers, &table)?;
    let results = req
        .record_ids
        .into_iter()
        .filter_map(|id| match state.store.with(|s| s.delete_one(kind, id)) {
            Ok(true) => Some(RecordResult::ok(None)),
            // Ids that matched nothing get no result entry
            Ok(false) => None,
            Err(e) => Some(RecordResult::failed(&e)),
        })
        .collect();
    Ok(mutation_response(results))
}

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/tables/:table/fetch", post(fetch))
        .route("/tables/:table/records/:id", get(fetch_one))
        .route("/tables/:table/create", post(create))
        .route("/tables/:table/update", post(update))
        .route("/tables/:table/delete", post(delete))
        .with_state(state)
}

/// Serves `store` on `addr` in the background, returning the bound address
///
/// Binding port 0 picks a free port.
pub async fn spawn(store: MockStore, api_key: String, addr: SocketAddr) -> anyhow::Result<SocketAddr> {
    let app = router(HttpState { store, api_key });
    let server = axum::Server::try_bind(&addr)
        .with_context(|| format!("binding mock server to {addr}"))?
        .serve(app.into_make_service());
    let bound = server.local_addr();
    tokio::spawn(async move {
        if let Err(err) = server.await {
            tracing::error!(?err, "mock server stopped");
        }
    });
    tracing::info!("mock server listening on {}", bound);
    Ok(bound)
}
