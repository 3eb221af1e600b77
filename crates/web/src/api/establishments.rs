use axum::{
    extract::{rejection::QueryRejection, OriginalUri, Path, Query, State},
    http::Method,
    routing::{get, on},
    Json, Router,
};
use geoconsulta::{database::Database, RequestError};
use model::{
    establishment::Establishment,
    filter::{EstablishmentFilter, RawEstablishmentQuery},
    stats::EstablishmentStats,
    WithId,
};
use serde::Serialize;
use utility::{id::Id, let_also::LetAlso};

use crate::{
    common::{route_not_found, RouteErrorResponse, RouteResult, METHOD_FILTER_ALL},
    WebState,
};

pub(crate) fn routes<D: Database>(state: WebState<D>) -> Router {
    Router::new()
        .route("/", get(get_establishments::<D>))
        .route("/types", get(get_types::<D>))
        .route("/stats", get(get_stats::<D>))
        .route("/:id", get(get_establishment::<D>))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

#[derive(Debug, Serialize)]
pub struct EstablishmentsResponse {
    pub establishments: Vec<WithId<Establishment>>,
    pub count: usize,
    /// The filters that were applied, after defaults and normalisation.
    pub filters: EstablishmentFilter,
}

#[derive(Debug, Serialize)]
pub struct TypesResponse {
    pub types: Vec<String>,
    pub count: usize,
}

async fn get_establishments<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    State(WebState {
        client,
        development,
    }): State<WebState<D>>,
    query: Result<Query<RawEstablishmentQuery>, QueryRejection>,
) -> RouteResult<Json<EstablishmentsResponse>> {
    let error_response = |why: RequestError| {
        RouteErrorResponse::from(why)
            .with_method(&Method::GET)
            .with_uri(original_uri.path())
            .details_if(development)
    };

    let Query(raw) = query.map_err(|why| {
        RouteErrorResponse::bad_request(why.body_text())
            .with_method(&Method::GET)
            .with_uri(original_uri.path())
    })?;
    let filter = EstablishmentFilter::try_from(raw)
        .map_err(|why| error_response(RequestError::InvalidInput(why)))?;

    client
        .find_establishments(&filter)
        .await
        .map_err(error_response)?
        .let_owned(|establishments| {
            Ok(Json(EstablishmentsResponse {
                count: establishments.len(),
                establishments,
                filters: filter,
            }))
        })
}

async fn get_establishment<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<String>,
    State(WebState {
        client,
        development,
    }): State<WebState<D>>,
) -> RouteResult<Json<WithId<Establishment>>> {
    let error_response = |why: RequestError| {
        RouteErrorResponse::from(why)
            .with_method(&Method::GET)
            .with_uri(original_uri.path())
            .details_if(development)
    };

    // ids that are no integers can't exist
    let id = id
        .parse::<i32>()
        .map(Id::new)
        .map_err(|_| error_response(RequestError::NotFound))?;

    client
        .get_establishment(id)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn get_types<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    State(WebState {
        client,
        development,
    }): State<WebState<D>>,
) -> RouteResult<Json<TypesResponse>> {
    client
        .get_types()
        .await
        .map(|types| {
            Json(TypesResponse {
                count: types.len(),
                types,
            })
        })
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::GET)
                .with_uri(original_uri.path())
                .details_if(development)
        })
}

async fn get_stats<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    State(WebState {
        client,
        development,
    }): State<WebState<D>>,
) -> RouteResult<Json<EstablishmentStats>> {
    client.get_stats().await.map(Json).map_err(|why| {
        RouteErrorResponse::from(why)
            .with_method(&Method::GET)
            .with_uri(original_uri.path())
            .details_if(development)
    })
}
