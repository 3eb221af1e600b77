use axum::{routing::on, Router};
use geoconsulta::database::Database;

pub mod establishments;

use crate::{
    common::{route_not_found, METHOD_FILTER_ALL},
    WebState,
};

pub fn routes<D: Database>(state: WebState<D>) -> Router {
    Router::new()
        .nest_service("/establishments", establishments::routes(state))
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}
