use axum::{
    extract::{OriginalUri, Request},
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::MethodFilter,
    Json,
};
use geoconsulta::RequestError;
use serde::Serialize;

pub type RouteResult<O> = Result<O, RouteErrorResponse>;

/// A `MethodFilter` that matches all http methods.
pub(crate) const METHOD_FILTER_ALL: MethodFilter = MethodFilter::GET
    .or(MethodFilter::POST)
    .or(MethodFilter::PATCH)
    .or(MethodFilter::PUT)
    .or(MethodFilter::DELETE);

// - Services returning commonly used responses -

pub(crate) async fn route_not_found(
    OriginalUri(original_uri): OriginalUri,
    req: Request,
) -> impl IntoResponse {
    RouteErrorResponse::not_found(req.method(), original_uri.path())
}

// - Commonly used responeses -

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteErrorResponse {
    #[serde(skip)]
    pub status_code: StatusCode,

    pub error: String,

    pub http_method: Option<String>,

    pub requested_uri: Option<String>,

    pub detailed_information: Option<String>,
}

impl RouteErrorResponse {
    pub fn new(status_code: StatusCode) -> Self {
        Self {
            status_code,
            error: status_code
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_owned(),
            http_method: None,
            requested_uri: None,
            detailed_information: None,
        }
    }

    pub fn not_found(method: &Method, uri: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND)
            .with_method(method)
            .with_uri(uri)
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST).with_error(error)
    }

    pub fn with_method(mut self, method: &Method) -> Self {
        self.http_method = Some(method.to_string());
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.requested_uri = Some(uri.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = error.into();
        self
    }

    pub fn with_detailed_information(mut self, message: impl Into<String>) -> Self {
        self.detailed_information = Some(message.into());
        self
    }

    /// Drops the detailed information unless `development` is set.
    pub fn details_if(mut self, development: bool) -> Self {
        if !development {
            self.detailed_information = None;
        }
        self
    }
}

impl From<RequestError> for RouteErrorResponse {
    fn from(value: RequestError) -> Self {
        match value {
            RequestError::NotFound => {
                Self::new(StatusCode::NOT_FOUND).with_error(value.to_string())
            }
            RequestError::InvalidInput(why) => Self::bad_request(why.to_string()),
            RequestError::Store(why) => {
                log::error!("store error: {}", why);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR)
                    .with_error("Database error")
                    .with_detailed_information(why.to_string())
            }
        }
    }
}

impl IntoResponse for RouteErrorResponse {
    fn into_response(self) -> axum::response::Response {
        (self.status_code, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use geoconsulta::database::DatabaseError;
    use model::filter::FilterError;
    use serde_json::json;

    use super::*;

    #[test]
    fn maps_request_errors_to_status_codes() {
        let not_found = RouteErrorResponse::from(RequestError::NotFound);
        assert_eq!(not_found.status_code, StatusCode::NOT_FOUND);

        let invalid = RouteErrorResponse::from(RequestError::InvalidInput(
            FilterError::InvalidRadius("far".to_owned()),
        ));
        assert_eq!(invalid.status_code, StatusCode::BAD_REQUEST);

        let store = RouteErrorResponse::from(RequestError::Store(DatabaseError::Unavailable(
            "connection refused".to_owned(),
        )));
        assert_eq!(store.status_code, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn details_are_only_kept_in_development() {
        let error = RouteErrorResponse::from(RequestError::Store(DatabaseError::Unavailable(
            "connection refused".to_owned(),
        )));

        assert_eq!(
            serde_json::to_value(error.clone().details_if(false)).unwrap(),
            json!({ "error": "Database error" })
        );
        assert_eq!(
            serde_json::to_value(error.details_if(true)).unwrap(),
            json!({
                "error": "Database error",
                "detailedInformation": "store unavailable: connection refused"
            })
        );
    }
}
