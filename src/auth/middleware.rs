use actix_session::SessionExt;
use actix_web::{
    Error, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::{Method, header},
    middleware::Next,
    web,
};

use crate::errors::ApiErrorResponse;
use crate::state::AppState;

/// Reject requests without an authenticated session with a 401 JSON body.
pub async fn require_auth(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let session = req.get_session();
    let has_user = session.get::<i64>("user_id").unwrap_or(None).is_some();

    if !has_user {
        let response = HttpResponse::Unauthorized().json(ApiErrorResponse {
            error: "Authentication required".to_string(),
            details: None,
        });
        return Ok(req.into_response(response).map_into_right_body());
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

/// CSRF protection for mutation endpoints.
///
/// Rejects POST/PUT/PATCH/DELETE requests that don't have
/// Content-Type: application/json. A cross-site form POST cannot set that
/// header without a CORS preflight, which the `cors` middleware only
/// allows for configured origins.
pub async fn require_json_content_type(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let method = req.method().clone();

    if method == Method::POST
        || method == Method::PUT
        || method == Method::PATCH
        || method == Method::DELETE
    {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !content_type.starts_with("application/json") {
            let response = HttpResponse::UnsupportedMediaType().json(ApiErrorResponse {
                error: "Content-Type must be application/json for mutation requests".to_string(),
                details: None,
            });
            return Ok(req.into_response(response).map_into_right_body());
        }
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

const ALLOWED_METHODS: &str = "GET, POST, PUT, PATCH, DELETE, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type, Authorization, X-Requested-With";

/// CORS for the configured origins. Preflight `OPTIONS` requests are
/// answered here; other requests get the allow headers appended.
pub async fn cors(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let allowed = match (&origin, req.app_data::<web::Data<AppState>>()) {
        (Some(o), Some(state)) => state.config.server.allows_origin(o),
        _ => false,
    };

    if req.method() == Method::OPTIONS && origin.is_some() {
        let response = if allowed {
            let mut builder = HttpResponse::NoContent();
            if let Some(o) = &origin {
                builder.insert_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, o.as_str()));
            }
            builder
                .insert_header((header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS))
                .insert_header((header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOWED_HEADERS))
                .insert_header((header::ACCESS_CONTROL_ALLOW_CREDENTIALS, "true"))
                .insert_header((header::ACCESS_CONTROL_MAX_AGE, "600"))
                .insert_header((header::VARY, "Origin"))
                .finish()
        } else {
            HttpResponse::Forbidden().finish()
        };
        return Ok(req.into_response(response).map_into_right_body());
    }

    let mut res = next.call(req).await?;
    if let (true, Some(o)) = (allowed, origin) {
        if let Ok(value) = header::HeaderValue::from_str(&o) {
            let headers = res.headers_mut();
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                header::HeaderValue::from_static("true"),
            );
            headers.insert(header::VARY, header::HeaderValue::from_static("Origin"));
        }
    }
    Ok(res.map_into_left_body())
}
