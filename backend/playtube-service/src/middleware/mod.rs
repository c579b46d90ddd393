/// HTTP middleware for playtube-service
///
/// Session tokens arrive in the HTTP-only `token` cookie set at sign-in, or
/// as an `Authorization: Bearer` header for API clients.
use crate::error::AppError;
use crate::services::auth::SESSION_COOKIE;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use crypto_core::jwt;
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use uuid::Uuid;

// =====================================================================
// JWT Authentication
// =====================================================================

/// Extracted user identifier stored in request extensions after auth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub Uuid);

/// Like `UserId`, but anonymous requests are allowed through
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Option<Uuid>);

/// Validates the session token and stores `UserId` in request extensions.
///
/// In `required` mode requests without a valid token are rejected with 401;
/// in `optional` mode they continue anonymously.
#[derive(Debug, Clone, Copy)]
pub struct JwtAuthMiddleware {
    required: bool,
}

impl JwtAuthMiddleware {
    pub fn required() -> Self {
        Self { required: true }
    }

    pub fn optional() -> Self {
        Self { required: false }
    }
}

/// Session token from the cookie, falling back to the Bearer header
pub fn session_token(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn authenticate(token: &str) -> Result<Uuid, AppError> {
    let claims = jwt::validate_session_token(token)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;
    claims
        .user_id()
        .map_err(|_| AppError::Unauthorized("Invalid user ID".to_string()))
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
            required: self.required,
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
    required: bool,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let required = self.required;

        Box::pin(async move {
            match session_token(req.request()) {
                Some(token) => match authenticate(&token) {
                    Ok(user_id) => {
                        req.extensions_mut().insert(UserId(user_id));
                    }
                    Err(e) if required => return Err(e.into()),
                    Err(_) => {
                        tracing::debug!("ignoring invalid session token on optional route");
                    }
                },
                None if required => {
                    return Err(AppError::Unauthorized("Authentication required".to_string()).into())
                }
                None => {}
            }

            service.call(req).await
        })
    }
}

impl FromRequest for UserId {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<UserId>()
                .copied()
                .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()).into()),
        )
    }
}

impl FromRequest for MaybeUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(Ok(MaybeUser(req.extensions().get::<UserId>().map(|u| u.0))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::cookie::Cookie;
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App, HttpResponse};

    async fn whoami(user: UserId) -> HttpResponse {
        HttpResponse::Ok().body(user.0.to_string())
    }

    async fn maybe(user: MaybeUser) -> HttpResponse {
        HttpResponse::Ok().body(user.0.map(|u| u.to_string()).unwrap_or_default())
    }

    #[actix_web::test]
    async fn required_mode_rejects_anonymous() {
        jwt::test_keys::install();
        let app = test::init_service(
            App::new()
                .wrap(JwtAuthMiddleware::required())
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get().uri("/me").to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn cookie_and_bearer_tokens_are_accepted() {
        jwt::test_keys::install();
        let user_id = Uuid::new_v4();
        let token = jwt::issue_session_token(user_id).unwrap();
        let app = test::init_service(
            App::new()
                .wrap(JwtAuthMiddleware::required())
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/me")
            .cookie(Cookie::new(SESSION_COOKIE, token.clone()))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, user_id.to_string().as_bytes());

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, user_id.to_string().as_bytes());
    }

    #[actix_web::test]
    async fn optional_mode_lets_anonymous_through() {
        jwt::test_keys::install();
        let app = test::init_service(
            App::new()
                .wrap(JwtAuthMiddleware::optional())
                .route("/maybe", web::get().to(maybe))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/maybe")
            .insert_header(("Authorization", "Bearer garbage"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/me").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
