use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorInternalServerError, ErrorUnauthorized},
    web, Error, HttpMessage,
};
use std::{
    future::{ready, Future, Ready},
    pin::Pin,
    rc::Rc,
    sync::Arc,
};
use tracing::warn;
use uuid::Uuid;

use crate::db::{service::DbService, DbPool, User};
use crate::identity::IdentityProvider;

/// Bearer-token authentication for the `/api` surface. Verifies the token
/// with the identity provider, resolves (or auto-provisions) the local user
/// row, and attaches the user to the request extensions.
pub struct BearerAuth;

impl<S, B> Transform<S, ServiceRequest> for BearerAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = BearerAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BearerAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct BearerAuthMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for BearerAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();

        // Only the /api surface requires a user; the websocket gateway does
        // its own handshake authentication.
        if req.method() == actix_web::http::Method::OPTIONS || !req.path().starts_with("/api") {
            return Box::pin(async move { srv.call(req).await });
        }

        let identity = match req.app_data::<web::Data<Arc<dyn IdentityProvider>>>() {
            Some(identity) => identity.get_ref().clone(),
            None => {
                warn!("IdentityProvider missing in app_data");
                return Box::pin(async move {
                    Err(ErrorInternalServerError("Configuration error"))
                });
            }
        };
        let pool = match req.app_data::<web::Data<DbPool>>() {
            Some(pool) => pool.get_ref().clone(),
            None => {
                warn!("DbPool missing in app_data");
                return Box::pin(async move {
                    Err(ErrorInternalServerError("Configuration error"))
                });
            }
        };

        let token = extract_token(&req);

        Box::pin(async move {
            let token = token
                .ok_or_else(|| ErrorUnauthorized("Access denied. No token provided."))?;

            let subject = identity.verify_credential(&token).await.map_err(|e| {
                warn!("Token verification failed: {}", e);
                ErrorUnauthorized("Invalid or expired token")
            })?;

            let user = resolve_user(&pool, identity.as_ref(), &subject)
                .await
                .map_err(|e| {
                    warn!("User resolution failed for subject {}: {}", subject, e);
                    ErrorUnauthorized("User not found. Please register first.")
                })?;

            req.extensions_mut().insert(user);
            srv.call(req).await
        })
    }
}

fn extract_token(req: &ServiceRequest) -> Option<String> {
    if let Some(header_value) = req.headers().get("Authorization") {
        if let Ok(auth_str) = header_value.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
        return None;
    }

    // Fallback to a query param for clients that cannot set headers
    let params = qstring::QString::from(req.query_string());
    params.get("token").map(str::to_string)
}

/// Find the local user for an authenticated subject, creating the row from
/// the provider's profile on first sight.
async fn resolve_user(
    pool: &DbPool,
    identity: &dyn IdentityProvider,
    subject: &str,
) -> Result<User, Box<dyn std::error::Error>> {
    {
        let conn = pool.lock().unwrap();
        if let Some(user) = DbService::find_user_by_subject(&conn, subject)? {
            return Ok(user);
        }
    }

    let profile = identity.lookup_subject(subject).await?;
    let username = profile
        .email
        .as_deref()
        .and_then(|email| email.split('@').next())
        .map(str::to_string)
        .unwrap_or_else(|| format!("user-{}", &Uuid::new_v4().to_string()[..8]));

    let conn = pool.lock().unwrap();
    let user = DbService::create_user(
        &conn,
        subject,
        &username,
        profile.display_name.as_deref(),
        profile.avatar_url.as_deref(),
    )?;
    Ok(user)
}
