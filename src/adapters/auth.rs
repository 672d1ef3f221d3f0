use std::fmt;
use std::future::{Ready, ready};

use actix_web::cookie::{Cookie, SameSite, time};
use actix_web::dev::Payload;
use actix_web::http::{StatusCode, header};
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError, web};

use crate::adapters::web::WebState;
use crate::app::services::AuthSessionHandler;
use crate::domain::auth_session::AuthSession;

pub const SESSION_COOKIE: &str = "ev_session";

/// Session of the authenticated caller.
///
/// Extracting it is the auth guard: handlers that take a `CurrentSession`
/// never run for anonymous or expired sessions.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub AuthSession);

#[derive(Debug)]
pub enum AuthRejection {
    Unauthenticated { login_url: String },
    Unavailable,
}

impl fmt::Display for AuthRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated { .. } => write!(f, "authentication required"),
            Self::Unavailable => write!(f, "session store unavailable"),
        }
    }
}

impl ResponseError for AuthRejection {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated { .. } => StatusCode::SEE_OTHER,
            Self::Unavailable => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Self::Unauthenticated { login_url } => HttpResponse::SeeOther()
                .insert_header((header::LOCATION, login_url.as_str()))
                .cookie(removal_cookie())
                .finish(),
            Self::Unavailable => HttpResponse::InternalServerError()
                .content_type("text/plain; charset=utf-8")
                .body("internal server error"),
        }
    }
}

impl FromRequest for CurrentSession {
    type Error = AuthRejection;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<CurrentSession, AuthRejection> {
    let Some(state) = req.app_data::<web::Data<WebState>>() else {
        tracing::error!("web state is not registered; cannot authenticate request");
        return Err(AuthRejection::Unavailable);
    };

    let unauthenticated = || AuthRejection::Unauthenticated {
        login_url: state.settings.view.url("/login"),
    };

    let Some(cookie) = req.cookie(SESSION_COOKIE) else {
        tracing::debug!(path = %req.path(), "request without session cookie");
        return Err(unauthenticated());
    };

    match state
        .service
        .find_active_session(cookie.value(), state.clock.now())
    {
        Ok(Some(session)) => Ok(CurrentSession(session)),
        Ok(None) => {
            tracing::debug!(path = %req.path(), "unknown or expired session");
            Err(unauthenticated())
        }
        Err(error) => {
            tracing::error!(error = %error, "session lookup failed");
            Err(AuthRejection::Unavailable)
        }
    }
}

pub fn session_cookie(session: &AuthSession, ttl_minutes: i64, secure: bool) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, session.id.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::minutes(ttl_minutes))
        .finish()
}

pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
}
