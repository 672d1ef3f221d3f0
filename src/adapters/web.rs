use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{HttpResponse, Responder, get, post, web};
use askama::Template;
use chrono::Duration;
use serde::Deserialize;

use crate::adapters::auth::{CurrentSession, removal_cookie, session_cookie};
use crate::adapters::html::{DashboardPage, ErrorPage, LoginPage};
use crate::app::dashboard::load_dashboard;
use crate::app::services::{
    AuthSessionHandler, BookingCommandHandler, ServiceError, SqliteDashboardService,
};
use crate::domain::clock::Clock;
use crate::domain::dashboard_view::ViewSettings;

#[derive(Debug, Clone)]
pub struct WebSettings {
    pub view: ViewSettings,
    pub session_ttl_minutes: i64,
    pub cookie_secure: bool,
}

#[derive(Clone)]
pub struct WebState {
    pub service: SqliteDashboardService,
    pub clock: Arc<dyn Clock + Send + Sync>,
    pub settings: WebSettings,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CancelBookingForm {
    pub booking_id: i64,
    pub csrf_token: String,
}

#[derive(Debug, Deserialize)]
pub struct LogoutForm {
    pub csrf_token: String,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(index)
        .service(dashboard)
        .service(cancel_booking_endpoint)
        .service(login_form)
        .service(login_submit)
        .service(logout);
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[get("/")]
async fn index(state: web::Data<WebState>) -> impl Responder {
    see_other(state.settings.view.url("/dashboard"))
}

#[get("/dashboard")]
async fn dashboard(state: web::Data<WebState>, session: CurrentSession) -> HttpResponse {
    let CurrentSession(session) = session;
    let now = state.clock.now();

    match load_dashboard(&state.service, &session, now, &state.settings.view) {
        Ok(view) => render_html(StatusCode::OK, &DashboardPage { view: &view }),
        Err(ServiceError::UnknownUser { user_id }) => {
            tracing::warn!(user_id, "session refers to a missing user; signing out");
            if let Err(error) = state.service.logout(&session.id) {
                tracing::error!(error = %error, "failed to drop orphaned session");
            }
            let mut response = see_other(state.settings.view.url("/login"));
            if let Err(error) = response.add_cookie(&removal_cookie()) {
                tracing::warn!(error = %error, "failed to attach removal cookie");
            }
            response
        }
        Err(error) => service_error_response(&state, error),
    }
}

#[post("/bookings/cancel")]
async fn cancel_booking_endpoint(
    state: web::Data<WebState>,
    session: CurrentSession,
    form: web::Form<CancelBookingForm>,
) -> HttpResponse {
    let CurrentSession(session) = session;

    if !session.verify_csrf(&form.csrf_token) {
        tracing::warn!(
            user_id = session.user_id,
            booking_id = form.booking_id,
            "cancellation rejected: csrf token mismatch"
        );
        return authorization_error_response(
            &state,
            "Your form has expired. Reload the dashboard and try again.",
        );
    }

    let result = state.service.cancel_booking(
        session.user_id,
        form.booking_id,
        state.clock.now(),
        state.settings.view.status_rule,
    );

    match result {
        Ok(()) => {
            tracing::info!(
                user_id = session.user_id,
                booking_id = form.booking_id,
                "booking cancelled"
            );
            see_other(state.settings.view.url("/dashboard"))
        }
        Err(error @ ServiceError::BookingNotFound { .. }) => {
            tracing::warn!(user_id = session.user_id, error = %error, "cancellation rejected");
            authorization_error_response(
                &state,
                "This booking does not exist or does not belong to your account.",
            )
        }
        Err(error @ ServiceError::BookingNotCancellable { .. }) => {
            tracing::warn!(user_id = session.user_id, error = %error, "cancellation rejected");
            authorization_error_response(&state, "Only upcoming bookings can be cancelled.")
        }
        Err(error) => service_error_response(&state, error),
    }
}

#[get("/login")]
async fn login_form(state: web::Data<WebState>) -> HttpResponse {
    let action_url = state.settings.view.url("/login");
    render_html(
        StatusCode::OK,
        &LoginPage {
            action_url: &action_url,
            email: "",
            error: None,
        },
    )
}

#[post("/login")]
async fn login_submit(state: web::Data<WebState>, form: web::Form<LoginForm>) -> HttpResponse {
    let now = state.clock.now();
    let ttl = Duration::minutes(state.settings.session_ttl_minutes);

    match state.service.login(&form.email, &form.password, now, ttl) {
        Ok(Some(session)) => {
            tracing::info!(user_id = session.user_id, "user signed in");
            let cookie = session_cookie(
                &session,
                state.settings.session_ttl_minutes,
                state.settings.cookie_secure,
            );
            HttpResponse::SeeOther()
                .insert_header((header::LOCATION, state.settings.view.url("/dashboard")))
                .cookie(cookie)
                .finish()
        }
        Ok(None) => {
            tracing::warn!("sign-in rejected: invalid credentials");
            let action_url = state.settings.view.url("/login");
            render_html(
                StatusCode::UNAUTHORIZED,
                &LoginPage {
                    action_url: &action_url,
                    email: form.email.trim(),
                    error: Some("Invalid email or password."),
                },
            )
        }
        Err(error) => service_error_response(&state, error),
    }
}

#[post("/logout")]
async fn logout(
    state: web::Data<WebState>,
    session: CurrentSession,
    form: web::Form<LogoutForm>,
) -> HttpResponse {
    let CurrentSession(session) = session;

    if !session.verify_csrf(&form.csrf_token) {
        tracing::warn!(user_id = session.user_id, "sign-out rejected: csrf token mismatch");
        return authorization_error_response(
            &state,
            "Your form has expired. Reload the dashboard and try again.",
        );
    }

    if let Err(error) = state.service.logout(&session.id) {
        return service_error_response(&state, error);
    }

    tracing::info!(user_id = session.user_id, "user signed out");
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, state.settings.view.url("/login")))
        .cookie(removal_cookie())
        .finish()
}

fn see_other(location: String) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

fn render_html<T: Template>(status: StatusCode, template: &T) -> HttpResponse {
    match template.render() {
        Ok(body) => HttpResponse::build(status)
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(error) => {
            tracing::error!(error = %error, "template rendering failed");
            HttpResponse::InternalServerError()
                .content_type("text/plain; charset=utf-8")
                .body("internal server error")
        }
    }
}

fn authorization_error_response(state: &WebState, message: &str) -> HttpResponse {
    let back_url = state.settings.view.url("/dashboard");
    render_html(
        StatusCode::FORBIDDEN,
        &ErrorPage {
            title: "Authorization error",
            message,
            back_url: &back_url,
        },
    )
}

fn service_error_response(state: &WebState, error: ServiceError) -> HttpResponse {
    tracing::error!(error = %error, "request failed");
    let back_url = state.settings.view.url("/dashboard");
    render_html(
        StatusCode::INTERNAL_SERVER_ERROR,
        &ErrorPage {
            title: "Something went wrong",
            message: "We could not load your data. Please try again in a moment.",
            back_url: &back_url,
        },
    )
}
