use chrono::{DateTime, Utc};

use crate::app::services::{DashboardQueryHandler, ServiceError};
use crate::domain::auth_session::AuthSession;
use crate::domain::charging_stats::{QuickStats, month_start};
use crate::domain::dashboard_view::{
    DashboardSnapshot, DashboardView, ViewSettings, build_dashboard_view,
};

/// Reads everything the dashboard shows for the session's user and builds the
/// view model.
///
/// Statistics are optional: a failed or empty aggregate renders as zeros.
/// The booking lookup is not, since an empty table would be misleading.
pub fn load_dashboard<Q>(
    queries: &Q,
    session: &AuthSession,
    now: DateTime<Utc>,
    settings: &ViewSettings,
) -> Result<DashboardView, ServiceError>
where
    Q: DashboardQueryHandler,
{
    let user = queries
        .get_user(session.user_id)?
        .ok_or(ServiceError::UnknownUser {
            user_id: session.user_id,
        })?;

    let stats = queries
        .get_user_charging_stats(user.id, month_start(now, settings.display_offset))
        .unwrap_or_else(|error| {
            tracing::error!(user_id = user.id, error = %error, "failed to load charging stats");
            None
        });

    let quick_stats = queries
        .get_user_quick_stats(user.id)
        .unwrap_or_else(|error| {
            tracing::error!(user_id = user.id, error = %error, "failed to load quick stats");
            QuickStats::default()
        });

    let bookings = queries.list_user_bookings(user.id)?;

    tracing::debug!(
        user_id = user.id,
        has_stats = stats.is_some(),
        bookings = bookings.len(),
        "dashboard data loaded"
    );

    Ok(build_dashboard_view(
        &DashboardSnapshot {
            user: &user,
            stats,
            quick_stats,
            bookings: &bookings,
            now,
            csrf_token: &session.csrf_token,
        },
        settings,
    ))
}
