//! Daily reminder sweep: paid bookings whose event is exactly two weeks out
//! get one reminder email. Send failures leave the flag unset so the next
//! sweep retries.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, NaiveDate, Utc};

use crate::db::queries;
use crate::services::notifications;
use crate::state::AppState;

pub const REMINDER_LEAD_DAYS: u64 = 14;

const SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

pub fn reminder_target_date(today: NaiveDate) -> NaiveDate {
    today
        .checked_add_days(Days::new(REMINDER_LEAD_DAYS))
        .unwrap_or(today)
}

pub async fn run_reminder_loop(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(SWEEP_INTERVAL);
    loop {
        interval.tick().await;
        match sweep(&state).await {
            Ok(0) => {}
            Ok(sent) => tracing::info!(sent, "reminder sweep complete"),
            Err(e) => tracing::error!(error = %e, "reminder sweep failed"),
        }
    }
}

/// One pass over today's candidates. Returns how many reminders went out.
pub async fn sweep(state: &AppState) -> anyhow::Result<usize> {
    let target = reminder_target_date(Utc::now().date_naive());
    let candidates = {
        let db = state.db.lock().unwrap();
        queries::find_reminder_candidates(&db, &target)?
    };

    let mut sent = 0;
    for booking in candidates {
        match notifications::send_reminder(state, &booking).await {
            Ok(()) => {
                let db = state.db.lock().unwrap();
                queries::set_reminder_sent(&db, &booking.id)?;
                sent += 1;
            }
            Err(e) => {
                tracing::warn!(booking_id = %booking.id, error = %e, "reminder email failed");
            }
        }
    }
    Ok(sent)
}
