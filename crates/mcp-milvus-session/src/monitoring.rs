//! Built-in session event callbacks

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::manager::SessionManager;
use crate::state::{SessionEvent, SessionState};

/// Access events are logged once per this many accesses
pub const ACCESS_LOG_EVERY: u64 = 10;
/// Accesses a session must exceed before its rate is checked
pub const HIGH_FREQUENCY_MIN_ACCESSES: u64 = 100;
/// Accesses per minute above which a session is reported
pub const HIGH_FREQUENCY_RATE_PER_MINUTE: f64 = 10.0;

/// Register the logging and high-frequency access callbacks on `manager`
pub fn register_monitoring_callbacks(manager: &SessionManager) {
    manager.add_event_callback(log_session_event);
    manager.add_event_callback(detect_high_frequency_access);
}

/// Log every lifecycle transition; accesses only every [`ACCESS_LOG_EVERY`]th time
pub fn log_session_event(event: SessionEvent, session_id: &str, state: &SessionState) {
    match event {
        SessionEvent::Created => info!(
            event = %event,
            session_id,
            address = %state.config.address,
            database = %state.config.db_name,
            "Session created"
        ),
        SessionEvent::Removed => info!(
            event = %event,
            session_id,
            access_count = state.access_count,
            duration_secs = state.age().num_seconds(),
            "Session removed"
        ),
        SessionEvent::Accessed => {
            if state.access_count % ACCESS_LOG_EVERY == 0 {
                debug!(
                    event = %event,
                    session_id,
                    access_count = state.access_count,
                    last_access = %state.last_accessed.to_rfc3339(),
                    "Session accessed"
                );
            }
        }
        SessionEvent::Expired => warn!(
            event = %event,
            session_id,
            access_count = state.access_count,
            duration_secs = state.age().num_seconds(),
            "Session expired"
        ),
    }
}

/// Warn about sessions accessed unusually often
pub fn detect_high_frequency_access(event: SessionEvent, session_id: &str, state: &SessionState) {
    if event != SessionEvent::Accessed {
        return;
    }
    if let Some(rate) = high_frequency_rate(state, Utc::now()) {
        warn!(
            session_id,
            access_rate = rate,
            access_count = state.access_count,
            duration_secs = state.age().num_seconds(),
            "High frequency access pattern detected"
        );
    }
}

/// Accesses per minute, when both thresholds are exceeded
pub fn high_frequency_rate(state: &SessionState, now: DateTime<Utc>) -> Option<f64> {
    if state.access_count <= HIGH_FREQUENCY_MIN_ACCESSES {
        return None;
    }
    let minutes = (now - state.created_at).num_milliseconds() as f64 / 60_000.0;
    if minutes <= 0.0 {
        return None;
    }
    let rate = state.access_count as f64 / minutes;
    (rate > HIGH_FREQUENCY_RATE_PER_MINUTE).then_some(rate)
}
