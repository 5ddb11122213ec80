use crate::cycle::{partner_notification, PartnerNotification, Urgency};
use crate::errors::AppError;
use crate::state::AppState;
use crate::storage::persist_data;
use serde::Serialize;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

const APP_NAME: &str = "MoodSync";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub urgency: Urgency,
}

impl From<&PartnerNotification> for Notification {
    fn from(note: &PartnerNotification) -> Self {
        Self {
            title: format!("{APP_NAME} · {}", note.phase_name),
            body: note.message.to_string(),
            urgency: note.urgency,
        }
    }
}

/// Delivers notifications to whatever surface the host provides.
pub trait Notifier: Send + Sync {
    fn dispatch(&self, notification: &Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn dispatch(&self, notification: &Notification) {
        match notification.urgency {
            Urgency::High => warn!(title = %notification.title, "{}", notification.body),
            _ => info!(title = %notification.title, urgency = ?notification.urgency, "{}", notification.body),
        }
    }
}

/// Builds the partner notification for today and dispatches it.
pub async fn notify_now(state: &AppState) -> Result<Option<Notification>, AppError> {
    let data = state.data.lock().await;
    let Some(user) = data.user.as_ref() else {
        return Ok(None);
    };

    let snapshot = state.predictor().snapshot(&user.cycle);
    let notification = Notification::from(&partner_notification(&snapshot));
    state.notifier.dispatch(&notification);
    Ok(Some(notification))
}

/// Sends the partner notification at most once per calendar day.
pub async fn check_and_notify(state: &AppState) -> Result<Option<Notification>, AppError> {
    let today = state.clock.today();
    let mut data = state.data.lock().await;

    if !data.settings.notifications || data.last_notified == Some(today) {
        return Ok(None);
    }
    let Some(user) = data.user.as_ref() else {
        return Ok(None);
    };

    let snapshot = state.predictor().snapshot(&user.cycle);
    let notification = Notification::from(&partner_notification(&snapshot));
    state.notifier.dispatch(&notification);

    data.last_notified = Some(today);
    persist_data(&state.data_path, &data).await?;
    Ok(Some(notification))
}

pub async fn run_daily_check(state: AppState, every: Duration) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        if let Err(err) = check_and_notify(&state).await {
            error!("daily notification check failed: {}", err.message);
        }
    }
}
