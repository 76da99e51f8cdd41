use chrono::{Duration as ChronoDuration, NaiveTime, Utc};
use log::{info, warn};
use std::sync::Arc;
use tokio::time::sleep;

use crate::config::NotifyConfig;
use crate::notify::SlackNotifier;
use crate::passes::{PassQuery, PassStore};

/// Spawns the daily schedule digest task if one is configured.
///
/// The digest wakes once a day at the configured UTC wall-clock time and
/// posts every pass starting within the following 24 hours. An unparsable
/// time disables the digest rather than failing startup.
pub fn spawn_daily_digest(store: Arc<PassStore>, notifier: SlackNotifier, config: &NotifyConfig) {
    let raw = match &config.daily_digest_utc {
        Some(raw) => raw.clone(),
        None => return,
    };
    if !notifier.is_enabled() {
        warn!("Daily digest configured without a Slack webhook, not scheduling");
        return;
    }
    let send_at = match NaiveTime::parse_from_str(&raw, "%H:%M") {
        Ok(t) => t,
        Err(e) => {
            warn!("Invalid daily digest time {:?}: {}. Digest not scheduled.", raw, e);
            return;
        }
    };

    info!("Daily schedule digest scheduled for {} UTC", send_at.format("%H:%M"));
    tokio::spawn(async move {
        loop {
            sleep(until_next(send_at)).await;
            send_digest(&store, &notifier).await;
        }
    });
}

async fn send_digest(store: &PassStore, notifier: &SlackNotifier) {
    let now = Utc::now();
    let query = PassQuery {
        spacecraft: None,
        from: Some(now),
        to: Some(now + ChronoDuration::hours(24)),
    };
    match store.query(&query) {
        Ok(schedule) => {
            info!("Sending daily digest with {} passes", schedule.len());
            notifier.send_schedule(&schedule).await;
        }
        Err(e) => warn!("Failed to assemble daily digest: {}", e),
    }
}

/// Time until the next occurrence of `send_at`, today or tomorrow.
fn until_next(send_at: NaiveTime) -> std::time::Duration {
    let now = Utc::now();
    let today = now.date_naive().and_time(send_at).and_utc();
    let next = if today > now {
        today
    } else {
        today + ChronoDuration::days(1)
    };
    (next - now).to_std().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_occurrence_is_within_a_day() {
        let send_at = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let wait = until_next(send_at);
        assert!(wait <= std::time::Duration::from_secs(24 * 60 * 60));
    }

    #[test]
    fn digest_times_parse_as_hours_and_minutes() {
        assert!(NaiveTime::parse_from_str("09:00", "%H:%M").is_ok());
        assert!(NaiveTime::parse_from_str("23:59", "%H:%M").is_ok());
        assert!(NaiveTime::parse_from_str("9 am", "%H:%M").is_err());
        assert!(NaiveTime::parse_from_str("25:00", "%H:%M").is_err());
    }
}
