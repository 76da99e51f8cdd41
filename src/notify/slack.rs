use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::Serialize;

use crate::passes::TrackingPass;

/// Posts pass announcements to a Slack incoming webhook.
///
/// A notifier built without a webhook URL turns every send into a no-op, so
/// callers never branch on whether notifications are configured. Delivery
/// failures are logged and swallowed; a broken webhook must not take the
/// tracking pipeline down with it.
#[derive(Clone)]
pub struct SlackNotifier {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl SlackNotifier {
    pub fn new(webhook_url: Option<String>) -> Self {
        SlackNotifier {
            client: reqwest::Client::new(),
            webhook_url: webhook_url.filter(|url| !url.is_empty()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Announces a pass whose tracker has just been engaged.
    pub async fn send_pass_starting(&self, pass: &TrackingPass) {
        let payload = SlackPayload {
            text: "A pass is about to start! :satellite:".to_string(),
            attachments: vec![pass_attachment(pass)],
        };
        self.post(&payload).await;
    }

    /// Sends a schedule as a single message, one attachment per pass.
    pub async fn send_schedule(&self, schedule: &[TrackingPass]) {
        let payload = SlackPayload {
            text: "Here's today's tracking schedule! :satellite_antenna:".to_string(),
            attachments: schedule.iter().map(pass_attachment).collect(),
        };
        self.post(&payload).await;
    }

    async fn post(&self, payload: &SlackPayload) {
        if let Some(url) = &self.webhook_url {
            match self.client.post(url).json(payload).send().await {
                Ok(response) => {
                    if !response.status().is_success() {
                        warn!("Slack webhook returned {}", response.status());
                    }
                }
                Err(e) => warn!("Failed to reach Slack webhook: {}", e),
            }
        } else {
            debug!("Slack notifications disabled, dropping message");
        }
    }
}

#[derive(Debug, Serialize)]
struct SlackPayload {
    text: String,
    attachments: Vec<Attachment>,
}

#[derive(Debug, Serialize)]
struct Attachment {
    fields: Vec<Field>,
    author_name: String,
}

#[derive(Debug, Serialize)]
struct Field {
    title: String,
    value: String,
    short: bool,
}

fn pass_attachment(pass: &TrackingPass) -> Attachment {
    let link = calendar_link(pass.spacecraft(), pass.start_time(), pass.end_time());
    Attachment {
        fields: vec![
            Field {
                title: "start_time".to_string(),
                value: slack_date(pass.start_time(), &link),
                short: true,
            },
            Field {
                title: "end_time".to_string(),
                value: slack_date(pass.end_time(), &link),
                short: true,
            },
        ],
        author_name: pass.spacecraft().to_string(),
    }
}

/// Renders a Slack date token so each reader sees the pass in their own
/// timezone. Clicking through opens a pre-filled calendar event; clients
/// that cannot render the token fall back to the plain UTC clock time.
fn slack_date(t: DateTime<Utc>, calendar_link: &str) -> String {
    format!(
        "<!date^{}^{{date_short_pretty}} at {{time}}^{}|{} (UTC)>",
        t.timestamp(),
        calendar_link,
        t.format("%-I:%M%p")
    )
}

fn calendar_link(spacecraft: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let title = format!("{} Tracking Pass", spacecraft).replace(' ', "+");
    format!(
        "https://calendar.google.com/calendar/r/eventedit?text={}&dates={}/{}",
        title,
        start.format("%Y%m%dT%H%M%SZ"),
        end.format("%Y%m%dT%H%M%SZ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::Waypoint;
    use crate::rotor::AzEl;

    fn pass() -> TrackingPass {
        let start = DateTime::from_timestamp(1_542_004_812, 0).unwrap();
        let waypoints = vec![
            Waypoint {
                time: start,
                position: AzEl::new(10.0, 5.0),
            },
            Waypoint {
                time: start + chrono::Duration::minutes(10),
                position: AzEl::new(20.0, 5.0),
            },
        ];
        TrackingPass::new("p1".to_string(), "BEVO-2".to_string(), waypoints).unwrap()
    }

    #[test]
    fn calendar_link_escapes_spaces_and_formats_dates() {
        let pass = pass();
        let link = calendar_link(pass.spacecraft(), pass.start_time(), pass.end_time());
        assert_eq!(
            link,
            "https://calendar.google.com/calendar/r/eventedit?\
             text=BEVO-2+Tracking+Pass&dates=20181112T064012Z/20181112T065012Z"
        );
    }

    #[test]
    fn slack_date_embeds_timestamp_link_and_fallback() {
        let pass = pass();
        let value = slack_date(pass.start_time(), "https://example.com/cal");
        assert_eq!(
            value,
            "<!date^1542004812^{date_short_pretty} at {time}^https://example.com/cal|6:40AM (UTC)>"
        );
    }

    #[test]
    fn attachment_carries_start_and_end_fields() {
        let attachment = pass_attachment(&pass());
        assert_eq!(attachment.author_name, "BEVO-2");
        assert_eq!(attachment.fields.len(), 2);
        assert_eq!(attachment.fields[0].title, "start_time");
        assert_eq!(attachment.fields[1].title, "end_time");
        assert!(attachment.fields.iter().all(|f| f.short));
    }

    #[test]
    fn unconfigured_notifier_is_disabled() {
        assert!(!SlackNotifier::new(None).is_enabled());
        assert!(!SlackNotifier::new(Some(String::new())).is_enabled());
        assert!(SlackNotifier::new(Some("https://hooks.slack.com/x".to_string())).is_enabled());
    }
}
