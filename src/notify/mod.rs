mod digest;
mod slack;

pub use digest::spawn_daily_digest;
pub use slack::SlackNotifier;
