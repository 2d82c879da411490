use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, info, warn};

use backend_application::commands::price_refresh_commands::{run_price_refresh_batch, BatchTrigger};
use backend_application::AppState;
use backend_domain::ports::BatchContinuation;

/// Hands continuation requests to the worker loop. At most one is ever queued.
#[derive(Clone)]
pub struct ChannelContinuation {
    sender: mpsc::Sender<()>,
}

impl BatchContinuation for ChannelContinuation {
    fn schedule_continuation(&self) {
        match self.sender.try_send(()) {
            Ok(()) => debug!("price batch continuation scheduled"),
            Err(TrySendError::Full(())) => debug!("price batch continuation already pending"),
            Err(TrySendError::Closed(())) => warn!("price worker stopped, continuation dropped"),
        }
    }
}

pub fn continuation_channel() -> (ChannelContinuation, mpsc::Receiver<()>) {
    let (sender, receiver) = mpsc::channel(1);
    (ChannelContinuation { sender }, receiver)
}

/// Runs the price pipeline once a day and whenever a batch asks to continue.
///
/// When a chain of continuations drains the queue but leaves failed items under
/// the attempt cap, another round re-queues them after the continuation delay.
pub async fn run_price_refresh_worker(state: AppState, mut continuations: mpsc::Receiver<()>) {
    let delay = Duration::from_millis(state.config.price_continuation_delay_ms);
    let mut retry_round = false;
    loop {
        let trigger = if retry_round {
            tokio::time::sleep(delay).await;
            info!("retrying failed price items");
            BatchTrigger {
                auto_invoked: true,
                batch_continue: false,
            }
        } else {
            let now = Utc::now();
            let next = next_refresh_time(
                state.config.price_refresh_hour,
                state.config.price_refresh_minute,
                now,
            );
            let wait = (next - now).to_std().unwrap_or_default();

            tokio::select! {
                _ = tokio::time::sleep(wait) => BatchTrigger {
                    auto_invoked: true,
                    batch_continue: false,
                },
                received = continuations.recv() => match received {
                    Some(()) => {
                        tokio::time::sleep(delay).await;
                        BatchTrigger {
                            auto_invoked: true,
                            batch_continue: true,
                        }
                    }
                    None => {
                        info!("continuation channel closed, price worker stopping");
                        return;
                    }
                },
            }
        };

        retry_round = match run_price_refresh_batch(&state, trigger).await {
            Ok(summary) => {
                !summary.will_continue && summary.retryable > 0 && summary.processed > 0
            }
            Err(err) => {
                error!(
                    batch_continue = trigger.batch_continue,
                    "price refresh batch failed: {}", err
                );
                false
            }
        };
    }
}

pub fn next_refresh_time(hour: u32, minute: u32, now: DateTime<Utc>) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
    let today = now.date_naive().and_time(time).and_utc();
    if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    }
}
