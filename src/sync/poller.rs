use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::common::AppState;
use crate::telemetry::{build_view, view, DashboardView, Target, WindowRequest};

/// Live refresh of one dashboard view.
///
/// The poller task lives exactly as long as this handle: dropping it (the
/// viewer went away) aborts the task, on every exit path.
pub struct PollHandle {
    receiver: watch::Receiver<Option<DashboardView>>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Start polling `target` every `poll_interval_seconds`. The first
    /// refresh runs immediately.
    pub fn start(state: AppState, token: String, target: Target) -> Self {
        let (sender, receiver) = watch::channel(None);
        let task = tokio::spawn(run(state, token, target, sender));
        Self { receiver, task }
    }

    /// Receiver that sees every refreshed view; `None` until the first one lands.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<DashboardView>> {
        self.receiver.clone()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
        tracing::debug!("dashboard_poller_stopped");
    }
}

async fn run(
    state: AppState,
    token: String,
    target: Target,
    sender: watch::Sender<Option<DashboardView>>,
) {
    let interval_secs = state.config.poll_interval_seconds;
    let window = view::window_config(&state.config);

    tracing::debug!(interval_secs, view_target = ?target, "dashboard_poller_started");

    let mut ticker = interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        match build_view(
            state.backend.as_ref(),
            &token,
            &target,
            WindowRequest::Latest,
            &window,
        )
        .await
        {
            Ok(view) => {
                if sender.send(Some(view)).is_err() {
                    break;
                }
            }
            // Keep the last good view; the next tick tries again.
            Err(e) => tracing::warn!(error = %e, "Dashboard refresh failed"),
        }
    }
}
