//! Periodic refresh of the global report feed.

use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::{DateFilter, Report, StoreClient, StoreError};

/// Polls `GET /reports` on a fixed interval. Not tied to any identity.
#[derive(Clone)]
pub struct ReportPoller {
    client: StoreClient,
    filter: DateFilter,
    interval: Duration,
}

impl ReportPoller {
    pub fn new(client: StoreClient, filter: DateFilter) -> Self {
        let interval = client.config().report_poll_interval;
        Self {
            client,
            filter,
            interval,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub const fn filter(&self) -> DateFilter {
        self.filter
    }

    pub async fn poll_once(&self) -> Result<Vec<Report>, StoreError> {
        self.client.list_reports(self.filter).await
    }

    /// Starts polling on the runtime. The first fetch happens immediately.
    pub fn spawn(self) -> ReportFeed {
        let (sender, reports) = watch::channel(Vec::new());
        let (stop, stopped) = oneshot::channel();
        let handle = tokio::spawn(self.run(sender, stopped));

        ReportFeed {
            reports,
            stop: Some(stop),
            handle,
        }
    }

    async fn run(self, sender: watch::Sender<Vec<Report>>, mut stopped: oneshot::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut stopped => break,
                _ = ticker.tick() => {
                    match self.poll_once().await {
                        Ok(batch) => {
                            tracing::debug!(filter = %self.filter, count = batch.len(), "reports refreshed");
                            if sender.send(batch).is_err() {
                                break;
                            }
                        }
                        Err(error) => {
                            tracing::warn!(filter = %self.filter, %error, "report refresh failed; keeping previous batch");
                        }
                    }
                }
            }
        }
    }
}

/// Handle to a running [`ReportPoller`].
pub struct ReportFeed {
    reports: watch::Receiver<Vec<Report>>,
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl ReportFeed {
    pub fn subscribe(&self) -> watch::Receiver<Vec<Report>> {
        self.reports.clone()
    }

    pub fn latest(&self) -> Vec<Report> {
        self.reports.borrow().clone()
    }

    /// Stops polling and waits for the task to finish.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Err(error) = (&mut self.handle).await {
            tracing::warn!(%error, "report poller task ended abnormally");
        }
    }
}
