use anyhow::{anyhow, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::time;

use backend::clients::{CalendarProvider, MailboxProvider};
use backend::config::AppConfig;
use backend::state::AppState;
use backend::watch::{self, ChannelHandle};

use crate::Target;

pub struct RenewalScheduler {
    state: AppState,
    interval: Duration,
}

impl RenewalScheduler {
    pub fn new(state: AppState, interval: Duration) -> Self {
        Self { state, interval }
    }

    /// Renew both subscriptions every interval, starting immediately.
    pub async fn run(&self) -> Result<()> {
        tracing::info!("Starting watch renewal scheduler");

        let calendar = self.state.calendar().ok();
        let mailbox = self.state.mailbox().ok();
        if calendar.is_none() && mailbox.is_none() {
            return Err(anyhow!("No Google credentials configured, nothing to renew"));
        }

        let calendar_config = self.state.config.clone();
        let calendar_interval = self.interval;
        let calendar_handle = tokio::spawn(async move {
            match calendar {
                Some(calendar) => {
                    Self::run_calendar_renewal(calendar, calendar_config, calendar_interval).await
                }
                None => std::future::pending().await,
            }
        });

        let gmail_config = self.state.config.clone();
        let gmail_interval = self.interval;
        let gmail_handle = tokio::spawn(async move {
            match mailbox {
                Some(mailbox) => Self::run_gmail_renewal(mailbox, gmail_config, gmail_interval).await,
                None => std::future::pending().await,
            }
        });

        // Wait for either task to complete (which shouldn't happen unless there's an error)
        tokio::select! {
            result = calendar_handle => {
                if let Err(e) = result {
                    tracing::error!("Calendar renewal task error: {:?}", e);
                }
            }
            result = gmail_handle => {
                if let Err(e) = result {
                    tracing::error!("Gmail renewal task error: {:?}", e);
                }
            }
        }

        Ok(())
    }

    /// Renew the selected subscriptions once. Fails if any renewal fails.
    pub async fn run_once(&self, target: Target) -> Result<()> {
        if matches!(target, Target::Calendar | Target::All) {
            let calendar = self.state.calendar()?;
            let response =
                watch::renew_calendar_watch(calendar.as_ref(), &self.state.config, None).await?;
            tracing::info!(
                "Calendar channel {:?} on resource {:?} expires {}",
                response.watch_id,
                response.resource_id,
                response.expiration
            );
        }

        if matches!(target, Target::Gmail | Target::All) {
            let mailbox = self.state.mailbox()?;
            let response =
                watch::renew_gmail_watch(mailbox.as_ref(), &self.state.config, false).await?;
            tracing::info!(
                "Gmail watch at history {:?} expires {}",
                response.history_id,
                response.expiration
            );
        }

        Ok(())
    }

    async fn run_calendar_renewal(
        calendar: Arc<dyn CalendarProvider>,
        config: Arc<AppConfig>,
        interval: Duration,
    ) {
        let mut ticker = time::interval(interval);
        let mut last_channel: Option<ChannelHandle> = None;

        tracing::info!("Calendar renewal started (interval: {:?})", interval);

        loop {
            ticker.tick().await;
            renew_calendar_cycle(calendar.as_ref(), &config, &mut last_channel).await;
        }
    }

    async fn run_gmail_renewal(
        mailbox: Arc<dyn MailboxProvider>,
        config: Arc<AppConfig>,
        interval: Duration,
    ) {
        let mut ticker = time::interval(interval);

        tracing::info!("Gmail renewal started (interval: {:?})", interval);

        loop {
            ticker.tick().await;
            tracing::debug!("Running Gmail renewal cycle");

            if let Err(e) = watch::renew_gmail_watch(mailbox.as_ref(), &config, false).await {
                tracing::error!("Gmail renewal error: {}", e);
                // Retried on the next tick
            }
        }
    }
}

/// One calendar renewal. On success `last_channel` is replaced by the new
/// channel, to be stopped on the next cycle; on failure it is kept.
pub async fn renew_calendar_cycle(
    calendar: &dyn CalendarProvider,
    config: &AppConfig,
    last_channel: &mut Option<ChannelHandle>,
) {
    tracing::debug!("Running calendar renewal cycle");

    match watch::renew_calendar_watch(calendar, config, last_channel.as_ref()).await {
        Ok(response) => {
            *last_channel = ChannelHandle::from_response(&response);
            if last_channel.is_none() {
                tracing::warn!("Renewed channel has no resource id; it will not be stopped");
            }
        }
        Err(e) => tracing::error!("Calendar renewal error: {}", e),
    }
}
