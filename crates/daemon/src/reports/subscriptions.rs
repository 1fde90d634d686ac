use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use slog::{error, info, Logger};
use std::{future::Future, sync::Arc};

use crate::{local_day, local_hour, next_run, Assistant, Report, ReportOutcome, ReportSink, Subscription};

/// Sends every subscription's report once a day at a fixed local time.
pub struct DailyReports {
    logger: Logger,
    assistant: Arc<Assistant>,
    sink: Arc<dyn ReportSink>,
    subscriptions: Vec<Subscription>,
    report_time: NaiveTime,
    timezone: Tz,
}

impl DailyReports {
    pub fn new(
        logger: Logger,
        assistant: Arc<Assistant>,
        sink: Arc<dyn ReportSink>,
        subscriptions: Vec<Subscription>,
        report_time: NaiveTime,
        timezone: Tz,
    ) -> Self {
        DailyReports {
            logger,
            assistant,
            sink,
            subscriptions,
            report_time,
            timezone,
        }
    }

    /// Sleep until each fire time and send the reports, until `shutdown`
    /// resolves.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            let now = Utc::now();
            let fire_at = next_run(now, self.report_time, self.timezone);
            let wait = (fire_at - now).to_std().unwrap_or_default();
            info!(
                self.logger,
                "next daily report at {} ({} seconds)",
                fire_at,
                wait.as_secs()
            );

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    let delivered = self.send_all(fire_at).await;
                    info!(
                        self.logger,
                        "delivered {} of {} daily reports",
                        delivered,
                        self.subscriptions.len()
                    );
                }
                _ = &mut shutdown => {
                    info!(self.logger, "stopping daily reports");
                    return;
                }
            }
        }
    }

    /// Send one round of reports as of `now`. A failing subscription is
    /// logged and the rest still go out. Returns how many were delivered.
    pub async fn send_all(&self, now: DateTime<Utc>) -> usize {
        let mut delivered = 0;
        for subscription in &self.subscriptions {
            match self.send(subscription, now).await {
                Ok(()) => delivered += 1,
                Err(err) => error!(
                    self.logger,
                    "error sending daily report for {}: {:#}", subscription.place, err
                ),
            }
        }
        delivered
    }

    async fn send(&self, subscription: &Subscription, now: DateTime<Utc>) -> Result<(), anyhow::Error> {
        let date = local_day(now, self.timezone, subscription.day_offset)?;
        let start_hour = local_hour(now, self.timezone);
        let outcome = self
            .assistant
            .report(&subscription.place, subscription.mode, date, start_hour)
            .await?;
        if outcome == ReportOutcome::PlaceNotFound {
            return Err(anyhow::anyhow!("no place matches '{}'", subscription.place));
        }
        let report = Report {
            place: subscription.place.clone(),
            chat_id: subscription.chat_id.clone(),
            text: outcome.text().to_string(),
        };
        self.sink.deliver(&report).await?;
        Ok(())
    }
}
