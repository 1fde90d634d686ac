use serde::Deserialize;
use slog::{debug, info, Logger};
use time::Date;

use crate::{
    daily_report, hourly_report, ForecastMode, ForecastRecord, ForecastService, PlaceDirectory,
    RenderOptions, ReportError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    Report(String),
    PlaceNotFound,
}

/// Message shown when a query resolves to no place.
pub const PLACE_NOT_FOUND_TEXT: &str = "Non se atopou o concello.";

impl ReportOutcome {
    pub fn text(&self) -> &str {
        match self {
            ReportOutcome::Report(text) => text,
            ReportOutcome::PlaceNotFound => PLACE_NOT_FOUND_TEXT,
        }
    }
}

/// A recurring report from the `[[subscriptions]]` config section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Subscription {
    pub place: String,
    #[serde(default = "default_mode")]
    pub mode: ForecastMode,
    /// 0 reports on the fire day, 1 on the day after.
    #[serde(default)]
    pub day_offset: i64,
    pub chat_id: Option<String>,
}

fn default_mode() -> ForecastMode {
    ForecastMode::Daily
}

/// Place query in, report text out.
pub struct Assistant {
    logger: Logger,
    places: PlaceDirectory,
    forecasts: ForecastService,
    options: RenderOptions,
}

impl Assistant {
    pub fn new(
        logger: Logger,
        places: PlaceDirectory,
        forecasts: ForecastService,
        options: RenderOptions,
    ) -> Self {
        Assistant {
            logger,
            places,
            forecasts,
            options,
        }
    }

    pub async fn daily_report(&self, query: &str, date: Date) -> Result<ReportOutcome, ReportError> {
        self.report(query, ForecastMode::Daily, date, 0).await
    }

    /// Hourly report for `date` covering the hours from `start_hour`.
    pub async fn hourly_report(
        &self,
        query: &str,
        date: Date,
        start_hour: u8,
    ) -> Result<ReportOutcome, ReportError> {
        self.report(query, ForecastMode::Hourly, date, start_hour)
            .await
    }

    pub async fn report(
        &self,
        query: &str,
        mode: ForecastMode,
        date: Date,
        start_hour: u8,
    ) -> Result<ReportOutcome, ReportError> {
        let Some(place) = self.places.resolve(query) else {
            info!(self.logger, "no place found for '{}'", query);
            return Ok(ReportOutcome::PlaceNotFound);
        };
        debug!(
            self.logger,
            "building {} report for {} ({}) on {}", mode, place.name, place.code, date
        );

        let text = match self.forecasts.forecast(&place.code, mode, date).await? {
            ForecastRecord::Daily(daily) => daily_report(&daily, &self.options)?,
            ForecastRecord::Hourly(hourly) => hourly_report(&hourly, start_hour, &self.options)?,
        };
        Ok(ReportOutcome::Report(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_defaults_from_toml() {
        let subscription: Subscription = toml::from_str(r#"place = "Vigo""#).unwrap();
        assert_eq!(
            subscription,
            Subscription {
                place: String::from("Vigo"),
                mode: ForecastMode::Daily,
                day_offset: 0,
                chat_id: None,
            }
        );
    }

    #[test]
    fn subscription_reads_every_key() {
        let subscription: Subscription = toml::from_str(
            r#"
            place = "Santiago de Compostela"
            mode = "hourly"
            day_offset = 1
            chat_id = "-1001234"
            "#,
        )
        .unwrap();
        assert_eq!(subscription.mode, ForecastMode::Hourly);
        assert_eq!(subscription.day_offset, 1);
        assert_eq!(subscription.chat_id.as_deref(), Some("-1001234"));
    }

    #[test]
    fn place_not_found_has_a_message() {
        assert_eq!(ReportOutcome::PlaceNotFound.text(), PLACE_NOT_FOUND_TEXT);
        assert_eq!(ReportOutcome::Report(String::from("ok")).text(), "ok");
    }
}
