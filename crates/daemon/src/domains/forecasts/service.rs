use slog::{debug, Logger};
use std::sync::Arc;
use time::Date;

use crate::{normalize, ForecastDocument, ForecastError, ForecastMode, ForecastRecord, ForecastSource};

pub struct ForecastService {
    pub source: Arc<dyn ForecastSource>,
    pub logger: Logger,
}

impl ForecastService {
    pub fn new(logger: Logger, source: Arc<dyn ForecastSource>) -> Self {
        ForecastService { logger, source }
    }

    /// Fetch the feed for `place_code` and normalize the entry for `date`.
    /// Every call goes to the source, nothing is cached.
    pub async fn forecast(
        &self,
        place_code: &str,
        mode: ForecastMode,
        date: Date,
    ) -> Result<ForecastRecord, ForecastError> {
        let xml = self.source.fetch_document(place_code, mode).await?;
        let document = ForecastDocument::parse(&xml, mode)?;
        let record = normalize(&document, date)?;
        debug!(
            self.logger,
            "{} forecast for {} ({}) on {}",
            mode,
            record.location(),
            place_code,
            date
        );
        Ok(record)
    }
}
