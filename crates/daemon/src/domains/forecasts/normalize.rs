use std::collections::BTreeMap;

use time::{macros::format_description, Date, OffsetDateTime, PrimitiveDateTime};

use crate::{
    DailyDay, DailyDocument, FetchError, ForecastDocument, ForecastMode, HourlyDay, HourlyDocument,
    PeriodValue, RangeBlock, SkyStateEntry, WindEntry,
};

/// Key used for entries the feed publishes without a `periodo` (whole day).
pub const WHOLE_DAY_PERIOD: &str = "00-24";

#[derive(thiserror::Error, Debug)]
pub enum ForecastError {
    #[error("No forecast published for {0}")]
    NotFound(Date),
    #[error("Unexpected forecast document shape: {0}")]
    UnexpectedShape(String),
    #[error("Failed to parse forecast document: {0}")]
    Xml(#[from] serde_xml_rs::Error),
    #[error("Failed to fetch forecast document: {0}")]
    Fetch(#[from] FetchError),
}

/// Anything that names a calendar day; time of day is dropped.
pub trait ForecastDay {
    fn forecast_day(&self) -> Date;
}

impl ForecastDay for Date {
    fn forecast_day(&self) -> Date {
        *self
    }
}

impl ForecastDay for OffsetDateTime {
    fn forecast_day(&self) -> Date {
        self.date()
    }
}

impl ForecastDay for PrimitiveDateTime {
    fn forecast_day(&self) -> Date {
        self.date()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkyState {
    pub description: String,
    /// `None` when the feed left the code blank.
    pub sky_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wind {
    pub direction: String,
    pub speed: String,
}

/// Max/min pair plus whatever hourly readings the feed published.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RangeSummary {
    pub max: String,
    pub min: String,
    pub hourly: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyForecast {
    pub location: String,
    pub province: String,
    pub updated_at: String,
    pub date: Date,
    pub sky_state: BTreeMap<String, SkyState>,
    pub temperature: RangeSummary,
    pub temperature_sensation: RangeSummary,
    pub humidity: RangeSummary,
    pub rain_probability: BTreeMap<String, String>,
    pub wind: BTreeMap<String, Wind>,
    pub snow_quota: BTreeMap<String, String>,
    pub uv_max: Option<String>,
}

impl DailyForecast {
    /// Sky state for a period every daily feed is expected to carry.
    pub fn sky_for(&self, period: &str) -> Result<&SkyState, ForecastError> {
        self.sky_state.get(period).ok_or_else(|| {
            ForecastError::UnexpectedShape(format!("no sky state for period {}", period))
        })
    }

    /// Rain probability for a period every daily feed is expected to carry.
    pub fn rain_probability_for(&self, period: &str) -> Result<&str, ForecastError> {
        self.rain_probability
            .get(period)
            .map(String::as_str)
            .ok_or_else(|| {
                ForecastError::UnexpectedShape(format!(
                    "no rain probability for period {}",
                    period
                ))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourlyForecast {
    pub location: String,
    pub province: String,
    pub updated_at: String,
    pub date: Date,
    pub sunrise: String,
    pub sunset: String,
    pub sky_state: BTreeMap<String, SkyState>,
    pub rain: BTreeMap<String, String>,
    /// Keyed by aggregation window ("0208", "0814", ...), not by hour.
    pub rain_probability: BTreeMap<String, String>,
    /// Keyed by aggregation window, like `rain_probability`.
    pub storm_probability: BTreeMap<String, String>,
    pub snow: BTreeMap<String, String>,
    pub temperature: BTreeMap<String, String>,
    pub temperature_sensation: BTreeMap<String, String>,
    pub humidity: BTreeMap<String, String>,
    pub wind: BTreeMap<String, Wind>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForecastRecord {
    Daily(DailyForecast),
    Hourly(HourlyForecast),
}

impl ForecastRecord {
    pub fn mode(&self) -> ForecastMode {
        match self {
            ForecastRecord::Daily(_) => ForecastMode::Daily,
            ForecastRecord::Hourly(_) => ForecastMode::Hourly,
        }
    }

    pub fn location(&self) -> &str {
        match self {
            ForecastRecord::Daily(daily) => &daily.location,
            ForecastRecord::Hourly(hourly) => &hourly.location,
        }
    }

    pub fn province(&self) -> &str {
        match self {
            ForecastRecord::Daily(daily) => &daily.province,
            ForecastRecord::Hourly(hourly) => &hourly.province,
        }
    }
}

/// Flatten the day entry for `target` out of a parsed feed.
///
/// Only the day lookup is strict: a missing day is `NotFound`, while a missing
/// field group turns into an empty mapping. Values are carried as the feed's
/// text, never coerced to numbers.
pub fn normalize<D: ForecastDay>(
    document: &ForecastDocument,
    target: D,
) -> Result<ForecastRecord, ForecastError> {
    let date = target.forecast_day();
    match document {
        ForecastDocument::Daily(daily) => normalize_daily(daily, date).map(ForecastRecord::Daily),
        ForecastDocument::Hourly(hourly) => {
            normalize_hourly(hourly, date).map(ForecastRecord::Hourly)
        }
    }
}

/// Parse and normalize a raw feed in one call.
pub fn normalize_xml<D: ForecastDay>(
    xml: &str,
    mode: ForecastMode,
    target: D,
) -> Result<ForecastRecord, ForecastError> {
    let document = ForecastDocument::parse(xml, mode)?;
    normalize(&document, target)
}

fn normalize_daily(document: &DailyDocument, date: Date) -> Result<DailyForecast, ForecastError> {
    let header = Header::read(
        &document.nombre,
        &document.provincia,
        &document.elaborado,
        document.prediccion.is_some(),
    )?;
    let days = document
        .prediccion
        .as_ref()
        .map(|p| p.days.as_slice())
        .unwrap_or_default();
    let day: &DailyDay =
        find_day(days, date, |d| &d.date).ok_or(ForecastError::NotFound(date))?;

    let temperature = day
        .temperature
        .as_ref()
        .ok_or_else(|| ForecastError::UnexpectedShape("day has no temperatura".to_string()))?;
    let temperature_sensation = day
        .temperature_sensation
        .as_ref()
        .ok_or_else(|| ForecastError::UnexpectedShape("day has no sens_termica".to_string()))?;

    Ok(DailyForecast {
        location: header.location,
        province: header.province,
        updated_at: header.updated_at,
        date,
        sky_state: sky_states(&day.sky_state),
        temperature: range_summary(temperature),
        temperature_sensation: range_summary(temperature_sensation),
        humidity: day.humidity.as_ref().map(range_summary).unwrap_or_default(),
        rain_probability: period_values(&day.rain_probability),
        wind: winds(&day.wind),
        snow_quota: period_values(&day.snow_quota),
        uv_max: day.uv_max.as_ref().map(|v| v.trim().to_string()),
    })
}

fn normalize_hourly(
    document: &HourlyDocument,
    date: Date,
) -> Result<HourlyForecast, ForecastError> {
    let header = Header::read(
        &document.nombre,
        &document.provincia,
        &document.elaborado,
        document.prediccion.is_some(),
    )?;
    let days = document
        .prediccion
        .as_ref()
        .map(|p| p.days.as_slice())
        .unwrap_or_default();
    let day: &HourlyDay =
        find_day(days, date, |d| &d.date).ok_or(ForecastError::NotFound(date))?;

    let sunrise = day
        .sunrise
        .clone()
        .ok_or_else(|| ForecastError::UnexpectedShape("day has no orto".to_string()))?;
    let sunset = day
        .sunset
        .clone()
        .ok_or_else(|| ForecastError::UnexpectedShape("day has no ocaso".to_string()))?;

    Ok(HourlyForecast {
        location: header.location,
        province: header.province,
        updated_at: header.updated_at,
        date,
        sunrise,
        sunset,
        sky_state: sky_states(&day.sky_state),
        rain: period_values(&day.rain),
        rain_probability: period_values(&day.rain_probability),
        storm_probability: period_values(&day.storm_probability),
        snow: period_values(&day.snow),
        temperature: period_values(&day.temperature),
        temperature_sensation: period_values(&day.temperature_sensation),
        humidity: period_values(&day.humidity),
        wind: winds(&day.wind),
    })
}

struct Header {
    location: String,
    province: String,
    updated_at: String,
}

impl Header {
    fn read(
        nombre: &Option<String>,
        provincia: &Option<String>,
        elaborado: &Option<String>,
        has_prediction: bool,
    ) -> Result<Self, ForecastError> {
        let required = |value: &Option<String>, name: &str| {
            value
                .clone()
                .ok_or_else(|| ForecastError::UnexpectedShape(format!("document has no {}", name)))
        };
        let header = Header {
            location: required(nombre, "nombre")?,
            province: required(provincia, "provincia")?,
            updated_at: required(elaborado, "elaborado")?,
        };
        if !has_prediction {
            return Err(ForecastError::UnexpectedShape(
                "document has no prediccion".to_string(),
            ));
        }
        Ok(header)
    }
}

fn find_day<'a, T>(days: &'a [T], date: Date, fecha: impl Fn(&T) -> &String) -> Option<&'a T> {
    let iso = format_description!("[year]-[month]-[day]");
    days.iter()
        .find(|day| Date::parse(fecha(day).trim(), iso).ok() == Some(date))
}

fn period_key(periodo: &Option<String>) -> String {
    periodo
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(WHOLE_DAY_PERIOD)
        .to_string()
}

fn text(value: &Option<String>) -> String {
    value.as_deref().map(str::trim).unwrap_or_default().to_string()
}

fn period_values(values: &[PeriodValue]) -> BTreeMap<String, String> {
    values
        .iter()
        .map(|entry| (period_key(&entry.periodo), text(&entry.value)))
        .collect()
}

fn sky_states(values: &[SkyStateEntry]) -> BTreeMap<String, SkyState> {
    values
        .iter()
        .map(|entry| {
            let code = text(&entry.code);
            (
                period_key(&entry.periodo),
                SkyState {
                    description: text(&entry.descripcion),
                    sky_code: (!code.is_empty()).then_some(code),
                },
            )
        })
        .collect()
}

fn winds(values: &[WindEntry]) -> BTreeMap<String, Wind> {
    values
        .iter()
        .map(|entry| {
            (
                period_key(&entry.periodo),
                Wind {
                    direction: text(&entry.direccion),
                    speed: text(&entry.velocidad),
                },
            )
        })
        .collect()
}

fn range_summary(block: &RangeBlock) -> RangeSummary {
    RangeSummary {
        max: text(&block.maxima),
        min: text(&block.minima),
        hourly: block
            .readings
            .iter()
            .filter_map(|reading| {
                reading
                    .hora
                    .as_deref()
                    .map(|hora| (hora.trim().to_string(), text(&reading.value)))
            })
            .collect(),
    }
}
