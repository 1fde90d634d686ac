use std::collections::BTreeMap;
use time::Date;

use crate::{
    describe, is_night, DailyForecast, ForecastError, HourlyForecast, Language, WHOLE_DAY_PERIOD,
};

/// Daily feed periods shown in a report, with their labels.
const DAY_PERIODS: [(&str, &str); 3] = [
    ("06-12", "Pola mañá"),
    ("12-18", "Pola tarde"),
    ("18-24", "Pola noite"),
];

/// Hourly feed rain probability aggregation windows, with their labels.
const PROBABILITY_WINDOWS: [(&str, &str); 4] = [
    ("0208", "Madrugada"),
    ("0814", "Mañá"),
    ("1420", "Tarde"),
    ("2002", "Noite"),
];

/// Hours covered by an hourly report after its start hour.
const HOURLY_WINDOW: u8 = 6;
const LAST_HOUR: u8 = 23;

#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Forecast(#[from] ForecastError),
    #[error("no hourly temperatures between {start}h and {end}h")]
    EmptyWindow { start: u8, end: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub language: Language,
    /// Fail when a daily period the report shows is missing instead of
    /// skipping its line.
    pub strict_periods: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            language: Language::Gal,
            strict_periods: true,
        }
    }
}

/// Sky description with the night suffix for "n" codes.
pub fn sky_text(code: Option<&str>, language: Language) -> String {
    let description = describe(code, language);
    match code {
        Some(code) if is_night(code) && !description.is_empty() => {
            format!("{} {}", description, language.night_suffix())
        }
        _ => description.to_string(),
    }
}

/// Collapse sorted hours into inclusive runs of consecutive hours.
pub fn hour_ranges(hours: &[u8]) -> Vec<(u8, u8)> {
    let mut ranges: Vec<(u8, u8)> = Vec::new();
    for &hour in hours {
        match ranges.last_mut() {
            Some((_, end)) if hour == *end + 1 => *end = hour,
            _ => ranges.push((hour, hour)),
        }
    }
    ranges
}

pub fn daily_report(record: &DailyForecast, options: &RenderOptions) -> Result<String, ReportError> {
    let mut text = header(&record.location, &record.province, record.date);

    text.push_str("Temperatura\n");
    text.push_str(&format!(
        "Máxima: {}ºC (sensación térmica: {}ºC)\n",
        record.temperature.max, record.temperature_sensation.max
    ));
    text.push_str(&format!(
        "Mínima: {}ºC (sensación térmica: {}ºC)\n\n",
        record.temperature.min, record.temperature_sensation.min
    ));

    text.push_str("Estado do ceo\n");
    let sky_lines = period_lines(&record.sky_state, options, "sky state", |sky| {
        sky_text(sky.sky_code.as_deref(), options.language)
    })?;
    for line in sky_lines {
        text.push_str(&line);
    }
    text.push('\n');

    let will_rain = record
        .rain_probability
        .values()
        .filter_map(|value| value.parse::<u32>().ok())
        .any(|probability| probability > 0);
    if will_rain {
        text.push_str("Probabilidade de choiva\n");
        let rain_lines = period_lines(&record.rain_probability, options, "rain probability", |p| {
            format!("{}%", p)
        })?;
        for line in rain_lines {
            text.push_str(&line);
        }
        text.push('\n');
    } else {
        text.push_str("Non se esperan precipitacións\n\n");
    }

    Ok(text)
}

pub fn hourly_report(
    record: &HourlyForecast,
    start_hour: u8,
    options: &RenderOptions,
) -> Result<String, ReportError> {
    let start = start_hour.min(LAST_HOUR);
    let end = (start + HOURLY_WINDOW).min(LAST_HOUR);

    let mut text = header(&record.location, &record.province, record.date);
    text.push_str(&format!("Saída do sol: {}\n", record.sunrise));
    text.push_str(&format!("Posta do sol: {}\n\n", record.sunset));
    text.push_str(&format!("Predición para as {}h ata as {}h\n\n", start, end));

    let temperatures: Vec<i32> = in_window(&record.temperature, start, end)
        .filter_map(|(_, value)| value.parse().ok())
        .collect();
    let (Some(max), Some(min)) = (temperatures.iter().max(), temperatures.iter().min()) else {
        return Err(ReportError::EmptyWindow { start, end });
    };
    text.push_str("Temperatura\n");
    text.push_str(&format!("Máxima: {}ºC\n", max));
    text.push_str(&format!("Mínima: {}ºC\n\n", min));

    text.push_str("Estado do ceo\n");
    for (hour, sky) in in_window(&record.sky_state, start, end) {
        text.push_str(&format!(
            "Ás {}h: {}\n",
            hour,
            sky_text(sky.sky_code.as_deref(), options.language)
        ));
    }

    text.push_str("\nPrecipitación\n");
    // "Ip" (inapreciable) is not measurable rain
    let rain_hours: Vec<u8> = in_window(&record.rain, start, end)
        .filter(|(_, value)| value.parse::<f64>().map(|mm| mm > 0.0).unwrap_or(false))
        .map(|(hour, _)| hour)
        .collect();
    if rain_hours.is_empty() {
        text.push_str("Non se esperan precipitacións\n");
        return Ok(text);
    }

    text.push_str("Espérase choiva:\n");
    for (from, to) in hour_ranges(&rain_hours) {
        if from == to {
            text.push_str(&format!("\tÁs {}h\n", from));
        } else {
            text.push_str(&format!("\tEntre as {}h e as {}h\n", from, to));
        }
    }

    text.push_str("\nProbabilidade de choiva\n");
    for (window, label) in PROBABILITY_WINDOWS {
        if let Some(probability) = record.rain_probability.get(window) {
            text.push_str(&format!("{}: {}%\n", label, probability));
        }
    }

    Ok(text)
}

fn header(location: &str, province: &str, date: Date) -> String {
    format!("Predición para {} ({}).\n{}\n\n", location, province, date)
}

fn period_lines<T>(
    values: &BTreeMap<String, T>,
    options: &RenderOptions,
    what: &str,
    render: impl Fn(&T) -> String,
) -> Result<Vec<String>, ReportError> {
    let mut lines = Vec::new();
    for (period, label) in DAY_PERIODS {
        match values.get(period) {
            Some(value) => lines.push(format!("{}: {}\n", label, render(value))),
            None if options.strict_periods => {
                return Err(ForecastError::UnexpectedShape(format!(
                    "no {} for period {}",
                    what, period
                ))
                .into());
            }
            None => {}
        }
    }
    // days far in the horizon only carry a whole-day entry
    if lines.is_empty() {
        if let Some(value) = values.get(WHOLE_DAY_PERIOD) {
            lines.push(format!("Todo o día: {}\n", render(value)));
        }
    }
    Ok(lines)
}

fn in_window<'a, T>(
    values: &'a BTreeMap<String, T>,
    start: u8,
    end: u8,
) -> impl Iterator<Item = (u8, &'a T)> + 'a {
    values.iter().filter_map(move |(key, value)| {
        key.trim()
            .parse::<u8>()
            .ok()
            .filter(|hour| (start..=end).contains(hour))
            .map(|hour| (hour, value))
    })
}
