use serde::Deserialize;

use crate::ForecastError;

/*
Municipality feeds published by AEMET:
https://www.aemet.es/xml/municipios/localidad_{code}.xml      daily, 7 days
https://www.aemet.es/xml/municipios_h/localidad_h_{code}.xml  hourly, 2-3 days

Daily entries are scoped by a 6/12/24 hour `periodo` ("00-06", "06-12", "00-24").
Days 5 onward carry a single whole-day entry per group with no `periodo` at all.
Hourly entries use a two digit hour ("07") and probabilities use 6 hour
aggregation windows ("0208", "0814", "1420", "2002").
*/

/// Which of the two municipality feeds a document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastMode {
    Daily,
    Hourly,
}

impl std::fmt::Display for ForecastMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForecastMode::Daily => write!(f, "daily"),
            ForecastMode::Hourly => write!(f, "hourly"),
        }
    }
}

/// A feed parsed into the schema of its mode.
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastDocument {
    Daily(DailyDocument),
    Hourly(HourlyDocument),
}

impl ForecastDocument {
    /// Parse a raw AEMET feed in a single pass into the schema for `mode`.
    pub fn parse(xml: &str, mode: ForecastMode) -> Result<Self, ForecastError> {
        let prepared = prepare_document(xml);
        let document = match mode {
            ForecastMode::Daily => ForecastDocument::Daily(serde_xml_rs::from_str(&prepared)?),
            ForecastMode::Hourly => ForecastDocument::Hourly(serde_xml_rs::from_str(&prepared)?),
        };
        Ok(document)
    }

    pub fn mode(&self) -> ForecastMode {
        match self {
            ForecastDocument::Daily(_) => ForecastMode::Daily,
            ForecastDocument::Hourly(_) => ForecastMode::Hourly,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct DailyDocument {
    pub nombre: Option<String>,
    pub provincia: Option<String>,
    pub elaborado: Option<String>,
    pub prediccion: Option<DailyPrediction>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct DailyPrediction {
    #[serde(rename = "dia", default)]
    pub days: Vec<DailyDay>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct DailyDay {
    #[serde(rename = "fecha")]
    pub date: String,
    #[serde(rename = "prob_precipitacion", default)]
    pub rain_probability: Vec<PeriodValue>,
    #[serde(rename = "cota_nieve_prov", default)]
    pub snow_quota: Vec<PeriodValue>,
    #[serde(rename = "estado_cielo", default)]
    pub sky_state: Vec<SkyStateEntry>,
    #[serde(rename = "viento", default)]
    pub wind: Vec<WindEntry>,
    #[serde(rename = "temperatura")]
    pub temperature: Option<RangeBlock>,
    #[serde(rename = "sens_termica")]
    pub temperature_sensation: Option<RangeBlock>,
    #[serde(rename = "humedad_relativa")]
    pub humidity: Option<RangeBlock>,
    pub uv_max: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct HourlyDocument {
    pub nombre: Option<String>,
    pub provincia: Option<String>,
    pub elaborado: Option<String>,
    pub prediccion: Option<HourlyPrediction>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct HourlyPrediction {
    #[serde(rename = "dia", default)]
    pub days: Vec<HourlyDay>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct HourlyDay {
    #[serde(rename = "fecha")]
    pub date: String,
    #[serde(rename = "orto")]
    pub sunrise: Option<String>,
    #[serde(rename = "ocaso")]
    pub sunset: Option<String>,
    #[serde(rename = "estado_cielo", default)]
    pub sky_state: Vec<SkyStateEntry>,
    #[serde(rename = "precipitacion", default)]
    pub rain: Vec<PeriodValue>,
    #[serde(rename = "prob_precipitacion", default)]
    pub rain_probability: Vec<PeriodValue>,
    #[serde(rename = "prob_tormenta", default)]
    pub storm_probability: Vec<PeriodValue>,
    #[serde(rename = "nieve", default)]
    pub snow: Vec<PeriodValue>,
    #[serde(rename = "temperatura", default)]
    pub temperature: Vec<PeriodValue>,
    #[serde(rename = "sens_termica", default)]
    pub temperature_sensation: Vec<PeriodValue>,
    #[serde(rename = "humedad_relativa", default)]
    pub humidity: Vec<PeriodValue>,
    #[serde(rename = "viento", default)]
    pub wind: Vec<WindEntry>,
}

/// A text value scoped to a `periodo`, e.g. `<prob_precipitacion periodo="00-06">5</prob_precipitacion>`
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct PeriodValue {
    pub periodo: Option<String>,
    #[serde(rename = "$value")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct SkyStateEntry {
    pub periodo: Option<String>,
    pub descripcion: Option<String>,
    #[serde(rename = "$value")]
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct WindEntry {
    pub periodo: Option<String>,
    pub direccion: Option<String>,
    pub velocidad: Option<String>,
}

/// Daily max/min block with optional `dato` readings keyed by `hora`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct RangeBlock {
    pub maxima: Option<String>,
    pub minima: Option<String>,
    #[serde(rename = "dato", default)]
    pub readings: Vec<HourValue>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct HourValue {
    pub hora: Option<String>,
    #[serde(rename = "$value")]
    pub value: Option<String>,
}

/// Make a raw feed digestible for `serde-xml-rs`.
///
/// The declaration is dropped because the feed announces ISO-8859-15 while we
/// always hand over an already decoded string. Children of each `<dia>` are
/// then regrouped so same-named siblings are adjacent.
pub fn prepare_document(xml: &str) -> String {
    group_day_elements(strip_xml_declaration(xml))
}

fn strip_xml_declaration(xml: &str) -> &str {
    let trimmed = xml.trim_start_matches('\u{feff}').trim_start();
    if trimmed.starts_with("<?xml") {
        if let Some(end) = trimmed.find("?>") {
            return &trimmed[end + 2..];
        }
    }
    trimmed
}

/// Reorder child elements within `<dia>` blocks so that elements with the same
/// tag name are adjacent. `serde-xml-rs` cannot collect non-adjacent sibling
/// elements with the same name into a Vec, and the hourly feed interleaves
/// `viento` with `racha_max` for every hour.
pub fn group_day_elements(xml: &str) -> String {
    let mut result = String::with_capacity(xml.len());
    let mut remaining = xml;

    while let Some(day_start) = remaining.find("<dia ") {
        result.push_str(&remaining[..day_start]);

        let after_day = &remaining[day_start..];
        let day_end = match after_day.find("</dia>") {
            Some(pos) => pos + "</dia>".len(),
            None => {
                result.push_str(after_day);
                return result;
            }
        };
        let day_block = &after_day[..day_end];

        let open_tag_end = match day_block.find('>') {
            Some(pos) => pos + 1,
            None => {
                result.push_str(day_block);
                remaining = &after_day[day_end..];
                continue;
            }
        };
        let opening_tag = &day_block[..open_tag_end];
        let inner = &day_block[open_tag_end..day_block.len() - "</dia>".len()];

        // (tag_name, full_element)
        let mut elements: Vec<(&str, &str)> = Vec::new();
        let mut pos = 0;
        let inner_bytes = inner.as_bytes();
        while pos < inner.len() {
            if inner_bytes[pos] != b'<' {
                pos += 1;
                continue;
            }

            let tag_start = pos;
            let after_lt = &inner[pos + 1..];
            let tag_name_end = after_lt
                .find(|c: char| c.is_ascii_whitespace() || c == '>' || c == '/')
                .unwrap_or(after_lt.len());
            let tag_name = &after_lt[..tag_name_end];

            let open_end = match inner[tag_start..].find('>') {
                Some(p) => tag_start + p + 1,
                None => break,
            };
            let element_end = if inner[..open_end].ends_with("/>") {
                open_end
            } else {
                let closing_tag = format!("</{}>", tag_name);
                match inner[open_end..].find(&closing_tag) {
                    Some(close_pos) => open_end + close_pos + closing_tag.len(),
                    None => {
                        // malformed, leave it for the parser to reject
                        pos = open_end;
                        continue;
                    }
                }
            };

            elements.push((tag_name, &inner[tag_start..element_end]));
            pos = element_end;
        }

        elements.sort_by(|a, b| a.0.cmp(b.0));

        result.push_str(opening_tag);
        for (_, element) in &elements {
            result.push_str(element);
        }
        result.push_str("</dia>");

        remaining = &after_day[day_end..];
    }

    result.push_str(remaining);
    result
}
