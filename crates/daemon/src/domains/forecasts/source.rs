use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use slog::{debug, Logger};
use std::time::Duration;

use crate::ForecastMode;

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("error sending request: {0}")]
    Request(#[from] reqwest::Error),
    #[error("error response {status} from {url}")]
    Status { status: StatusCode, url: String },
}

/// Where raw municipality feeds come from.
#[async_trait]
pub trait ForecastSource: Send + Sync {
    async fn fetch_document(
        &self,
        place_code: &str,
        mode: ForecastMode,
    ) -> Result<String, FetchError>;
}

pub struct AemetClient {
    logger: Logger,
    base_url: String,
    client: Client,
}

impl AemetClient {
    pub fn new(logger: Logger, base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(concat!("tempo/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            logger,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn document_url(&self, place_code: &str, mode: ForecastMode) -> String {
        match mode {
            ForecastMode::Daily => format!(
                "{}/xml/municipios/localidad_{}.xml",
                self.base_url, place_code
            ),
            ForecastMode::Hourly => format!(
                "{}/xml/municipios_h/localidad_h_{}.xml",
                self.base_url, place_code
            ),
        }
    }
}

#[async_trait]
impl ForecastSource for AemetClient {
    async fn fetch_document(
        &self,
        place_code: &str,
        mode: ForecastMode,
    ) -> Result<String, FetchError> {
        let url = self.document_url(place_code, mode);
        debug!(self.logger, "requesting: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { status, url });
        }
        let body = response.bytes().await?;
        debug!(self.logger, "received {} bytes from {}", body.len(), url);
        Ok(decode_document(&body))
    }
}

/// Decode a feed body. AEMET declares ISO-8859-15; anything that is not
/// valid UTF-8 is read in that charset.
pub fn decode_document(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| iso_8859_15(b)).collect(),
    }
}

/// ISO-8859-15 is Latin-1 with eight code points replaced.
fn iso_8859_15(byte: u8) -> char {
    match byte {
        0xA4 => '€',
        0xA6 => 'Š',
        0xA8 => 'š',
        0xB4 => 'Ž',
        0xB8 => 'ž',
        0xBC => 'Œ',
        0xBD => 'œ',
        0xBE => 'Ÿ',
        other => other as char,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> AemetClient {
        let logger = slog::Logger::root(slog::Discard, slog::o!());
        AemetClient::new(logger, base_url, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn builds_feed_urls_per_mode() {
        let client = client("https://www.aemet.es/");
        assert_eq!(
            client.document_url("15030", ForecastMode::Daily),
            "https://www.aemet.es/xml/municipios/localidad_15030.xml"
        );
        assert_eq!(
            client.document_url("15030", ForecastMode::Hourly),
            "https://www.aemet.es/xml/municipios_h/localidad_h_15030.xml"
        );
    }

    #[test]
    fn decodes_utf8_and_latin1() {
        assert_eq!(decode_document("A Coruña".as_bytes()), "A Coruña");
        assert_eq!(decode_document(b"A Coru\xf1a"), "A Coruña");
    }

    #[test]
    fn decodes_iso_8859_15_replacements() {
        assert_eq!(
            decode_document(b"10 \xa4 \xbd\xbc \xa6\xa8 \xb4\xb8 \xbe"),
            "10 € œŒ Šš Žž Ÿ"
        );
        assert_eq!(decode_document(b"\xa3\xb0"), "£°");
    }
}
