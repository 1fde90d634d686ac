use async_trait::async_trait;
use mockall::mock;
use std::sync::Arc;
use tempo::{
    Assistant, DeliveryError, FetchError, ForecastMode, ForecastService, ForecastSource,
    PlaceDirectory, PlaceRecord, PlaceTable, RenderOptions, Report, ReportSink,
};

pub const DAILY_XML: &str = include_str!("../fixtures/localidad_15030.xml");
pub const HOURLY_XML: &str = include_str!("../fixtures/localidad_h_15030.xml");

mock! {
    pub ForecastSource {}
    #[async_trait]
    impl ForecastSource for ForecastSource {
        async fn fetch_document(&self, place_code: &str, mode: ForecastMode) -> Result<String, FetchError>;
    }
}

mock! {
    pub ReportSink {}
    #[async_trait]
    impl ReportSink for ReportSink {
        async fn deliver(&self, report: &Report) -> Result<(), DeliveryError>;
    }
}

pub fn logger() -> slog::Logger {
    slog::Logger::root(slog::Discard, slog::o!())
}

pub fn places() -> PlaceDirectory {
    let galicia = PlaceTable {
        name: String::from("concellos"),
        threshold: 0.8,
        case_sensitive: true,
        records: [
            ("15030", "A Coruña"),
            ("15036", "Ferrol"),
            ("27028", "Lugo"),
            ("32054", "Ourense"),
            ("36038", "Pontevedra"),
            ("36057", "Vigo"),
        ]
        .iter()
        .map(|(code, name)| PlaceRecord {
            code: code.to_string(),
            name: name.to_string(),
        })
        .collect(),
    };
    PlaceDirectory::new(logger(), vec![Arc::new(galicia)])
}

pub fn assistant(source: MockForecastSource) -> Assistant {
    let forecasts = ForecastService::new(logger(), Arc::new(source));
    Assistant::new(logger(), places(), forecasts, RenderOptions::default())
}

/// The fixture as the feed serves it, ISO-8859-15 rather than UTF-8.
pub fn iso_8859_15(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '€' => 0xA4,
            'Š' => 0xA6,
            'š' => 0xA8,
            'Ž' => 0xB4,
            'ž' => 0xB8,
            'Œ' => 0xBC,
            'œ' => 0xBD,
            'Ÿ' => 0xBE,
            other => u8::try_from(other as u32).unwrap_or(b'?'),
        })
        .collect()
}
