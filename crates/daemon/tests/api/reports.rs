use crate::helpers::{assistant, logger, MockForecastSource, MockReportSink, DAILY_XML, HOURLY_XML};
use chrono::{DateTime, NaiveTime, Utc};
use reqwest::StatusCode;
use std::sync::Arc;
use tempo::{
    DailyReports, DeliveryError, FetchError, ForecastError, ForecastMode, ReportError,
    ReportOutcome, Subscription,
};
use time::macros::date;

fn subscription(place: &str, chat_id: Option<&str>) -> Subscription {
    Subscription {
        place: place.to_string(),
        mode: ForecastMode::Daily,
        day_offset: 1,
        chat_id: chat_id.map(str::to_string),
    }
}

fn at_eight_in_madrid() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-03-05T07:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

#[tokio::test]
async fn misspelt_place_gets_daily_report() {
    let mut source = MockForecastSource::new();
    source
        .expect_fetch_document()
        .withf(|code, mode| code == "15030" && *mode == ForecastMode::Daily)
        .times(1)
        .returning(|_, _| Ok(DAILY_XML.to_string()));

    let outcome = assistant(source)
        .daily_report("Corua", date!(2024 - 03 - 06))
        .await
        .unwrap();

    let ReportOutcome::Report(text) = outcome else {
        panic!("expected a report");
    };
    assert!(text.starts_with("Predición para A Coruña (A Coruña).\n2024-03-06\n"));
    assert!(text.contains("Pola mañá: Cuberto con choiva\n"));
    assert!(text.contains("Pola mañá: 100%\n"));
}

#[tokio::test]
async fn hourly_report_goes_to_the_hourly_feed() {
    let mut source = MockForecastSource::new();
    source
        .expect_fetch_document()
        .withf(|code, mode| code == "36057" && *mode == ForecastMode::Hourly)
        .times(1)
        .returning(|_, _| Ok(HOURLY_XML.to_string()));

    let outcome = assistant(source)
        .hourly_report("Vigo", date!(2024 - 03 - 05), 7)
        .await
        .unwrap();

    assert!(outcome.text().contains("Predición para as 7h ata as 13h\n"));
    assert!(outcome.text().contains("Espérase choiva:\n\tÁs 8h\n"));
}

#[tokio::test]
async fn unknown_place_never_fetches() {
    let mut source = MockForecastSource::new();
    source.expect_fetch_document().never();

    let outcome = assistant(source)
        .daily_report("Qwxyzabc", date!(2024 - 03 - 06))
        .await
        .unwrap();

    assert_eq!(outcome, ReportOutcome::PlaceNotFound);
    assert_eq!(outcome.text(), "Non se atopou o concello.");
}

#[tokio::test]
async fn fetch_failure_is_reported() {
    let mut source = MockForecastSource::new();
    source.expect_fetch_document().times(1).returning(|_, _| {
        Err(FetchError::Status {
            status: StatusCode::NOT_FOUND,
            url: String::from("http://localhost/xml/municipios/localidad_27028.xml"),
        })
    });

    let err = assistant(source)
        .daily_report("Lugo", date!(2024 - 03 - 06))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ReportError::Forecast(ForecastError::Fetch(FetchError::Status { .. }))
    ));
}

#[tokio::test]
async fn day_outside_feed_is_not_found() {
    let mut source = MockForecastSource::new();
    source
        .expect_fetch_document()
        .times(1)
        .returning(|_, _| Ok(DAILY_XML.to_string()));

    let err = assistant(source)
        .daily_report("A Coruña", date!(2024 - 03 - 20))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ReportError::Forecast(ForecastError::NotFound(d)) if d == date!(2024 - 03 - 20)
    ));
}

#[tokio::test]
async fn daily_reports_skip_failing_subscriptions() {
    let mut source = MockForecastSource::new();
    source
        .expect_fetch_document()
        .times(1)
        .returning(|_, _| Ok(DAILY_XML.to_string()));

    let mut sink = MockReportSink::new();
    sink.expect_deliver()
        .withf(|report| {
            report.place == "A Coruña"
                && report.chat_id.as_deref() == Some("42")
                && report.text.contains("2024-03-06")
        })
        .times(1)
        .returning(|_| Ok(()));

    let reports = DailyReports::new(
        logger(),
        Arc::new(assistant(source)),
        Arc::new(sink),
        vec![
            subscription("Qwxyzabc", None),
            subscription("A Coruña", Some("42")),
        ],
        NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        chrono_tz::Europe::Madrid,
    );

    assert_eq!(reports.send_all(at_eight_in_madrid()).await, 1);
}

#[tokio::test]
async fn delivery_failure_does_not_stop_other_reports() {
    let mut source = MockForecastSource::new();
    source
        .expect_fetch_document()
        .times(2)
        .returning(|_, _| Ok(DAILY_XML.to_string()));

    let mut sink = MockReportSink::new();
    sink.expect_deliver()
        .withf(|report| report.place == "Ferrol")
        .times(1)
        .returning(|_| {
            Err(DeliveryError::Status {
                status: StatusCode::BAD_GATEWAY,
            })
        });
    sink.expect_deliver()
        .withf(|report| report.place == "Vigo")
        .times(1)
        .returning(|_| Ok(()));

    let reports = DailyReports::new(
        logger(),
        Arc::new(assistant(source)),
        Arc::new(sink),
        vec![subscription("Ferrol", None), subscription("Vigo", None)],
        NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        chrono_tz::Europe::Madrid,
    );

    assert_eq!(reports.send_all(at_eight_in_madrid()).await, 1);
}
