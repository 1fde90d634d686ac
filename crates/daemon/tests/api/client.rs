use crate::helpers::{iso_8859_15, logger, DAILY_XML, HOURLY_XML};
use serde_json::json;
use std::{sync::Arc, time::Duration};
use tempo::{
    AemetClient, DeliveryError, FetchError, ForecastMode, ForecastRecord, ForecastService,
    ForecastSource, Report, ReportSink, WebhookSink,
};
use time::macros::date;
use wiremock::{
    matchers::{body_json, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn client(server: &MockServer) -> AemetClient {
    AemetClient::new(logger(), &server.uri(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn decodes_iso_8859_15_daily_feed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/xml/municipios/localidad_15030.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(iso_8859_15(DAILY_XML)))
        .expect(1)
        .mount(&server)
        .await;

    let xml = client(&server)
        .fetch_document("15030", ForecastMode::Daily)
        .await
        .unwrap();

    assert!(xml.contains("<nombre>A Coruña</nombre>"));
}

#[tokio::test]
async fn service_normalizes_fetched_hourly_feed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/xml/municipios_h/localidad_h_15030.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(HOURLY_XML))
        .expect(1)
        .mount(&server)
        .await;

    let service = ForecastService::new(logger(), Arc::new(client(&server)));
    let record = service
        .forecast("15030", ForecastMode::Hourly, date!(2024 - 03 - 05))
        .await
        .unwrap();

    let ForecastRecord::Hourly(hourly) = record else {
        panic!("expected hourly record");
    };
    assert_eq!(hourly.location, "A Coruña");
    assert_eq!(hourly.sunrise, "08:12");
}

#[tokio::test]
async fn error_status_is_a_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client(&server)
        .fetch_document("99999", ForecastMode::Daily)
        .await
        .unwrap_err();

    match err {
        FetchError::Status { status, url } => {
            assert_eq!(status.as_u16(), 404);
            assert!(url.ends_with("/xml/municipios/localidad_99999.xml"));
        }
        other => panic!("expected status error, got {}", other),
    }
}

#[tokio::test]
async fn webhook_posts_chat_and_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/reports"))
        .and(body_json(json!({"chat_id": "42", "text": "Bo día"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let sink = WebhookSink::new(
        logger(),
        &format!("{}/reports", server.uri()),
        Duration::from_secs(5),
    )
    .unwrap();
    let report = Report {
        place: String::from("Vigo"),
        chat_id: Some(String::from("42")),
        text: String::from("Bo día"),
    };

    sink.deliver(&report).await.unwrap();
}

#[tokio::test]
async fn webhook_error_status_fails_delivery() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let sink = WebhookSink::new(logger(), &server.uri(), Duration::from_secs(5)).unwrap();
    let report = Report {
        place: String::from("Vigo"),
        chat_id: None,
        text: String::from("Bo día"),
    };

    let err = sink.deliver(&report).await.unwrap_err();
    assert!(matches!(err, DeliveryError::Status { status } if status.as_u16() == 500));
}
