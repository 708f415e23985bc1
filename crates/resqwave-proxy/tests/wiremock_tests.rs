//! Integration tests for the OpenWeatherMap client using wiremock

use resqwave_proxy::{OpenWeatherClient, OpenWeatherConfig, ProxyError};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn sample_forecast() -> serde_json::Value {
    serde_json::json!({
        "cod": "200",
        "message": 0,
        "cnt": 2,
        "list": [
            {
                "dt": 1756684800,
                "main": {"temp": 27.4, "feels_like": 30.1, "pressure": 1009, "humidity": 84},
                "weather": [{"id": 501, "main": "Rain", "description": "moderate rain", "icon": "10n"}],
                "wind": {"speed": 5.2, "deg": 210},
                "pop": 0.92,
                "rain": {"3h": 6.75},
                "dt_txt": "2025-09-01 00:00:00"
            },
            {
                "dt": 1756695600,
                "main": {"temp": 28.9, "feels_like": 32.0, "pressure": 1008, "humidity": 79},
                "weather": [{"id": 804, "main": "Clouds", "description": "overcast clouds", "icon": "04d"}],
                "wind": {"speed": 4.1, "deg": 200},
                "pop": 0.4,
                "dt_txt": "2025-09-01 03:00:00"
            }
        ],
        "city": {"id": 1701668, "name": "Manila", "timezone": 28800}
    })
}

fn client_for(server: &MockServer) -> OpenWeatherClient {
    OpenWeatherClient::new(OpenWeatherConfig {
        base_url: server.uri(),
        api_key: "test-key".to_string(),
        timeout_secs: 5,
        units: "metric".to_string(),
    })
    .unwrap()
}

#[tokio::test]
async fn test_get_forecast_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("lat", "14.5995"))
        .and(query_param("lon", "120.9842"))
        .and(query_param("appid", "test-key"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_forecast()))
        .expect(1)
        .mount(&server)
        .await;

    let forecast = client_for(&server)
        .get_forecast(14.5995, 120.9842)
        .await
        .unwrap();

    assert_eq!(forecast.list.len(), 2);
    assert_eq!(forecast.list[0].rain_mm(), 6.75);
    assert_eq!(forecast.list[1].rain_mm(), 0.0);
    assert_eq!(forecast.city.unwrap().name, "Manila");
}

#[tokio::test]
async fn test_get_forecast_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "cod": 401,
            "message": "Invalid API key."
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).get_forecast(14.5, 121.0).await.unwrap_err();
    assert!(matches!(err, ProxyError::Unauthorized));
}

#[tokio::test]
async fn test_get_forecast_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = client_for(&server).get_forecast(14.5, 121.0).await.unwrap_err();
    assert!(matches!(err, ProxyError::RateLimited));
}

#[tokio::test]
async fn test_get_forecast_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = client_for(&server).get_forecast(14.5, 121.0).await.unwrap_err();
    match err {
        ProxyError::UpstreamError { status, message } => {
            assert_eq!(status, 502);
            assert_eq!(message, "bad gateway");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_get_forecast_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"list\": \"nope\"}"))
        .mount(&server)
        .await;

    let err = client_for(&server).get_forecast(14.5, 121.0).await.unwrap_err();
    assert!(matches!(err, ProxyError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_get_forecast_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"cod": "200", "list": []})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server).get_forecast(14.5, 121.0).await.unwrap_err();
    assert!(matches!(err, ProxyError::InvalidResponse(_)));
}
