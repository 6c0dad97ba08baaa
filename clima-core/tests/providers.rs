//! Provider tests against a mock HTTP server.

use clima_core::{
    Coordinate, WeatherProvider,
    provider::{openweather::OpenWeatherProvider, weatherapi::WeatherApiProvider},
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mexico_city() -> Coordinate {
    Coordinate::new(19.4326, -99.1332)
}

#[tokio::test]
async fn openweather_current_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("lat", "19.4326"))
        .and(query_param("lon", "-99.1332"))
        .and(query_param("appid", "KEY"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "Mexico City",
            "dt": 1760600000,
            "main": { "temp": 22.0, "feels_like": 21.3, "humidity": 40 },
            "weather": [{ "main": "Clear", "description": "clear sky", "icon": "01d" }],
            "wind": { "speed": 2.1 }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenWeatherProvider::with_base_url("KEY".into(), mock_server.uri());
    let reading = provider.current(mexico_city()).await.unwrap();

    assert_eq!(reading.condition, "Clear");
    assert_eq!(reading.message, "Nice day");
    assert_eq!(reading.icon, "sun");
    assert_eq!(reading.background, "bg_sun");
    assert_eq!(reading.celsius, 22.0);
}

#[tokio::test]
async fn openweather_without_conditions_is_unknown() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "main": { "temp": 4.0 },
            "weather": []
        })))
        .mount(&mock_server)
        .await;

    let provider = OpenWeatherProvider::with_base_url("KEY".into(), mock_server.uri());
    let reading = provider.current(mexico_city()).await.unwrap();

    assert_eq!(reading.condition, "Unknown");
    assert_eq!(reading.icon, "cloud");
    assert_eq!(reading.message, "Chilly out there");
}

#[tokio::test]
async fn openweather_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(
            ResponseTemplate::new(401).set_body_string("{\"message\":\"Invalid API key\"}"),
        )
        .mount(&mock_server)
        .await;

    let provider = OpenWeatherProvider::with_base_url("BAD".into(), mock_server.uri());
    let err = provider.current(mexico_city()).await.unwrap_err();

    let msg = err.to_string();
    assert!(msg.contains("401"), "{msg}");
    assert!(msg.contains("Invalid API key"), "{msg}");
}

#[tokio::test]
async fn openweather_malformed_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let provider = OpenWeatherProvider::with_base_url("KEY".into(), mock_server.uri());
    let err = provider.current(mexico_city()).await.unwrap_err();

    assert!(err.to_string().contains("Failed to parse OpenWeather current JSON"));
}

#[tokio::test]
async fn weatherapi_current_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .and(query_param("key", "KEY"))
        .and(query_param("q", "19.4326,-99.1332"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "location": { "name": "Mexico City", "country": "Mexico" },
            "current": {
                "temp_c": 14.6,
                "condition": { "text": "Patchy rain possible", "code": 1063 }
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let base_url = format!("{}/", mock_server.uri());
    let provider = WeatherApiProvider::with_base_url("KEY".into(), base_url);
    let reading = provider.current(mexico_city()).await.unwrap();

    assert_eq!(reading.condition, "Patchy rain possible");
    assert_eq!(reading.icon, "rain");
    assert_eq!(reading.background, "bg_rain");
    assert_eq!(reading.message, "Grab a light jacket");
    assert_eq!(reading.celsius, 14.6);
}

#[tokio::test]
async fn weatherapi_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/current.json"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&mock_server)
        .await;

    let provider = WeatherApiProvider::with_base_url("KEY".into(), mock_server.uri());
    let err = provider.current(mexico_city()).await.unwrap_err();

    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn unreachable_server_is_an_error() {
    // Nothing listens on the discard port.
    let provider = OpenWeatherProvider::with_base_url("KEY".into(), "http://127.0.0.1:9".into());
    let err = provider.current(mexico_city()).await.unwrap_err();

    assert!(err.to_string().contains("Failed to send request to OpenWeather"));
}
