//! Integration tests for WeatherCache against a mock OpenWeatherMap server.

use std::sync::Arc;
use std::time::Duration;

use velo_geo::{Coordinate, ManualClock};
use velo_weather::{synthetic_weather, ConditionTag, WeatherCache, WeatherError, WeatherSettings};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const T0: i64 = 1_700_000_000_000;
const FIFTEEN_MINUTES: i64 = 15 * 60 * 1000;

fn current_body(temp: f64, id: i32, description: &str) -> serde_json::Value {
    serde_json::json!({
        "main": { "temp": temp, "feels_like": temp - 1.0, "humidity": 55 },
        "wind": { "speed": 4.0, "deg": 90 },
        "weather": [{ "id": id, "description": description, "icon": "01d" }],
        "visibility": 10000
    })
}

fn settings(server: &MockServer) -> WeatherSettings {
    WeatherSettings {
        base_url: server.uri(),
        api_key: Some("test-key".to_string()),
        request_timeout: Duration::from_millis(500),
        ..WeatherSettings::default()
    }
}

fn cache(server: &MockServer) -> (WeatherCache, ManualClock) {
    let clock = ManualClock::new(T0);
    let cache = WeatherCache::with_clock(&settings(server), Arc::new(clock.clone())).unwrap();
    (cache, clock)
}

#[tokio::test]
async fn test_fetch_then_serve_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("lat", "45.5"))
        .and(query_param("lon", "-73.6"))
        .and(query_param("appid", "test-key"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body(15.0, 800, "clear sky")))
        .expect(1)
        .mount(&server)
        .await;

    let (cache, _) = cache(&server);
    let here = Coordinate::new(45.5, -73.6);

    assert!(cache.should_fetch(&here));
    let first = cache.get(&here).await;
    assert_eq!(first.temperature_c, 15);
    assert_eq!(first.wind_speed_kmh, 14);
    assert_eq!(first.condition, ConditionTag::Perfect);
    assert!(!cache.should_fetch(&here));

    let second = cache.get(&here).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_refetch_after_expiry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body(15.0, 800, "clear sky")))
        .expect(2)
        .mount(&server)
        .await;

    let (cache, clock) = cache(&server);
    let here = Coordinate::new(45.5, -73.6);
    cache.get(&here).await;
    clock.advance(FIFTEEN_MINUTES + 1);
    assert!(cache.should_fetch(&here));
    cache.get(&here).await;
}

#[tokio::test]
async fn test_server_error_without_cache_is_synthetic() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (cache, _) = cache(&server);
    let weather = cache.get(&Coordinate::new(45.5, -73.6)).await;
    assert_eq!(weather, synthetic_weather());
    // Fallback data is not cached, so the next call retries
    assert!(cache.entry().is_none());
}

#[tokio::test]
async fn test_failure_falls_back_to_stale_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body(3.0, 501, "moderate rain")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (cache, clock) = cache(&server);
    let here = Coordinate::new(45.5, -73.6);
    let fresh = cache.get(&here).await;
    assert_eq!(fresh.condition, ConditionTag::Rainy);

    clock.advance(FIFTEEN_MINUTES * 2);
    let stale = cache.get(&here).await;
    assert_eq!(stale, fresh);
    assert!(cache.cached().is_none());
}

#[tokio::test]
async fn test_malformed_payload_is_synthetic() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"main\": \"nope\"}"))
        .mount(&server)
        .await;

    let (cache, _) = cache(&server);
    assert_eq!(cache.get(&Coordinate::new(0.0, 0.0)).await, synthetic_weather());
}

#[tokio::test]
async fn test_timeout_is_synthetic() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(current_body(15.0, 800, "clear sky"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let (cache, _) = cache(&server);
    assert_eq!(cache.get(&Coordinate::new(0.0, 0.0)).await, synthetic_weather());
}

#[tokio::test]
async fn test_concurrent_misses_share_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(current_body(20.0, 803, "broken clouds"))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (cache, _) = cache(&server);
    let here = Coordinate::new(45.5, -73.6);
    let (a, b, c) = tokio::join!(cache.get(&here), cache.get(&here), cache.get(&here));
    assert_eq!(a.condition, ConditionTag::Good);
    assert_eq!(a, b);
    assert_eq!(b, c);
}

#[tokio::test]
async fn test_force_refresh_bypasses_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body(28.0, 800, "clear sky")))
        .expect(2)
        .mount(&server)
        .await;

    let (cache, _) = cache(&server);
    let here = Coordinate::new(45.5, -73.6);
    cache.get(&here).await;
    let refreshed = cache.force_refresh(&here).await.unwrap();
    assert_eq!(refreshed.condition, ConditionTag::Hot);
}

#[tokio::test]
async fn test_force_refresh_surfaces_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
        .mount(&server)
        .await;

    let (cache, _) = cache(&server);
    let err = cache.force_refresh(&Coordinate::new(0.0, 0.0)).await.unwrap_err();
    match err {
        WeatherError::Status { status, message } => {
            assert_eq!(status, 401);
            assert!(message.contains("invalid key"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_forecast_parsing() {
    let server = MockServer::start().await;
    let list: Vec<serde_json::Value> = (0..10)
        .map(|i| {
            serde_json::json!({
                "dt": 1_700_000_000 + i * 10_800,
                "main": { "temp": 12.4, "feels_like": 11.0, "humidity": 70 },
                "wind": { "speed": 2.5, "deg": 45 },
                "weather": [{ "id": 500, "description": "light rain", "icon": "10d" }],
                "pop": 0.35
            })
        })
        .collect();
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "list": list })))
        .mount(&server)
        .await;

    let (cache, _) = cache(&server);
    let forecast = cache.forecast(&Coordinate::new(45.5, -73.6)).await;
    assert_eq!(forecast.len(), 8);
    assert_eq!(forecast[0].temperature_c, 12);
    assert_eq!(forecast[0].wind_speed_kmh, 9);
    assert_eq!(forecast[0].condition, ConditionTag::Rainy);
    assert!((forecast[0].precipitation_pct - 35.0).abs() < 1e-9);
    assert_eq!(forecast[1].time.timestamp(), 1_700_010_800);
}

#[tokio::test]
async fn test_forecast_failure_is_synthetic() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let (cache, _) = cache(&server);
    let forecast = cache.forecast(&Coordinate::new(45.5, -73.6)).await;
    assert_eq!(forecast.len(), 8);
    assert!(forecast.iter().all(|entry| entry.condition == ConditionTag::Good));
}
