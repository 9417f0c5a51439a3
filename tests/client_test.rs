//! Integration tests for the request pipeline against a mock backend.
//!
//! Covers deduplication, caching, throttling, retry with backoff and status
//! classification of [`ApiClient::request`].

mod common;

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use euk::core::{ApiClient, RequestOptions};
use euk::error::EukError;
use euk::test_utils::{TEST_TOKEN, make_test_client, make_test_client_config};

use common::logger::TestLogger;

fn kategorije_body() -> serde_json::Value {
    json!([{"kategorijaId": 1, "naziv": "Energetski ugroženi"}])
}

// =============================================================================
// Deduplication
// =============================================================================

#[tokio::test]
async fn concurrent_identical_requests_share_one_network_call() {
    let log = TestLogger::new("concurrent_identical_requests_share_one_network_call");
    log.phase("setup");

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/euk/kategorije"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(kategorije_body())
                .set_delay(Duration::from_millis(150)),
        )
        .expect(1)
        .mount(&server)
        .await;

    log.phase("test");
    let client = make_test_client(&server.uri());
    let (a, b, c) = tokio::join!(
        client.request("/api/euk/kategorije", RequestOptions::get(), Some(TEST_TOKEN)),
        client.request("/api/euk/kategorije", RequestOptions::get(), Some(TEST_TOKEN)),
        client.request("/api/euk/kategorije", RequestOptions::get(), Some(TEST_TOKEN)),
    );

    let a = a.unwrap();
    assert_eq!(a, b.unwrap());
    assert_eq!(a, c.unwrap());
    assert_eq!(client.pending_requests(), 0);
    log.finish_ok();
}

#[tokio::test]
async fn joined_callers_observe_the_same_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/routes"))
        .respond_with(ResponseTemplate::new(404).set_delay(Duration::from_millis(100)))
        .expect(1)
        .mount(&server)
        .await;

    let client = make_test_client(&server.uri());
    let (a, b) = tokio::join!(
        client.request("/api/routes", RequestOptions::get(), Some(TEST_TOKEN)),
        client.request("/api/routes", RequestOptions::get(), Some(TEST_TOKEN)),
    );

    assert!(matches!(a.unwrap_err(), EukError::NotFound { .. }));
    assert!(matches!(b.unwrap_err(), EukError::NotFound { .. }));
    assert_eq!(client.pending_requests(), 0);
}

#[tokio::test]
async fn writes_with_different_bodies_are_not_merged() {
    let server = MockServer::start().await;
    for naziv in ["Prva", "Druga"] {
        Mock::given(method("POST"))
            .and(path("/api/euk/kategorije"))
            .and(body_json(json!({ "naziv": naziv })))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({ "kategorijaId": 9, "naziv": naziv }))
                    .set_delay(Duration::from_millis(50)),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = make_test_client(&server.uri());
    let (a, b) = tokio::join!(
        client.request(
            "/api/euk/kategorije",
            RequestOptions::post(json!({ "naziv": "Prva" })),
            Some(TEST_TOKEN)
        ),
        client.request(
            "/api/euk/kategorije",
            RequestOptions::post(json!({ "naziv": "Druga" })),
            Some(TEST_TOKEN)
        ),
    );

    assert_eq!(a.unwrap()["naziv"], "Prva");
    assert_eq!(b.unwrap()["naziv"], "Druga");
}

#[tokio::test]
async fn concurrent_identical_writes_share_one_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/euk/kategorije"))
        .and(body_json(json!({ "naziv": "Prva" })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "kategorijaId": 9, "naziv": "Prva" }))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = make_test_client(&server.uri());
    let write = || {
        client.request(
            "/api/euk/kategorije",
            RequestOptions::post(json!({ "naziv": "Prva" })),
            Some(TEST_TOKEN),
        )
    };
    let (a, b) = tokio::join!(write(), write());

    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(client.pending_requests(), 0);
}

// =============================================================================
// Caching
// =============================================================================

#[tokio::test]
async fn cached_get_is_served_without_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/euk/kategorije"))
        .respond_with(ResponseTemplate::new(200).set_body_json(kategorije_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = make_test_client(&server.uri());
    let options = || RequestOptions::get().cached(Duration::from_secs(60));

    let first = client
        .request("/api/euk/kategorije", options(), Some(TEST_TOKEN))
        .await
        .unwrap();
    let second = client
        .request("/api/euk/kategorije", options(), Some(TEST_TOKEN))
        .await
        .unwrap();

    assert_eq!(first, second);
    let stats = client.cache_stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.entries, 1);
}

#[tokio::test]
async fn expired_cache_entry_refetches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/routes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let client = make_test_client(&server.uri());
    let options = || RequestOptions::get().cached(Duration::from_millis(50));

    client.request("/api/routes", options(), Some(TEST_TOKEN)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(80)).await;
    client.request("/api/routes", options(), Some(TEST_TOKEN)).await.unwrap();
}

#[tokio::test]
async fn invalidation_by_substring_forces_refetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"users": []})))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/routes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = make_test_client(&server.uri());
    let options = || RequestOptions::get().cached(Duration::from_secs(60));

    client.request("/api/admin/users", options(), Some(TEST_TOKEN)).await.unwrap();
    client.request("/api/routes", options(), Some(TEST_TOKEN)).await.unwrap();

    assert_eq!(client.invalidate("users"), 1);

    client.request("/api/admin/users", options(), Some(TEST_TOKEN)).await.unwrap();
    client.request("/api/routes", options(), Some(TEST_TOKEN)).await.unwrap();
}

#[tokio::test]
async fn cache_is_partitioned_by_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/euk/kategorije"))
        .respond_with(ResponseTemplate::new(200).set_body_json(kategorije_body()))
        .expect(2)
        .mount(&server)
        .await;

    let client = make_test_client(&server.uri());
    let options = || RequestOptions::get().cached(Duration::from_secs(60));

    client
        .request("/api/euk/kategorije", options(), Some("aaaaaaaaaa-first"))
        .await
        .unwrap();
    client
        .request("/api/euk/kategorije", options(), Some("bbbbbbbbbb-second"))
        .await
        .unwrap();
}

#[tokio::test]
async fn failed_requests_are_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/euk/predmeti"))
        .respond_with(ResponseTemplate::new(403))
        .expect(2)
        .mount(&server)
        .await;

    let client = make_test_client(&server.uri());
    for _ in 0..2 {
        let err = client
            .request(
                "/api/euk/predmeti",
                RequestOptions::get().cached(Duration::from_secs(60)),
                Some(TEST_TOKEN),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EukError::Forbidden { .. }));
    }
    assert_eq!(client.cache_stats().entries, 0);
}

// =============================================================================
// Throttling
// =============================================================================

#[tokio::test]
async fn network_requests_are_spaced_by_min_interval() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let config = make_test_client_config(&server.uri()).with_min_interval(Duration::from_millis(200));
    let client = ApiClient::new(config).unwrap();

    let started = Instant::now();
    client.request("/api/routes", RequestOptions::get(), Some(TEST_TOKEN)).await.unwrap();
    client.request("/api/euk/kategorije", RequestOptions::get(), Some(TEST_TOKEN)).await.unwrap();
    client.request("/api/euk/predmeti", RequestOptions::get(), Some(TEST_TOKEN)).await.unwrap();

    assert!(started.elapsed() >= Duration::from_millis(400));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_to_different_paths_arrive_spaced() {
    let log = TestLogger::new("concurrent_requests_to_different_paths_arrive_spaced");
    let interval = Duration::from_millis(250);
    // Arrival jitter on loopback is well below this slack.
    let slack = Duration::from_millis(50);

    let arrivals = Arc::new(Mutex::new(Vec::<(String, Instant)>::new()));
    let server = MockServer::start().await;
    let recorded = Arc::clone(&arrivals);
    Mock::given(method("GET"))
        .respond_with(move |req: &wiremock::Request| {
            recorded
                .lock()
                .unwrap()
                .push((req.url.path().to_string(), Instant::now()));
            ResponseTemplate::new(200).set_body_json(json!([]))
        })
        .expect(4)
        .mount(&server)
        .await;

    let config = make_test_client_config(&server.uri()).with_min_interval(interval);
    let client = ApiClient::new(config).unwrap();

    log.phase("issue");
    let (a, b, c, d) = tokio::join!(
        client.request("/api/routes", RequestOptions::get(), Some(TEST_TOKEN)),
        client.request("/api/euk/kategorije", RequestOptions::get(), Some(TEST_TOKEN)),
        client.request("/api/euk/predmeti", RequestOptions::get(), Some(TEST_TOKEN)),
        client.request("/api/admin/users", RequestOptions::get(), Some("another-token-value")),
    );
    for result in [a, b, c, d] {
        result.unwrap();
    }

    let mut arrivals = arrivals.lock().unwrap().clone();
    arrivals.sort_by_key(|(_, at)| *at);
    assert_eq!(arrivals.len(), 4);
    for pair in arrivals.windows(2) {
        let gap = pair[1].1.duration_since(pair[0].1);
        log.debug(&format!("{} -> {}: {gap:?}", pair[0].0, pair[1].0));
        assert!(
            gap + slack >= interval,
            "{} arrived {gap:?} after {}",
            pair[1].0,
            pair[0].0
        );
    }
    log.finish_ok();
}

#[tokio::test]
async fn cache_hits_skip_the_throttle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/routes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let config = make_test_client_config(&server.uri()).with_min_interval(Duration::from_millis(500));
    let client = ApiClient::new(config).unwrap();
    let options = || RequestOptions::get().cached(Duration::from_secs(60));

    client.request("/api/routes", options(), Some(TEST_TOKEN)).await.unwrap();
    let started = Instant::now();
    client.request("/api/routes", options(), Some(TEST_TOKEN)).await.unwrap();
    assert!(started.elapsed() < Duration::from_millis(250));
}

// =============================================================================
// Retry
// =============================================================================

#[tokio::test]
async fn server_errors_exhaust_retries_then_fail() {
    let log = TestLogger::new("server_errors_exhaust_retries_then_fail");
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/euk/predmeti"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let client = make_test_client(&server.uri());
    let err = client
        .request("/api/euk/predmeti", RequestOptions::get().retries(2), Some(TEST_TOKEN))
        .await
        .unwrap_err();
    log.http("GET", "/api/euk/predmeti", 500);

    match err {
        EukError::ServerError { url, status, attempts } => {
            assert_eq!(status, 500);
            assert_eq!(attempts, 3);
            assert!(url.ends_with("/api/euk/predmeti"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    log.finish_ok();
}

#[tokio::test]
async fn transient_failure_recovers_within_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/euk/kategorije"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/euk/kategorije"))
        .respond_with(ResponseTemplate::new(200).set_body_json(kategorije_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = make_test_client(&server.uri());
    let value = client
        .request("/api/euk/kategorije", RequestOptions::get(), Some(TEST_TOKEN))
        .await
        .unwrap();
    assert_eq!(value, kategorije_body());
}

#[tokio::test]
async fn rate_limit_is_retried_and_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/routes"))
        .respond_with(ResponseTemplate::new(429))
        .expect(2)
        .mount(&server)
        .await;

    let client = make_test_client(&server.uri());
    let err = client
        .request("/api/routes", RequestOptions::get().retries(1), Some(TEST_TOKEN))
        .await
        .unwrap_err();
    assert!(matches!(err, EukError::RateLimited { attempts: 2, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn client_errors_are_never_retried() {
    for (status, expected) in [(401_u16, "EUK-A"), (403, "EUK-Z"), (404, "EUK-F"), (400, "EUK-")] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/euk/predmeti/7"))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_test_client(&server.uri());
        let err = client
            .request("/api/euk/predmeti/7", RequestOptions::get().retries(3), Some(TEST_TOKEN))
            .await
            .unwrap_err();
        assert!(err.error_code().starts_with(expected), "{status}: {}", err.error_code());
        assert_eq!(err.status(), Some(status));
    }
}

#[tokio::test]
async fn backend_message_surfaces_on_other_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/global-license/create"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({"message": "Licenca već postoji"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = make_test_client(&server.uri());
    let err = client
        .request(
            "/api/global-license/create",
            RequestOptions::post(json!({})),
            Some(TEST_TOKEN),
        )
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Licenca već postoji");
}

// =============================================================================
// Request shape and body parsing
// =============================================================================

#[tokio::test]
async fn bearer_token_and_json_content_type_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/euk/kategorije"))
        .and(header("authorization", format!("Bearer {TEST_TOKEN}").as_str()))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(kategorije_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = make_test_client(&server.uri());
    client
        .request("/api/euk/kategorije", RequestOptions::get(), Some(TEST_TOKEN))
        .await
        .unwrap();
}

#[tokio::test]
async fn empty_token_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = make_test_client(&server.uri());
    let err = client
        .request("/api/euk/kategorije", RequestOptions::get(), Some("  "))
        .await
        .unwrap_err();
    assert!(matches!(err, EukError::Validation { .. }));
}

#[tokio::test]
async fn malformed_json_is_reported_with_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/euk/kategorije"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = make_test_client(&server.uri());
    let err = client
        .request("/api/euk/kategorije", RequestOptions::get(), Some(TEST_TOKEN))
        .await
        .unwrap_err();
    match err {
        EukError::InvalidJson { url, .. } => assert!(url.ends_with("/api/euk/kategorije")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn typed_request_rejects_wrong_shape() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/euk/kategorije"))
        .respond_with(ResponseTemplate::new(200).set_body_json(kategorije_body()))
        .mount(&server)
        .await;

    let client = make_test_client(&server.uri());
    let names: Vec<euk::core::models::Kategorija> = client
        .request_as("/api/euk/kategorije", RequestOptions::get(), Some(TEST_TOKEN))
        .await
        .unwrap();
    assert_eq!(names[0].naziv, "Energetski ugroženi");

    let err = client
        .request_as::<Vec<String>>("/api/euk/kategorije", RequestOptions::get(), Some(TEST_TOKEN))
        .await
        .unwrap_err();
    assert!(matches!(err, EukError::InvalidJson { .. }));
}

#[tokio::test]
async fn no_content_is_null_but_empty_ok_body_is_invalid_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/admin/users/5/approve"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/admin/users/5/role"))
        .respond_with(ResponseTemplate::new(201).set_body_string("  \n"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/euk/kategorije/3"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = make_test_client(&server.uri());
    let deleted = client
        .request("/api/euk/kategorije/3", RequestOptions::delete(), Some(TEST_TOKEN))
        .await
        .unwrap();
    assert!(deleted.is_null());

    let err = client
        .request("/api/admin/users/5/approve", RequestOptions::post_empty(), Some(TEST_TOKEN))
        .await
        .unwrap_err();
    assert!(matches!(err, EukError::InvalidJson { .. }), "{err:?}");

    let err = client
        .request(
            "/api/admin/users/5/role",
            RequestOptions::put(json!({"role": "ADMIN"})),
            Some(TEST_TOKEN),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EukError::InvalidJson { .. }), "{err:?}");
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let client = make_test_client("http://127.0.0.1:1");
    let err = client
        .request("/api/routes", RequestOptions::get(), Some(TEST_TOKEN))
        .await
        .unwrap_err();
    assert!(matches!(err, EukError::Network { .. }), "{err:?}");
    assert!(err.is_backend_failure());
}

#[tokio::test]
async fn slow_backend_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let config = make_test_client_config(&server.uri()).with_timeout(Duration::from_secs(1));
    let client = ApiClient::new(config).unwrap();
    let err = client
        .request("/api/routes", RequestOptions::get(), Some(TEST_TOKEN))
        .await
        .unwrap_err();
    assert!(matches!(err, EukError::Timeout { seconds: 1, .. }), "{err:?}");
}
