//! Integration tests for ordered search strategy resolution

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mindat_downloader::config::SearchStrategy;
use mindat_downloader::http::TransportError;
use mindat_downloader::record_id;

use crate::support;

#[tokio::test]
async fn first_productive_strategy_wins() {
    let server = MockServer::start().await;

    // ltype=60 finds nothing for this country.
    Mock::given(method("GET"))
        .and(path("/localities/"))
        .and(query_param("country", "Iran"))
        .and(query_param("ltype", "60"))
        .respond_with(ResponseTemplate::new(200).set_body_json(support::envelope(&[], 0, None)))
        .expect(1)
        .mount(&server)
        .await;

    // The txt fallback does.
    let records: Vec<_> = (1..=3).map(|id| support::locality(id, "Mine")).collect();
    Mock::given(method("GET"))
        .and(path("/localities/"))
        .and(query_param("country", "Iran"))
        .and(query_param("txt", "Mine"))
        .respond_with(ResponseTemplate::new(200).set_body_json(support::envelope(&records, 3, None)))
        .expect(1)
        .mount(&server)
        .await;

    let config = support::test_config(&server.uri(), 100);
    let repo = support::test_repo(&config);

    let results = support::drain(repo.stream_country_mines("Iran")).await;

    assert_eq!(results.len(), 3);
    let ids: Vec<u64> = results
        .iter()
        .map(|r| record_id(r.as_ref().unwrap()).unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn strategies_after_the_winner_are_never_tried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/localities/"))
        .and(query_param("ltype", "60"))
        .respond_with(ResponseTemplate::new(200).set_body_json(support::envelope(&[], 0, None)))
        .expect(1)
        .mount(&server)
        .await;

    let records = vec![support::locality(9, "Winning Mine")];
    Mock::given(method("GET"))
        .and(path("/localities/"))
        .and(query_param("txt", "Mine"))
        .respond_with(ResponseTemplate::new(200).set_body_json(support::envelope(&records, 1, None)))
        .expect(1)
        .mount(&server)
        .await;

    // The third strategy must never reach the wire.
    Mock::given(method("GET"))
        .and(path("/localities/"))
        .and(query_param("description", "Mine"))
        .respond_with(ResponseTemplate::new(200).set_body_json(support::envelope(&[], 0, None)))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = support::test_config(&server.uri(), 100);
    config.search_strategies = vec![
        SearchStrategy::new("ltype", 60),
        SearchStrategy::new("txt", "Mine"),
        SearchStrategy::new("description", "Mine"),
    ];
    let repo = support::test_repo(&config);

    let results = support::drain(repo.stream_country_mines("Iran")).await;

    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn exhausted_strategies_yield_an_empty_stream() {
    let server = MockServer::start().await;

    for (param, value) in [("ltype", "60"), ("txt", "Mine")] {
        Mock::given(method("GET"))
            .and(path("/localities/"))
            .and(query_param(param, value))
            .respond_with(ResponseTemplate::new(200).set_body_json(support::envelope(&[], 0, None)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let config = support::test_config(&server.uri(), 100);
    let repo = support::test_repo(&config);

    let results = support::drain(repo.stream_country_mines("Nowhere")).await;

    assert!(results.is_empty());
}

#[tokio::test]
async fn probe_failure_is_fatal_not_a_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/localities/"))
        .and(query_param("ltype", "60"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    // A failing strategy must not be papered over by the next one.
    Mock::given(method("GET"))
        .and(path("/localities/"))
        .and(query_param("txt", "Mine"))
        .respond_with(ResponseTemplate::new(200).set_body_json(support::envelope(&[], 0, None)))
        .expect(0)
        .mount(&server)
        .await;

    let config = support::test_config(&server.uri(), 100);
    let repo = support::test_repo(&config);

    let results = support::drain(repo.stream_country_mines("Iran")).await;

    assert_eq!(results.len(), 1);
    assert!(matches!(
        results[0],
        Err(TransportError::Status { status: 404, .. })
    ));
}

#[tokio::test]
async fn winning_strategy_streams_all_its_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/localities/"))
        .and(query_param("ltype", "60"))
        .respond_with(ResponseTemplate::new(200).set_body_json(support::envelope(&[], 0, None)))
        .expect(1)
        .mount(&server)
        .await;

    let page1: Vec<_> = (1..=2).map(|id| support::locality(id, "Mine")).collect();
    let page2 = vec![support::locality(3, "Mine")];
    let next_url = format!("{}/localities/?page=2", server.uri());

    Mock::given(method("GET"))
        .and(path("/localities/"))
        .and(query_param("txt", "Mine"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(support::envelope(&page1, 3, Some(next_url))),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/localities/"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(support::envelope(&page2, 3, None)))
        .expect(1)
        .mount(&server)
        .await;

    let config = support::test_config(&server.uri(), 100);
    let repo = support::test_repo(&config);

    let results = support::drain(repo.stream_country_mines("Iran")).await;

    let ids: Vec<u64> = results
        .iter()
        .map(|r| record_id(r.as_ref().unwrap()).unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
}
