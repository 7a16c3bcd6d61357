use borga::config::BorgaOptions;
use borga::elastic::ElasticOptions;
use borga::error::ErrorKind;
use borga::Borga;
use serde_json::json;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn borga_for(mock_server: &MockServer) -> Borga {
    let options = BorgaOptions::default().with_elastic(ElasticOptions::new(&mock_server.uri()));
    Borga::elastic(options)
}

#[tokio::test]
async fn test_rejected_token_never_reaches_group_indices() {
    // モックサーバーの起動
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/borga_tokens/_doc/stolen"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_source": { "user_id": "b2" }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let borga = borga_for(&mock_server);
    let err = borga
        .create_group(Some("stolen"), "a1", Some("g1"), "RPG", "desc")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);
}

#[tokio::test]
async fn test_store_outage_is_ext_svc_fail() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/borga_users/_search"))
        .respond_with(ResponseTemplate::new(503).set_body_string("no master"))
        .mount(&mock_server)
        .await;

    let borga = borga_for(&mock_server);
    let err = borga.popular_games().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExtSvcFail);
}

#[tokio::test]
async fn test_unreachable_store_is_fail() {
    let options =
        BorgaOptions::default().with_elastic(ElasticOptions::new("http://127.0.0.1:1"));
    let borga = Borga::elastic(options);

    let err = borga.create_user("a1", "Ann").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Fail);
    assert!(err.info()["cause"].is_string());
}

#[tokio::test]
async fn test_popular_games_over_document_store() {
    let mock_server = MockServer::start().await;

    let hits = |docs: serde_json::Value| {
        ResponseTemplate::new(200).set_body_json(json!({ "hits": { "hits": docs } }))
    };
    Mock::given(method("GET"))
        .and(path("/borga_users/_search"))
        .respond_with(hits(json!([
            { "_id": "a1", "_source": { "name": "Ann" } },
            { "_id": "b2", "_source": { "name": "Bob" } }
        ])))
        .mount(&mock_server)
        .await;
    for user in ["a1", "b2"] {
        Mock::given(method("GET"))
            .and(path(format!("/borga_users/_doc/{}", user)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_source": { "name": user }
            })))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/borga_users_{}_groups/_search", user)))
            .respond_with(hits(json!([
                { "_id": "g1", "_source": { "name": "Fav", "description": "d" } }
            ])))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/borga_users_{}_groups/_doc/g1", user)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_source": { "name": "Fav", "description": "d" }
            })))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/borga_users_{}_groups_g1_games/_search", user)))
            .respond_with(hits(json!([
                { "_id": "OIXt3DmJU0", "_source": { "name": "Catan" } }
            ])))
            .mount(&mock_server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/borga_games/_doc/OIXt3DmJU0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_source": { "id": "OIXt3DmJU0", "name": "Catan" }
        })))
        .mount(&mock_server)
        .await;

    let borga = borga_for(&mock_server);
    let popular = borga.popular_games().await.unwrap();
    assert_eq!(popular.len(), 1);
    assert_eq!(popular[0].name(), "Catan");
    assert_eq!(popular[0].count, 2);
}

#[tokio::test]
async fn test_missing_group_is_rejected_without_scanning_games() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/borga_tokens/_doc/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_source": { "user_id": "a1" }
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/borga_users/_doc/a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_source": { "name": "Ann" }
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/borga_users_a1_groups/_doc/g9"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "found": false })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"/_search$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let borga = borga_for(&mock_server);
    let err = borga
        .add_game_to_group(Some("t1"), "a1", "g9", "OIXt3DmJU0")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.info(), json!({ "groupId": "g9" }));
}
