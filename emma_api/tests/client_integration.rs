use emma_api::types::SessionCookie;
use emma_api::{Error, Session};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
}

#[tokio::test]
async fn get_html_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/IssuerView/IssuerDetails.aspx"))
        .and(query_param("cusip", "123456"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><h3>Issuer</h3></html>"))
        .mount(&mock_server)
        .await;

    let session = Session::with_base_url(&mock_server.uri()).unwrap();
    let url = session.issuer_url("123456").unwrap();
    let body = session.get_html(url.as_str()).await.unwrap();
    assert!(body.contains("<h3>Issuer</h3>"));
}

#[tokio::test]
async fn get_html_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/IssueView/Details/EP1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let session = Session::with_base_url(&mock_server.uri()).unwrap();
    let url = session.issue_details_url("EP1").unwrap();
    let result = session.get_html(url.as_str()).await;
    match result {
        Err(Error::HttpStatus { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "Internal Server Error");
        }
        other => panic!("expected HttpStatus error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn post_form_sends_fields() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/IssuerView/IssuerDetails.aspx"))
        .and(body_string_contains("__EVENTTARGET=ctl00%24pager%24page2"))
        .and(body_string_contains("__VIEWSTATE=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>page 2</html>"))
        .mount(&mock_server)
        .await;

    let session = Session::with_base_url(&mock_server.uri()).unwrap();
    let url = session.issuer_url("123456").unwrap();
    let fields = vec![
        ("__VIEWSTATE".to_string(), "abc".to_string()),
        ("__EVENTTARGET".to_string(), "ctl00$pager$page2".to_string()),
    ];
    let body = session.post_form(url.as_str(), &fields).await.unwrap();
    assert_eq!(body, "<html>page 2</html>");
}

#[tokio::test]
async fn get_final_scale_success() {
    let mock_server = MockServer::start().await;
    let body = load_fixture("final_scale.json");

    Mock::given(method("GET"))
        .and(path("/IssueView/GetFinalScaleData"))
        .and(query_param("id", "EA1234567"))
        .respond_with(ResponseTemplate::new(200).set_body_string(&body))
        .mount(&mock_server)
        .await;

    let session = Session::with_base_url(&mock_server.uri()).unwrap();
    let entries = session.get_final_scale("EA1234567").await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].cusip9, "123456AB1");
}

#[tokio::test]
async fn get_final_scale_malformed_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/IssueView/GetFinalScaleData"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not valid json}"))
        .mount(&mock_server)
        .await;

    let session = Session::with_base_url(&mock_server.uri()).unwrap();
    let result = session.get_final_scale("EA1234567").await;
    assert!(matches!(result, Err(Error::Parse(_))));
}

#[tokio::test]
async fn portal_cookies_persist_across_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/IssuerView/IssuerDetails.aspx"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "ASP.NET_SessionId=s1; Path=/")
                .set_body_string("<html></html>"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/IssueView/Details/EP1"))
        .and(header("cookie", "ASP.NET_SessionId=s1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>detail</html>"))
        .mount(&mock_server)
        .await;

    let session = Session::with_base_url(&mock_server.uri()).unwrap();
    let issuer = session.issuer_url("123456").unwrap();
    session.get_html(issuer.as_str()).await.unwrap();

    let detail = session.issue_details_url("EP1").unwrap();
    let body = session.get_html(detail.as_str()).await.unwrap();
    assert_eq!(body, "<html>detail</html>");
}

#[tokio::test]
async fn added_cookies_are_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/IssueView/Details/EP1"))
        .and(header("cookie", "Disclaimer=accepted"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&mock_server)
        .await;

    let session = Session::with_base_url(&mock_server.uri()).unwrap();
    let detail = session.issue_details_url("EP1").unwrap();
    session
        .add_cookies(
            detail.as_str(),
            &[SessionCookie {
                name: "Disclaimer".to_string(),
                value: "accepted".to_string(),
            }],
        )
        .unwrap();

    let body = session.get_html(detail.as_str()).await.unwrap();
    assert_eq!(body, "<html>ok</html>");
}
