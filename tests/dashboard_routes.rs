use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dashboard::services::participation_api::ParticipationClient;
use dashboard::web::{app, AppState};

struct TestResponse {
    status: StatusCode,
    location: Option<String>,
    body: String,
}

fn router(server: &MockServer) -> Router {
    app(AppState {
        api: ParticipationClient::new(server.uri()),
    })
}

async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    TestResponse {
        status,
        location,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    }
}

async fn get(app: &Router, uri: &str) -> TestResponse {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post_form(app: &Router, uri: &str, form: &str) -> TestResponse {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap();
    send(app, request).await
}

fn two_records() -> Value {
    json!({
        "data": [
            { "id": 1, "firstName": "carlos", "lastName": "moura", "percentage": 25 },
            { "id": 2, "firstName": "fernanda", "lastName": "oliveira", "percentage": 75 }
        ]
    })
}

async fn mount_list(server: &MockServer, body: Value, times: u64) {
    Mock::given(method("GET"))
        .and(path("/participation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(times)
        .named("list participations")
        .mount(server)
        .await;
}

#[tokio::test]
async fn root_redirects_to_dashboard() {
    let server = MockServer::start().await;
    let app = router(&server);

    let res = get(&app, "/").await;

    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location.as_deref(), Some("/dashboard"));
}

#[tokio::test]
async fn health_does_not_touch_the_api() {
    let server = MockServer::start().await;
    let app = router(&server);

    let res = get(&app, "/health").await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains("\"status\":\"ok\""));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_list_renders_single_placeholder_row() {
    let server = MockServer::start().await;
    mount_list(&server, json!({ "data": [] }), 1).await;
    let app = router(&server);

    let res = get(&app, "/dashboard").await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body.matches("No data available").count(), 1);
    assert!(!res.body.contains("<tr id=\"row-"));
    assert!(res.body.contains("Nothing to chart yet"));
}

#[tokio::test]
async fn dashboard_lists_records_and_chart() {
    let server = MockServer::start().await;
    mount_list(&server, two_records(), 1).await;
    let app = router(&server);

    let res = get(&app, "/dashboard").await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains("<td class=\"center\">Carlos</td>"));
    assert!(res.body.contains("<td class=\"center\">75%</td>"));
    assert!(res.body.contains("Fernanda Oliveira (75.0%)"));
    assert!(res.body.contains("href=\"/dashboard?edit=2\""));
    assert!(!res.body.contains("No data available"));
}

#[tokio::test]
async fn create_issues_one_create_then_one_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/participation"))
        .and(body_json(json!({
            "firstName": "ana",
            "lastName": "lima",
            "percentage": 30.0
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "data": { "id": 3 } })))
        .expect(1)
        .named("create participation")
        .mount(&server)
        .await;
    mount_list(
        &server,
        json!({ "data": [{ "id": 3, "firstName": "ana", "lastName": "lima", "percentage": 30 }] }),
        1,
    )
    .await;
    let app = router(&server);

    let res = post_form(&app, "/participation", "firstName=ana&lastName=lima&percentage=30").await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    let location = res.location.unwrap();
    assert_eq!(location, "/dashboard?notice=created");

    let page = get(&app, &location).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Participation created successfully!"));
    assert!(page.body.contains("<td class=\"center\">Ana</td>"));

    let received = server.received_requests().await.unwrap();
    let methods: Vec<String> = received.iter().map(|r| r.method.to_string()).collect();
    assert_eq!(methods, vec!["POST", "GET"]);
}

#[tokio::test]
async fn incomplete_create_form_issues_no_create() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    mount_list(&server, two_records(), 1).await;
    let app = router(&server);

    let res = post_form(&app, "/participation", "firstName=ana&lastName=&percentage=").await;

    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(res.body.contains("Last name is required."));
    assert!(res.body.contains("Participation is required."));
    assert!(!res.body.contains("First name is required."));
    assert!(res.body.contains("value=\"ana\""));
}

#[tokio::test]
async fn create_shows_api_message_on_client_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/participation"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "message": "Participant already exists" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_list(&server, two_records(), 1).await;
    let app = router(&server);

    let res = post_form(&app, "/participation", "firstName=carlos&lastName=moura&percentage=10").await;

    assert_eq!(res.status, StatusCode::BAD_GATEWAY);
    assert!(res.body.contains("Participant already exists"));
}

#[tokio::test]
async fn create_shows_generic_message_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/participation"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "stack trace" })))
        .expect(1)
        .mount(&server)
        .await;
    mount_list(&server, two_records(), 1).await;
    let app = router(&server);

    let res = post_form(&app, "/participation", "firstName=ana&lastName=lima&percentage=1").await;

    assert_eq!(res.status, StatusCode::BAD_GATEWAY);
    assert!(res.body.contains("An unexpected error occurred."));
    assert!(!res.body.contains("stack trace"));
}

#[tokio::test]
async fn edit_mode_renders_inputs_for_that_row_only() {
    let server = MockServer::start().await;
    mount_list(&server, two_records(), 1).await;
    let app = router(&server);

    let res = get(&app, "/dashboard?edit=2").await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains("name=\"firstName_2\""));
    assert!(res.body.contains("value=\"fernanda\""));
    assert!(res.body.contains("name=\"percentage_2\""));
    assert!(res.body.contains("action=\"/participation/2\""));
    assert!(!res.body.contains("name=\"firstName_1\""));
    assert!(res.body.contains("<td class=\"center\">Carlos</td>"));
}

#[tokio::test]
async fn saving_issues_one_update_with_row_inputs_then_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/participation/2"))
        .and(body_json(json!({
            "firstName": "fer",
            "lastName": "oliveira",
            "percentage": 60.0
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
        .expect(1)
        .named("update participation 2")
        .mount(&server)
        .await;
    mount_list(&server, two_records(), 1).await;
    let app = router(&server);

    let res = post_form(
        &app,
        "/participation/2",
        "firstName_2=fer&lastName_2=oliveira&percentage_2=60&firstName_1=ignored&action=save",
    )
    .await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    let location = res.location.unwrap();
    assert_eq!(location, "/dashboard?notice=updated");

    let page = get(&app, &location).await;
    assert!(page.body.contains("Participation updated successfully!"));
    assert!(!page.body.contains("name=\"firstName_2\""));

    let received = server.received_requests().await.unwrap();
    let methods: Vec<String> = received.iter().map(|r| r.method.to_string()).collect();
    assert_eq!(methods, vec!["PUT", "GET"]);
}

#[tokio::test]
async fn invalid_row_inputs_stay_in_edit_mode_without_update() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    mount_list(&server, two_records(), 1).await;
    let app = router(&server);

    let res = post_form(
        &app,
        "/participation/2",
        "firstName_2=&lastName_2=oliveira&percentage_2=abc&action=save",
    )
    .await;

    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(res.body.contains("First name is required."));
    assert!(res.body.contains("Participation must be a number."));
    assert!(res.body.contains("value=\"abc\""));
}

#[tokio::test]
async fn failed_update_keeps_edit_mode() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/participation/2"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({ "message": "Percentage rejected" })))
        .expect(1)
        .mount(&server)
        .await;
    mount_list(&server, two_records(), 1).await;
    let app = router(&server);

    let res = post_form(
        &app,
        "/participation/2",
        "firstName_2=fer&lastName_2=oliveira&percentage_2=60",
    )
    .await;

    assert_eq!(res.status, StatusCode::BAD_GATEWAY);
    assert!(res.body.contains("Percentage rejected"));
    assert!(res.body.contains("name=\"firstName_2\""));
    assert!(res.body.contains("value=\"fer\""));
}

#[tokio::test]
async fn cancel_discards_inputs_and_restores_read_only_row() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    mount_list(&server, two_records(), 1).await;
    let app = router(&server);

    let res = post_form(
        &app,
        "/participation/2",
        "firstName_2=changed&lastName_2=oliveira&percentage_2=1&action=cancel",
    )
    .await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    let location = res.location.unwrap();
    assert_eq!(location, "/dashboard");

    let page = get(&app, &location).await;
    assert!(!page.body.contains("name=\"firstName_2\""));
    assert!(!page.body.contains("changed"));
    assert!(page.body.contains("<td class=\"center\">Fernanda</td>"));
}

#[tokio::test]
async fn unknown_row_action_is_rejected() {
    let server = MockServer::start().await;
    let app = router(&server);

    let res = post_form(&app, "/participation/2", "action=archive").await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_prompt_names_the_row() {
    let server = MockServer::start().await;
    mount_list(&server, two_records(), 1).await;
    let app = router(&server);

    let res = get(&app, "/dashboard?confirm_delete=1").await;

    assert!(res.body.contains("Are you sure you want to delete Carlos Moura?"));
    assert!(res.body.contains("action=\"/participation/1/delete\""));
}

#[tokio::test]
async fn confirmed_delete_issues_one_delete_then_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/participation/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
        .expect(1)
        .named("delete participation 1")
        .mount(&server)
        .await;
    mount_list(
        &server,
        json!({ "data": [{ "id": 2, "firstName": "fernanda", "lastName": "oliveira", "percentage": 75 }] }),
        1,
    )
    .await;
    let app = router(&server);

    let res = post_form(&app, "/participation/1/delete", "confirm=yes").await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    let location = res.location.unwrap();
    assert_eq!(location, "/dashboard?notice=deleted");

    let page = get(&app, &location).await;
    assert!(page.body.contains("Participation has been deleted."));
    assert!(!page.body.contains("<tr id=\"row-1\""));

    let received = server.received_requests().await.unwrap();
    let methods: Vec<String> = received.iter().map(|r| r.method.to_string()).collect();
    assert_eq!(methods, vec!["DELETE", "GET"]);
}

#[tokio::test]
async fn declined_delete_issues_no_request() {
    let server = MockServer::start().await;
    let app = router(&server);

    let res = post_form(&app, "/participation/1/delete", "confirm=no").await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location.as_deref(), Some("/dashboard"));

    let res = post_form(&app, "/participation/1/delete", "").await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn name_filter_uses_the_user_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/participation/user"))
        .and(wiremock::matchers::query_param("firstname", "carlos"))
        .and(wiremock::matchers::query_param("lastname", "moura"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": 1, "firstName": "carlos", "lastName": "moura", "percentage": 25 }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_list(&server, two_records(), 0).await;
    let app = router(&server);

    let res = get(&app, "/dashboard?firstname=carlos&lastname=moura").await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains("<td class=\"center\">Carlos</td>"));
    assert!(!res.body.contains("Fernanda"));
    assert!(res.body.contains("Show all"));
}

async fn mount_list_unavailable(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/participation"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn list_failure_keeps_the_dashboard_usable() {
    let server = MockServer::start().await;
    mount_list_unavailable(&server).await;
    let app = router(&server);

    let res = get(&app, "/dashboard").await;

    assert_eq!(res.status, StatusCode::BAD_GATEWAY);
    assert!(res.body.contains("An unexpected error occurred."));
    assert!(res.body.contains("class=\"create-form\""));
    assert!(res.body.contains("action=\"/participation\""));
    assert_eq!(res.body.matches("No data available").count(), 1);
}

#[tokio::test]
async fn create_error_survives_a_failed_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/participation"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "message": "Participant already exists" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_list_unavailable(&server).await;
    let app = router(&server);

    let res = post_form(&app, "/participation", "firstName=carlos&lastName=moura&percentage=10").await;

    assert_eq!(res.status, StatusCode::BAD_GATEWAY);
    assert!(res.body.contains("Participant already exists"));
    assert!(!res.body.contains("An unexpected error occurred."));
    assert!(res.body.contains("value=\"carlos\""));
}

#[tokio::test]
async fn failed_delete_shows_the_api_message() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/participation/1"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Participation not found" })),
        )
        .expect(1)
        .named("delete participation 1")
        .mount(&server)
        .await;
    mount_list(&server, two_records(), 1).await;
    let app = router(&server);

    let res = post_form(&app, "/participation/1/delete", "confirm=yes").await;

    assert_eq!(res.status, StatusCode::BAD_GATEWAY);
    assert!(res.body.contains("Participation not found"));
    assert!(res.body.contains("<td class=\"center\">Carlos</td>"));

    let received = server.received_requests().await.unwrap();
    let deletes = received
        .iter()
        .filter(|r| r.method.to_string() == "DELETE")
        .count();
    assert_eq!(deletes, 1);
}

#[tokio::test]
async fn filtered_view_keeps_its_filter_through_edit_and_save() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/participation/user"))
        .and(wiremock::matchers::query_param("firstname", "carlos"))
        .and(wiremock::matchers::query_param("lastname", "moura"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": 1, "firstName": "carlos", "lastName": "moura", "percentage": 25 }]
        })))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/participation/1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    mount_list(&server, two_records(), 0).await;
    let app = router(&server);

    let page = get(&app, "/dashboard?firstname=carlos&lastname=moura").await;
    assert!(page
        .body
        .contains("href=\"/dashboard?edit=1&firstname=carlos&lastname=moura\""));
    assert!(page
        .body
        .contains("href=\"/dashboard?confirm_delete=1&firstname=carlos&lastname=moura\""));

    let editing = get(&app, "/dashboard?edit=1&firstname=carlos&lastname=moura").await;
    assert!(editing
        .body
        .contains("action=\"/participation/1?firstname=carlos&lastname=moura\""));

    let res = post_form(
        &app,
        "/participation/1?firstname=carlos&lastname=moura",
        "firstName_1=carlos&lastName_1=moura&percentage_1=30&action=save",
    )
    .await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(
        res.location.as_deref(),
        Some("/dashboard?notice=updated&firstname=carlos&lastname=moura")
    );
}
