use std::sync::Arc;

use catalog_api::app::{self, services::AppServices};
use catalog_infra::testing::{UnavailableStore, sample_product_fields, seeded_repository, widget_fields};
use catalog_infra::{AppConfig, InMemoryProductStore, ProductStore};
use reqwest::StatusCode;
use serde_json::json;

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
    _static_dir: tempfile::TempDir,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(|static_root| AppServices::with_store(InMemoryProductStore::new(), static_root)).await
    }

    async fn spawn_with(make: impl FnOnce(std::path::PathBuf) -> AppServices) -> Self {
        catalog_observability::tracing::init_for_tests();
        let static_dir = tempfile::tempdir().expect("failed to create static dir");
        std::fs::create_dir(static_dir.path().join("css")).unwrap();
        std::fs::write(static_dir.path().join("css/site.css"), "body { color: black; }").unwrap();

        // Same router as prod, but bound to an ephemeral port.
        let config = AppConfig::for_tests();
        let app = app::router_with(make(static_dir.path().to_path_buf()), &config.static_url);
        let listener = tokio::net::TcpListener::bind(config.bind_addr)
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Redirects are part of what is being checked.
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            base_url,
            client,
            handle,
            _static_dir: static_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client.post(self.url(path)).form(form).send().await.unwrap()
    }

    async fn list(&self) -> serde_json::Value {
        let res = self.get("/").await;
        assert_eq!(res.status(), StatusCode::OK);
        res.json().await.unwrap()
    }

    /// Create through the page and return the id the list page reports for `name`.
    async fn create(&self, name: &str, description: &str, price: &str) -> i64 {
        let res = self
            .post_form("/new", &[("name", name), ("description", description), ("price", price)])
            .await;
        assert_eq!(res.status(), StatusCode::FOUND);
        let body = self.list().await;
        body["items"]
            .as_array()
            .unwrap()
            .iter()
            .find(|p| p["name"] == name)
            .and_then(|p| p["id"].as_i64())
            .expect("created product is listed")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn location(res: &reqwest::Response) -> &str {
    res.headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn health_is_ok_and_requests_get_an_id() {
    let srv = TestServer::spawn().await;

    let res = srv.get("/health").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));

    let res = srv
        .client
        .get(srv.url("/health"))
        .header("x-request-id", "req-42")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "req-42");
}

#[tokio::test]
async fn empty_catalog_lists_nothing() {
    let srv = TestServer::spawn().await;
    let body = srv.list().await;
    assert_eq!(body["items"], json!([]));
    assert_eq!(body["message"], serde_json::Value::Null);
}

#[tokio::test]
async fn create_redirects_with_message_and_lists_by_name() {
    let srv = TestServer::spawn().await;

    let res = srv
        .post_form("/new", &[("name", "Widget"), ("description", "A widget"), ("price", "9.99")])
        .await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/?message=Product%20successfully%20created!");

    srv.create("Anvil", "", "120.00").await;

    let res = srv.get("/?message=Product%20successfully%20created!").await;
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Product successfully created!");
    let names: Vec<_> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Anvil", "Widget"]);
    assert_eq!(body["items"][1]["price"], "9.99");
    assert_eq!(body["items"][1]["description"], "A widget");
}

#[tokio::test]
async fn seeded_catalog_is_listed_by_name() {
    let store: Arc<dyn ProductStore> = Arc::new(InMemoryProductStore::new());
    let repo = seeded_repository(store, [widget_fields(), sample_product_fields()]).await;
    let srv = TestServer::spawn_with(move |root| AppServices::new(repo, root)).await;

    let body = srv.list().await;
    let names: Vec<_> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Test Product", "Widget"]);
    assert_eq!(body["items"][0]["price"], "29.99");
}

#[tokio::test]
async fn new_form_is_empty() {
    let srv = TestServer::spawn().await;
    let res = srv.get("/new").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["form"]["action"], "/new");
    assert_eq!(body["form"]["values"], json!({ "name": "", "description": "", "price": "" }));
    assert_eq!(body["form"]["errors"], json!({}));
}

#[tokio::test]
async fn invalid_create_re_presents_the_form() {
    let srv = TestServer::spawn().await;

    let res = srv
        .post_form("/new", &[("name", ""), ("description", "x"), ("price", "abc")])
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["form"]["values"]["description"], "x");
    assert_eq!(body["form"]["errors"]["name"][0], "This field is required.");
    assert_eq!(body["form"]["errors"]["price"][0], "Enter a number.");

    let long_name = "A".repeat(101);
    let res = srv
        .post_form("/new", &[("name", long_name.as_str()), ("price", "1.00")])
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(
        body["form"]["errors"]["name"][0],
        "Ensure this value has at most 100 characters (it has 101)."
    );

    let res = srv.post_form("/new", &[("name", "Widget"), ("price", "1.999")]).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(
        body["form"]["errors"]["price"][0],
        "Ensure that there are no more than 2 decimal places."
    );

    assert_eq!(srv.list().await["items"], json!([]));
}

#[tokio::test]
async fn form_text_is_checked_as_written() {
    let srv = TestServer::spawn().await;

    let res = srv
        .post_form("/new", &[("name", "Widget"), ("price", "1.00000000000000000000000000001")])
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(
        body["form"]["errors"]["price"][0],
        "Ensure that there are no more than 2 decimal places."
    );

    let res = srv
        .post_form("/new", &[("name", "Wid\0get"), ("description", "a\0b"), ("price", "1.00")])
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["form"]["errors"]["name"][0], "Null characters are not allowed.");
    assert_eq!(body["form"]["errors"]["description"][0], "Null characters are not allowed.");

    assert_eq!(srv.list().await["items"], json!([]));
}

#[tokio::test]
async fn widget_lifecycle_through_pages() {
    let srv = TestServer::spawn().await;
    let id = srv.create("Widget", "A widget", "9.99").await;

    let res = srv.get(&format!("/view/{id}")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let before: serde_json::Value = res.json().await.unwrap();
    assert_eq!(before["url"], format!("/edit/{id}"));
    assert_eq!(before["created"], before["changed"]);

    let res = srv.get(&format!("/edit/{id}")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["form"]["action"], format!("/edit/{id}"));
    assert_eq!(body["form"]["values"]["price"], "9.99");

    let res = srv
        .post_form(
            &format!("/edit/{id}"),
            &[("name", "Widget"), ("description", "A widget"), ("price", "12.50")],
        )
        .await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/?message=Product%20successfully%20updated!");

    let after: serde_json::Value = srv.get(&format!("/view/{id}")).await.json().await.unwrap();
    assert_eq!(after["price"], "12.50");
    assert_eq!(after["created"], before["created"]);
    assert_ne!(after["changed"], before["changed"]);

    let res = srv.get(&format!("/delete/{id}")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["confirm_delete"]["product"]["name"], "Widget");

    let res = srv.post_form(&format!("/delete/{id}"), &[]).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/?message=Product%20successfully%20deleted!");

    assert_eq!(srv.get(&format!("/view/{id}")).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        srv.post_form(&format!("/delete/{id}"), &[]).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn invalid_edit_keeps_the_record() {
    let srv = TestServer::spawn().await;
    let id = srv.create("Widget", "A widget", "9.99").await;

    let res = srv
        .post_form(&format!("/edit/{id}"), &[("name", "  "), ("price", "9.99")])
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["form"]["action"], format!("/edit/{id}"));
    assert!(body["form"]["errors"]["name"].is_array());

    let product: serde_json::Value = srv.get(&format!("/view/{id}")).await.json().await.unwrap();
    assert_eq!(product["name"], "Widget");
}

#[tokio::test]
async fn missing_or_malformed_ids_are_not_found() {
    let srv = TestServer::spawn().await;

    for path in ["/view/999", "/edit/999", "/delete/999", "/view/abc", "/edit/-1", "/delete/0"] {
        assert_eq!(srv.get(path).await.status(), StatusCode::NOT_FOUND, "GET {path}");
    }

    // The record check comes before form validation.
    let res = srv.post_form("/edit/999", &[("name", ""), ("price", "x")]).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_json_crud() {
    let srv = TestServer::spawn().await;

    let res = srv
        .client
        .post(srv.url("/admin/products"))
        .json(&json!({ "name": "Widget", "description": "A widget", "price": "9.99" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();

    let res = srv
        .client
        .put(srv.url(&format!("/admin/products/{id}")))
        .json(&json!({ "price": 12.5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: serde_json::Value = res.json().await.unwrap();
    assert_eq!(updated["price"], "12.50");
    assert_eq!(updated["name"], "Widget");

    let listed: serde_json::Value = srv.get("/admin/products").await.json().await.unwrap();
    assert_eq!(listed["items"].as_array().unwrap().len(), 1);

    let res = srv
        .client
        .post(srv.url("/admin/products"))
        .json(&json!({ "name": "", "price": "1234567.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
    assert!(body["fields"]["name"].is_array());
    assert!(body["fields"]["price"].is_array());

    let res = srv
        .client
        .delete(srv.url(&format!("/admin/products/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = srv.get(&format!("/admin/products/{id}")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn admin_bodies_are_validated_as_fields() {
    let srv = TestServer::spawn().await;

    let res = srv
        .client
        .post(srv.url("/admin/products"))
        .json(&json!({ "name": "Widget" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["fields"]["price"][0], "This field is required.");
    assert!(body["fields"].get("name").is_none());

    let res = srv
        .client
        .post(srv.url("/admin/products"))
        .header("content-type", "application/json")
        .body(r#"{"name":"Widget","price":1.0000000000000000001}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let res = srv
        .client
        .post(srv.url("/admin/products"))
        .json(&json!({ "name": 5, "price": "1.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"].is_string());

    let res = srv
        .client
        .post(srv.url("/admin/products"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let id = srv.create("Widget", "", "9.99").await;
    let res = srv
        .client
        .put(srv.url(&format!("/admin/products/{id}")))
        .json(&json!({ "price": [1] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let listed: serde_json::Value = srv.get("/admin/products").await.json().await.unwrap();
    assert_eq!(listed["items"].as_array().unwrap().len(), 1);
    assert_eq!(listed["items"][0]["price"], "9.99");
}

#[tokio::test]
async fn store_outage_is_a_server_fault() {
    let srv = TestServer::spawn_with(|root| AppServices::with_store(UnavailableStore, root)).await;

    let res = srv.get("/").await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "store_error");

    let res = srv.post_form("/new", &[("name", "Widget"), ("price", "9.99")]).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn static_assets_are_served_from_the_root() {
    let srv = TestServer::spawn().await;

    let res = srv.get("/static/css/site.css").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "text/css; charset=utf-8");
    assert_eq!(res.text().await.unwrap(), "body { color: black; }");

    assert_eq!(srv.get("/static/css/missing.css").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        srv.get("/static/css/..%2F..%2Fsecret.txt").await.status(),
        StatusCode::NOT_FOUND
    );
}
