//! The person scenario, end to end through `App` and the in-memory client.

use std::io::Write;

use rampart::prelude::*;
use rampart_test::{bearer_for, TestClient, TestToken};
use serde_json::json;

const SECRET: &str = "scenario-secret";

const SPEC: &str = r#"{
    "baseUri": "https://api.foo.com/v2/",
    "resources": [{
        "relativeUri": "/person",
        "methods": [{"method": "get"}, {"method": "post"}],
        "resources": [{
            "relativeUri": "/{id}",
            "methods": [{"method": "get", "is": ["authenticated"]}]
        }]
    }, {
        "relativeUri": "/vault",
        "methods": [{"method": "get"}]
    }]
}"#;

fn controllers() -> ControllerRegistry {
    let people = HandlerSet::new()
        .get(handler_fn(|ctx: &mut RequestContext| {
            Box::pin(async move {
                let data = match ctx.param("id") {
                    Some(id) => json!({"id": id, "subject": ctx.subject()}),
                    None => json!([{"id": "1"}]),
                };
                ctx.set_data(data);
                Ok(())
            })
        }))
        .post(handler_fn(|ctx: &mut RequestContext| {
            Box::pin(async move {
                let body = ctx.body().cloned().unwrap_or_default();
                ctx.set_data(body);
                Ok(())
            })
        }));

    let vault = HandlerSet::new().get(handler_fn(|_ctx: &mut RequestContext| {
        Box::pin(async { Err(HandlerError::from(anyhow::anyhow!("403:forbidden resource"))) })
    }));

    ControllerRegistry::new()
        .controller("/person", people)
        .controller("/vault", vault)
}

fn app(config: RampartConfig) -> App {
    App::builder()
        .spec(ApiSpec::from_json_str(SPEC).unwrap())
        .controllers(controllers())
        .config(config)
        .build()
        .unwrap()
}

fn client() -> TestClient {
    let mut config = RampartConfig::default();
    config.auth.jwt_secret = Some(SECRET.to_string());
    TestClient::new(app(config).pipeline().clone())
}

#[test]
fn test_person_endpoints_compiled() {
    let mut config = RampartConfig::default();
    config.auth.jwt_secret = Some(SECRET.to_string());
    let app = app(config);

    let endpoints: Vec<String> = app.router().endpoints().iter().map(ToString::to_string).collect();
    assert_eq!(
        endpoints,
        vec!["GET /v2/person", "POST /v2/person", "GET /v2/person/:id", "GET /v2/vault"]
    );
}

#[tokio::test]
async fn test_fetch_without_token_is_unauthorized() {
    client().get("/v2/person/42").send().await.assert_status(401);
}

#[tokio::test]
async fn test_fetch_with_token_succeeds() {
    let token = bearer_for(SECRET, "user-7").unwrap();
    let data = client()
        .get("/v2/person/42")
        .bearer_token(&token)
        .send()
        .await
        .assert_success_envelope();
    assert_eq!(data, json!({"id": "42", "subject": "user-7"}));
}

#[tokio::test]
async fn test_expired_and_subjectless_tokens() {
    let client = client();

    let expired = TestToken::new(SECRET).subject("user-7").expired().sign().unwrap();
    client
        .get("/v2/person/42")
        .bearer_token(&expired)
        .send()
        .await
        .assert_status(401);

    let anonymous = TestToken::new(SECRET).claim("role", json!("admin")).sign().unwrap();
    client
        .get("/v2/person/42")
        .bearer_token(&anonymous)
        .send()
        .await
        .assert_status(400);
}

#[tokio::test]
async fn test_untraited_endpoints_ignore_authorization() {
    client()
        .get("/v2/person")
        .bearer_token("not-even-a-token")
        .send()
        .await
        .assert_success_envelope();
}

#[tokio::test]
async fn test_query_and_case_do_not_affect_matching() {
    let data = client()
        .get("/V2/Person?limit=10")
        .send()
        .await
        .assert_success_envelope();
    assert_eq!(data, json!([{"id": "1"}]));
}

#[tokio::test]
async fn test_post_echoes_body() {
    let data = client()
        .post("/v2/person")
        .content_type("application/json; charset=utf-8")
        .body(r#"{"name":"Ada"}"#)
        .send()
        .await
        .assert_success_envelope();
    assert_eq!(data, json!({"name": "Ada"}));
}

#[tokio::test]
async fn test_coded_fault_message() {
    client()
        .get("/v2/vault")
        .send()
        .await
        .assert_error(403, "forbidden resource");
}

#[tokio::test]
async fn test_unknown_route() {
    client().get("/v2/unknown").send().await.assert_status(404);
}

#[tokio::test]
async fn test_app_from_config_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        "[api]\nbase_path = \"/internal\"\n\n[auth]\njwt_secret = \"{SECRET}\""
    )
    .unwrap();

    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
    let client = TestClient::new(app(config).pipeline().clone());

    client.get("/internal/person").send().await.assert_success_envelope();
    client.get("/v2/person").send().await.assert_status(404);
}
