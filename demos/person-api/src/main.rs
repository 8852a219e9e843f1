//! Person API demo.
//!
//! ```text
//! cargo run -p person-api
//! curl -X POST localhost:8080/v2/person -H 'content-type: application/json' -d '{"name":"Ada"}'
//! ```
//!
//! `GET /v2/person/{id}` requires `Authorization: Bearer <token>` signed with
//! the configured secret.

mod person;

use rampart::prelude::*;

const SPEC_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/spec/api.json");
const CONFIG_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/rampart.toml");

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = ConfigLoader::new()
        .with_optional_file(CONFIG_PATH)?
        .with_dotenv()?
        .with_env_prefix("RAMPART")
        .load()?;
    init_telemetry(&config)?;

    let store = person::PersonStore::new();
    let app = App::builder()
        .spec_file(SPEC_PATH)?
        .controllers(ControllerRegistry::new().controller("/person", person::controller(store)))
        .config(config)
        .build()?;

    tracing::info!(
        addr = %app.config().server.http_addr,
        base_path = %app.base_path(),
        "Starting person API"
    );
    app.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use rampart_test::{bearer_for, TestClient};
    use serde_json::json;

    const SECRET: &str = "demo-test-secret";

    fn client() -> TestClient {
        let mut config = RampartConfig::default();
        config.auth.jwt_secret = Some(SECRET.to_string());
        config.api.validate_responses = true;

        let app = App::builder()
            .spec_file(SPEC_PATH)
            .unwrap()
            .controllers(
                ControllerRegistry::new()
                    .controller("/person", person::controller(person::PersonStore::new())),
            )
            .config(config)
            .build()
            .unwrap();
        TestClient::new(app.pipeline().clone())
    }

    #[tokio::test]
    async fn test_create_then_fetch() {
        let client = client();

        let created = client
            .post("/v2/person")
            .json(&json!({"name": "Ada", "age": 36}))
            .send()
            .await
            .assert_success_envelope();
        let id = created["id"].as_str().unwrap().to_string();

        let listed = client.get("/v2/person").send().await.assert_success_envelope();
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let token = bearer_for(SECRET, "tester").unwrap();
        let fetched = client
            .get(format!("/v2/person/{id}"))
            .bearer_token(&token)
            .send()
            .await
            .assert_success_envelope();
        assert_eq!(fetched["name"], "Ada");
        assert_eq!(fetched["age"], 36);
    }

    #[tokio::test]
    async fn test_fetch_requires_token() {
        client()
            .get("/v2/person/anything")
            .send()
            .await
            .assert_status(401);
    }

    #[tokio::test]
    async fn test_unknown_person() {
        let token = bearer_for(SECRET, "tester").unwrap();
        client()
            .get("/v2/person/missing")
            .bearer_token(&token)
            .send()
            .await
            .assert_error(404, "person missing not found");
    }

    #[tokio::test]
    async fn test_rejects_unknown_fields() {
        let response = client()
            .post("/v2/person")
            .json(&json!({"name": "Ada", "nickname": "A"}))
            .send()
            .await;
        response.assert_status(400);
    }
}
