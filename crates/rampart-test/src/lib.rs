//! # Rampart Test
//!
//! Drives a Rampart [`Pipeline`](rampart_middleware::Pipeline) in memory,
//! without binding a port, and mints bearer tokens for authenticated routes.
//!
//! ```rust,ignore
//! use rampart_test::{bearer_for, TestClient};
//!
//! #[tokio::test]
//! async fn test_lists_people() {
//!     let client = TestClient::new(app.pipeline().clone());
//!     let token = bearer_for("secret", "user-1").unwrap();
//!
//!     let data = client
//!         .get("/v2/person")
//!         .bearer_token(&token)
//!         .send()
//!         .await
//!         .assert_success_envelope();
//!     assert!(data.is_array());
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/rampart-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;
mod token;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
pub use token::{bearer_for, TestToken};
