#![cfg(feature = "reqwest")]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
// self
use auth_cache_pipeline::{
	Pipeline, Request,
	auth::{
		AuthInterceptor, BearerHeaderCodec, ChallengeCoordinator, MemoryTokenProvider, Scope,
		ScopeLocks, Token,
	},
	cache::{CacheConfig, CacheInterceptor, CacheResponseRewriter},
	connectivity,
	http::{StatusCode, header::CACHE_CONTROL},
	protocol,
	reqwest::Client,
	transport::ReqwestTransport,
	url::Url,
};

/// Reqwest transport that accepts the self-signed certificates produced by `httpmock`.
fn test_transport() -> ReqwestTransport {
	let client = Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Insecure test client should build.");

	ReqwestTransport::with_client(client)
}

#[tokio::test]
async fn refreshes_rejected_token_over_http() -> color_eyre::Result<()> {
	let server = MockServer::start_async().await;
	let rejected = server
		.mock_async(|when, then| {
			when.method(GET).path("/profile").header("authorization", "Bearer T1");
			then.status(401);
		})
		.await;
	let accepted = server
		.mock_async(|when, then| {
			when.method(GET).path("/profile").header("authorization", "Bearer T2");
			then.status(200).header("cache-control", "no-store").body("{\"name\":\"ada\"}");
		})
		.await;
	let provider = Arc::new(
		MemoryTokenProvider::new(Arc::new(ScopeLocks::new()), |_, _| Ok(Some(Token::new("T2"))))
			.with_token(Scope::Anonymous, "T1"),
	);
	let codec = Arc::new(BearerHeaderCodec::new());
	let connectivity = connectivity::shared(true);
	let config = CacheConfig::default();
	let pipeline = Pipeline::builder(test_transport())
		.auth(AuthInterceptor::new(provider.clone(), codec.clone(), connectivity.clone()))
		.cache(CacheInterceptor::new(&config, connectivity)?, CacheResponseRewriter::new(&config)?)
		.challenge_handler(ChallengeCoordinator::new(Scope::Anonymous, provider.clone(), codec))
		.build();
	let response = pipeline
		.execute(
			Request::get(Url::parse(&server.url("/profile"))?)
				.with_flag(protocol::APPLY_RESPONSE_CACHE),
		)
		.await?;
	let body: serde_json::Value = serde_json::from_slice(response.body())?;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(body["name"], "ada");
	assert_eq!(response.header(&CACHE_CONTROL), Some("public, max-age=3600"));
	assert_eq!(provider.forced_refreshes(), 1);

	rejected.assert_calls_async(1).await;
	accepted.assert_calls_async(1).await;

	Ok(())
}

#[tokio::test]
async fn challenge_without_handler_is_returned_to_caller() -> color_eyre::Result<()> {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/open");
			then.status(401).header("www-authenticate", "Bearer");
		})
		.await;
	let pipeline = Pipeline::builder(test_transport()).build();
	let response = pipeline.execute(Request::get(Url::parse(&server.url("/open"))?)).await?;

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	assert_eq!(response.request().url().path(), "/open");

	mock.assert_async().await;

	Ok(())
}
