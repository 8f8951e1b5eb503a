//! Bearer-token and cache-policy middlewares for HTTP client pipelines: attach credentials,
//! refresh them single-flight on authorization challenges, and degrade to cached answers when
//! the network goes away.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cache;
pub mod connectivity;
pub mod error;
pub mod message;
pub mod obs;
pub mod pipeline;
pub mod protocol;
pub mod transport;
pub mod user_agent;

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::Duration;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use message::{Request, Response};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use http;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, serde_json as _};
