//! # reqctx
//!
//! A small async HTTP client built around a reusable context.
//!
//! ## Generic dispatcher
//!
//! Every call carries a full URL:
//!
//! ```ignore
//! use reqctx::{Dispatcher, RequestOptions};
//!
//! let request = Dispatcher::generic()?;
//!
//! let reply = request.get(RequestOptions::url("http://star.trek/captains")).await?;
//! let response = reply.into_buffered().unwrap();
//! assert_eq!(response.status_code, 200);
//! ```
//!
//! ## Context
//!
//! A context binds an origin and a default port, so calls only name a path:
//!
//! ```ignore
//! use reqctx::{create_context, ContextOptions, RequestOptions};
//!
//! let request = create_context(Some(
//!     ContextOptions::new().with_origin("http://star.trek").with_port(3000),
//! ))?;
//!
//! // GET http://star.trek:3000/captains
//! request.get(RequestOptions::path("/captains")).await?;
//! ```
//!
//! ## Streaming
//!
//! The `stream()` namespace hands the response back as soon as headers
//! arrive. The caller owns the body from then on:
//!
//! ```ignore
//! let mut stream = request.stream().get(RequestOptions::path("/logs")).await?;
//! while let Some(chunk) = stream.chunk().await? {
//!     // ...
//! }
//! ```
//!
//! ## Failures
//!
//! Buffered calls fail with [`Error::Status`] when the status code is above
//! 400. Resolution problems (no URL, no origin, bad method or header) are
//! reported by [`Dispatcher::prepare`] before anything is sent. Transport
//! failures come back as [`Error::Http`] untouched.

pub mod dispatcher;
pub mod error;
pub mod payload;
pub mod resolve;
pub mod response;
pub mod types;

pub use dispatcher::{
    create_context, Dispatcher, PreparedRequest, Shorthand, StreamDispatcher, FAILURE_THRESHOLD,
};
pub use error::{Error, RequestError};
pub use payload::{try_parse, Payload};
pub use response::{Reply, Response, ResponseStream};
pub use types::{ContextOptions, RequestOptions, Transport, Verb};
