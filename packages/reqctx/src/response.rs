use bytes::Bytes;
use futures::Stream;
use http::HeaderMap;
use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::payload::Payload;

/// A fully buffered response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status_code: u16,

    /// Body after [`try_parse`](crate::try_parse): JSON when it parsed, the raw text otherwise.
    pub body: Payload,
}

impl Response {
    /// Deserialize the body into a specific type.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        self.body.deserialize()
    }
}

/// A response handed over as soon as its headers arrived.
///
/// The body has not been read. The caller owns the connection until the
/// stream is drained or dropped.
#[derive(Debug)]
pub struct ResponseStream {
    inner: reqwest::Response,
    finished: bool,
}

impl ResponseStream {
    pub(crate) fn new(inner: reqwest::Response) -> Self {
        Self {
            inner,
            finished: false,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.inner.status().as_u16()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// False once the last chunk has been read.
    pub fn is_readable(&self) -> bool {
        !self.finished
    }

    /// Next chunk of the body, or `None` at the end.
    pub async fn chunk(&mut self) -> Result<Option<Bytes>, Error> {
        if self.finished {
            return Ok(None);
        }
        let chunk = self.inner.chunk().await?;
        if chunk.is_none() {
            self.finished = true;
        }
        Ok(chunk)
    }

    /// Drain the rest of the body as text.
    pub async fn text(self) -> Result<String, Error> {
        Ok(self.inner.text().await?)
    }

    pub fn into_bytes_stream(self) -> impl Stream<Item = Result<Bytes, reqwest::Error>> {
        self.inner.bytes_stream()
    }

    pub fn into_inner(self) -> reqwest::Response {
        self.inner
    }
}

/// What a dispatch settles with, depending on the streaming flag.
#[derive(Debug)]
pub enum Reply {
    Buffered(Response),
    Stream(ResponseStream),
}

impl Reply {
    pub fn status_code(&self) -> u16 {
        match self {
            Reply::Buffered(response) => response.status_code,
            Reply::Stream(stream) => stream.status_code(),
        }
    }

    pub fn into_buffered(self) -> Option<Response> {
        match self {
            Reply::Buffered(response) => Some(response),
            Reply::Stream(_) => None,
        }
    }

    pub fn into_stream(self) -> Option<ResponseStream> {
        match self {
            Reply::Stream(stream) => Some(stream),
            Reply::Buffered(_) => None,
        }
    }
}
