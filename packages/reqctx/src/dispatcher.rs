//! The request dispatcher and its verb shorthands.
//!
//! A [`Dispatcher`] owns an immutable, optional [`ContextOptions`] and a
//! reqwest client. Each call resolves its target synchronously through
//! [`Dispatcher::prepare`] and then performs exactly one exchange.
//!
//! ```text
//! request(options)
//!   -> prepare: url, transport, port, method, headers, body
//!   -> send:    one HTTP/HTTPS exchange
//!   -> buffered: Response { status_code, body } or Error::Status when > 400
//!      stream:   ResponseStream as soon as headers arrive
//! ```

use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method};
use reqwest::Client;
use url::Url;

use crate::error::{Error, RequestError};
use crate::payload::try_parse;
use crate::resolve::{resolve_target, resolve_url};
use crate::response::{Reply, Response, ResponseStream};
use crate::types::{ContextOptions, RequestOptions, Transport, Verb};

/// Status codes strictly above this one are failures. 400 itself is not.
pub const FAILURE_THRESHOLD: u16 = 400;

const DEFAULT_METHOD: &str = "get";

/// Build a dispatcher, optionally bound to a context.
///
/// Without a context every call needs a full `url`. With one, calls may
/// pass just a `path` that gets joined onto the context origin.
pub fn create_context(context: Option<ContextOptions>) -> Result<Dispatcher, Error> {
    Dispatcher::new(context)
}

/// A verb preset as exposed by [`Dispatcher::shorthand`] and
/// [`StreamDispatcher::shorthand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VerbEntry {
    verb: Verb,
    name: &'static str,
    is_stream: bool,
}

impl VerbEntry {
    fn buffered(verb: Verb) -> Self {
        Self {
            verb,
            name: verb.shorthand_name(),
            is_stream: false,
        }
    }

    fn stream(verb: Verb) -> Self {
        Self {
            verb,
            name: verb.stream_shorthand_name(),
            is_stream: true,
        }
    }
}

/// Executes one HTTP/HTTPS request per call.
///
/// Cloning is cheap and clones share the underlying client. Nothing is
/// mutated after construction, so concurrent calls are independent.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    context: Option<ContextOptions>,
    client: Client,
    verbs: [VerbEntry; 9],
    stream_verbs: [VerbEntry; 9],
}

macro_rules! verb_methods {
    ($($(#[$meta:meta])* $name:ident => $verb:ident),* $(,)?) => {
        $(
            #[doc = concat!("Dispatch with the method preset to `", stringify!($name), "`.")]
            $(#[$meta])*
            pub async fn $name(&self, options: RequestOptions) -> Result<Reply, Error> {
                self.shorthand(Verb::$verb).call(options).await
            }
        )*
    };
}

macro_rules! stream_verb_methods {
    ($($(#[$meta:meta])* $name:ident => $verb:ident),* $(,)?) => {
        $(
            #[doc = concat!("Stream with the method preset to `", stringify!($name), "`.")]
            $(#[$meta])*
            pub async fn $name(&self, options: RequestOptions) -> Result<ResponseStream, Error> {
                self.request(options.with_verb(Verb::$verb)).await
            }
        )*
    };
}

impl Dispatcher {
    /// Create a dispatcher with its own client.
    ///
    /// The client follows no redirects and ignores proxy environment
    /// variables, so each call is exactly one exchange with the target.
    pub fn new(context: Option<ContextOptions>) -> Result<Self, Error> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .build()?;

        Ok(Self::with_client(context, client))
    }

    /// Create a dispatcher around an existing client.
    pub fn with_client(context: Option<ContextOptions>, client: Client) -> Self {
        Self {
            context,
            client,
            verbs: Verb::ALL.map(VerbEntry::buffered),
            stream_verbs: Verb::ALL.map(VerbEntry::stream),
        }
    }

    /// A dispatcher with no context. Every call must carry a full `url`.
    ///
    /// The application owns this value and passes it around; there is no
    /// process-wide instance.
    pub fn generic() -> Result<Self, Error> {
        Self::new(None)
    }

    pub fn name(&self) -> &'static str {
        "request"
    }

    pub fn context(&self) -> Option<&ContextOptions> {
        self.context.as_ref()
    }

    /// Resolve everything about a request without touching the network.
    pub fn prepare(&self, options: RequestOptions) -> Result<PreparedRequest, Error> {
        let url = resolve_url(&options, self.context.as_ref())?;
        let target = resolve_target(
            url,
            options.port,
            self.context.as_ref().and_then(|c| c.port),
        )?;

        let method_name = options
            .method
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_METHOD);
        let method = Method::from_bytes(method_name.to_ascii_uppercase().as_bytes()).map_err(
            |_| Error::InvalidMethod {
                method: method_name.to_string(),
            },
        )?;

        let mut headers = HeaderMap::new();
        for (name, value) in &options.headers {
            let name = HeaderName::try_from(name.as_str())?;
            let value = HeaderValue::try_from(value.as_str())?;
            headers.insert(name, value);
        }

        let body = match &options.body {
            Some(body) if !body.is_null() => {
                let (bytes, is_json) = body.encode()?;
                if is_json && !headers.contains_key(CONTENT_TYPE) {
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                }
                Some(bytes)
            }
            _ => None,
        };

        log::trace!("prepared {} {} ({:?})", method, target.url, target.transport);

        Ok(PreparedRequest {
            client: self.client.clone(),
            method,
            url: target.url,
            transport: target.transport,
            port: target.port,
            headers,
            body,
            is_stream: options.is_stream,
        })
    }

    /// Dispatch a request. The streaming flag in `options` picks the reply kind.
    pub async fn request(&self, options: RequestOptions) -> Result<Reply, Error> {
        self.prepare(options)?.send().await
    }

    /// Shorthand entry for `verb`, e.g. named `request GET`.
    pub fn shorthand(&self, verb: Verb) -> Shorthand<'_> {
        Shorthand {
            dispatcher: self,
            entry: &self.verbs[verb as usize],
        }
    }

    /// All buffered shorthands, in [`Verb::ALL`] order.
    pub fn shorthands(&self) -> impl Iterator<Item = Shorthand<'_>> {
        self.verbs.iter().map(move |entry| Shorthand {
            dispatcher: self,
            entry,
        })
    }

    /// The streaming namespace, named `request.stream`.
    pub fn stream(&self) -> StreamDispatcher<'_> {
        StreamDispatcher { dispatcher: self }
    }

    verb_methods! {
        get => Get,
        head => Head,
        post => Post,
        put => Put,
        delete => Delete,
        ///
        /// hyper writes CONNECT in authority form (`host:port`), so the URL
        /// path is not sent. Only useful against proxies.
        connect => Connect,
        options => Options,
        trace => Trace,
        path => Path,
    }
}

/// A dispatcher function with its method (and possibly the streaming flag)
/// preset. The name is only for introspection.
#[derive(Debug, Clone, Copy)]
pub struct Shorthand<'a> {
    dispatcher: &'a Dispatcher,
    entry: &'a VerbEntry,
}

impl<'a> Shorthand<'a> {
    pub fn name(&self) -> &'static str {
        self.entry.name
    }

    pub fn verb(&self) -> Verb {
        self.entry.verb
    }

    pub fn is_stream(&self) -> bool {
        self.entry.is_stream
    }

    /// Apply the presets on top of `options`.
    pub fn preset(&self, options: RequestOptions) -> RequestOptions {
        let mut options = options.with_verb(self.entry.verb);
        if self.entry.is_stream {
            options.is_stream = true;
        }
        options
    }

    pub async fn call(&self, options: RequestOptions) -> Result<Reply, Error> {
        self.dispatcher.request(self.preset(options)).await
    }
}

/// Dispatches with the streaming flag forced on.
#[derive(Debug, Clone, Copy)]
pub struct StreamDispatcher<'a> {
    dispatcher: &'a Dispatcher,
}

impl<'a> StreamDispatcher<'a> {
    pub fn name(&self) -> &'static str {
        "request.stream"
    }

    pub async fn request(&self, options: RequestOptions) -> Result<ResponseStream, Error> {
        self.dispatcher
            .prepare(options.streaming())?
            .send_stream()
            .await
    }

    /// Shorthand entry for `verb`, e.g. named `request.stream GET`.
    pub fn shorthand(&self, verb: Verb) -> Shorthand<'a> {
        Shorthand {
            dispatcher: self.dispatcher,
            entry: &self.dispatcher.stream_verbs[verb as usize],
        }
    }

    pub fn shorthands(&self) -> impl Iterator<Item = Shorthand<'a>> {
        let dispatcher = self.dispatcher;
        dispatcher.stream_verbs.iter().map(move |entry| Shorthand {
            dispatcher,
            entry,
        })
    }

    stream_verb_methods! {
        get => Get,
        head => Head,
        post => Post,
        put => Put,
        delete => Delete,
        ///
        /// hyper writes CONNECT in authority form (`host:port`), so the URL
        /// path is not sent. Only useful against proxies.
        connect => Connect,
        options => Options,
        trace => Trace,
        path => Path,
    }
}

/// A fully resolved request that has not been sent yet.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    client: Client,
    method: Method,
    url: Url,
    transport: Transport,
    port: u16,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
    is_stream: bool,
}

impl PreparedRequest {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Encoded body exactly as it will be written.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn is_stream(&self) -> bool {
        self.is_stream
    }

    /// Perform the exchange, buffering or streaming per the request's flag.
    pub async fn send(self) -> Result<Reply, Error> {
        if self.is_stream {
            Ok(Reply::Stream(self.send_stream().await?))
        } else {
            Ok(Reply::Buffered(self.send_buffered().await?))
        }
    }

    /// Hand back the response as soon as its headers are in.
    pub async fn send_stream(self) -> Result<ResponseStream, Error> {
        let response = self.execute().await?;
        log::debug!("streaming {} from {}", response.status(), response.url());
        Ok(ResponseStream::new(response))
    }

    /// Drain and decode the body, failing on status codes above 400.
    pub async fn send_buffered(self) -> Result<Response, Error> {
        let response = self.execute().await?;
        let status_code = response.status().as_u16();
        let body = try_parse(response.text().await?);

        if status_code > FAILURE_THRESHOLD {
            log::debug!("request failed with status {}", status_code);
            return Err(RequestError::new(status_code, body).into());
        }

        Ok(Response { status_code, body })
    }

    async fn execute(self) -> Result<reqwest::Response, Error> {
        log::debug!("{} {}", self.method, self.url);

        let mut builder = self
            .client
            .request(self.method, self.url)
            .headers(self.headers);

        if let Some(body) = self.body {
            builder = builder.body(body);
        }

        Ok(builder.send().await?)
    }
}
