use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::payload::Payload;

/// Defaults bound to a dispatcher for a family of requests.
///
/// Never mutated once the dispatcher is built.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ContextOptions {
    /// Scheme, host and optional base path that relative request paths are joined onto.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,

    /// Port used when the request itself does not name one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl ContextOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }
}

/// Per-call options for a single request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// Fully qualified URL. Takes priority over `path`.
    pub url: Option<String>,

    /// Path joined onto the context origin when no `url` is given.
    pub path: Option<String>,

    /// HTTP method, case-insensitive. Defaults to GET.
    pub method: Option<String>,

    pub body: Option<Payload>,

    /// Overrides both the context port and the port in the URL.
    pub port: Option<u16>,

    /// Hand back the live response instead of buffering it.
    pub is_stream: bool,

    pub headers: HashMap<String, String>,
}

impl RequestOptions {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_verb(self, verb: Verb) -> Self {
        self.with_method(verb.as_str())
    }

    pub fn with_body(mut self, body: impl Into<Payload>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_json(mut self, body: impl Serialize) -> Result<Self, serde_json::Error> {
        self.body = Some(Payload::Json(serde_json::to_value(body)?));
        Ok(self)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn streaming(mut self) -> Self {
        self.is_stream = true;
        self
    }
}

/// Verbs that get a shorthand on every dispatcher.
///
/// `Path` is a verb in its own right and sends the `PATH` method. It has
/// nothing to do with [`RequestOptions::path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Path,
}

impl Verb {
    pub const ALL: [Verb; 9] = [
        Verb::Get,
        Verb::Head,
        Verb::Post,
        Verb::Put,
        Verb::Delete,
        Verb::Connect,
        Verb::Options,
        Verb::Trace,
        Verb::Path,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "get",
            Verb::Head => "head",
            Verb::Post => "post",
            Verb::Put => "put",
            Verb::Delete => "delete",
            Verb::Connect => "connect",
            Verb::Options => "options",
            Verb::Trace => "trace",
            Verb::Path => "path",
        }
    }

    pub(crate) fn shorthand_name(self) -> &'static str {
        match self {
            Verb::Get => "request GET",
            Verb::Head => "request HEAD",
            Verb::Post => "request POST",
            Verb::Put => "request PUT",
            Verb::Delete => "request DELETE",
            Verb::Connect => "request CONNECT",
            Verb::Options => "request OPTIONS",
            Verb::Trace => "request TRACE",
            Verb::Path => "request PATH",
        }
    }

    pub(crate) fn stream_shorthand_name(self) -> &'static str {
        match self {
            Verb::Get => "request.stream GET",
            Verb::Head => "request.stream HEAD",
            Verb::Post => "request.stream POST",
            Verb::Put => "request.stream PUT",
            Verb::Delete => "request.stream DELETE",
            Verb::Connect => "request.stream CONNECT",
            Verb::Options => "request.stream OPTIONS",
            Verb::Trace => "request.stream TRACE",
            Verb::Path => "request.stream PATH",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which transport a resolved URL goes out on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Plain,
    Secure,
}

impl Transport {
    pub(crate) fn for_scheme(scheme: &str) -> Self {
        if scheme == "https" {
            Transport::Secure
        } else {
            Transport::Plain
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            Transport::Plain => 80,
            Transport::Secure => 443,
        }
    }

    pub(crate) fn scheme(self) -> &'static str {
        match self {
            Transport::Plain => "http",
            Transport::Secure => "https",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_options_from_config() {
        let options: ContextOptions =
            serde_json::from_str(r#"{"origin": "http://star.trek", "port": 3000}"#).unwrap();
        assert_eq!(
            options,
            ContextOptions::new()
                .with_origin("http://star.trek")
                .with_port(3000)
        );

        let empty: ContextOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, ContextOptions::default());
    }

    #[test]
    fn with_verb_presets_method() {
        let options = RequestOptions::url("http://star.trek").with_verb(Verb::Delete);
        assert_eq!(options.method.as_deref(), Some("delete"));
    }

    #[test]
    fn with_json_serializes_value() {
        #[derive(Serialize)]
        struct Captain {
            name: &'static str,
        }

        let options = RequestOptions::path("captains")
            .with_json(Captain { name: "Jean Luc" })
            .unwrap();
        assert_eq!(
            options.body,
            Some(Payload::Json(serde_json::json!({"name": "Jean Luc"})))
        );
    }

    #[test]
    fn verb_table_covers_every_verb_once() {
        let names: Vec<&str> = Verb::ALL.iter().map(|v| v.as_str()).collect();
        assert_eq!(
            names,
            vec!["get", "head", "post", "put", "delete", "connect", "options", "trace", "path"]
        );
    }

    #[test]
    fn transport_defaults() {
        assert_eq!(Transport::for_scheme("https"), Transport::Secure);
        assert_eq!(Transport::for_scheme("http"), Transport::Plain);
        assert_eq!(Transport::for_scheme("ws"), Transport::Plain);
        assert_eq!(Transport::Secure.default_port(), 443);
        assert_eq!(Transport::Plain.default_port(), 80);
    }
}
