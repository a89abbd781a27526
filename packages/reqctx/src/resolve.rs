//! URL and port resolution.
//!
//! Everything here runs before the network is touched, so every failure is
//! a configuration error.

use url::Url;

use crate::error::Error;
use crate::types::{ContextOptions, RequestOptions, Transport};

/// Where a request goes once the options and context have been combined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub url: Url,
    pub transport: Transport,
    pub port: u16,
}

/// Build the target URL from the request options and the bound context.
pub fn resolve_url(
    options: &RequestOptions,
    context: Option<&ContextOptions>,
) -> Result<Url, Error> {
    if let Some(url) = options.url.as_deref().filter(|url| !url.is_empty()) {
        return Ok(Url::parse(url)?);
    }

    let context = context.ok_or(Error::MissingUrl)?;
    let origin = context.origin.as_deref().ok_or(Error::MissingOrigin)?;

    join_origin(origin, options.path.as_deref().unwrap_or(""))
}

/// Join `path` onto `origin`, collapsing empty and `.` segments and
/// resolving `..`. The result never leaves the origin's host, and `..`
/// stops at the origin root.
pub fn join_origin(origin: &str, path: &str) -> Result<Url, Error> {
    let origin = Url::parse(origin)?;
    if origin.cannot_be_a_base() {
        return Err(Error::InvalidUrl {
            message: format!("origin '{}' cannot carry a path", origin),
        });
    }

    let (path, suffix) = match path.find(|c: char| c == '?' || c == '#') {
        Some(at) => path.split_at(at),
        None => (path, ""),
    };

    let normalized = normalize_segments(origin.path(), path);
    log::trace!("joined {} + {} -> {}{}", origin, path, normalized, suffix);

    // Written component by component so the path is never re-read as a
    // relative reference that could carry an authority.
    let (query, fragment) = match suffix.strip_prefix('#') {
        Some(fragment) => (None, Some(fragment)),
        None => match suffix.strip_prefix('?') {
            Some(rest) => match rest.split_once('#') {
                Some((query, fragment)) => (Some(query), Some(fragment)),
                None => (Some(rest), None),
            },
            None => (None, None),
        },
    };

    let mut url = origin;
    url.set_path(&normalized);
    url.set_query(query);
    url.set_fragment(fragment);
    Ok(url)
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

fn normalize_segments(base: &str, path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in base.split(is_separator).chain(path.split(is_separator)) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    let mut normalized = format!("/{}", segments.join("/"));
    let trailing = path.strip_suffix('.').unwrap_or(path);
    if !segments.is_empty() && trailing.ends_with(is_separator) {
        normalized.push('/');
    }
    normalized
}

/// Pick the transport and port for `url` and write the port back into it.
///
/// Precedence: explicit request port, context port, port already in the
/// URL, then the scheme default. A zero port counts as unset.
pub fn resolve_target(
    mut url: Url,
    request_port: Option<u16>,
    context_port: Option<u16>,
) -> Result<Target, Error> {
    if url.host_str().is_none() {
        return Err(Error::InvalidUrl {
            message: format!("'{}' has no host", url),
        });
    }

    let transport = Transport::for_scheme(url.scheme());
    let embedded = url.port();

    if url.scheme() != transport.scheme() {
        url.set_scheme(transport.scheme())
            .map_err(|()| Error::InvalidUrl {
                message: format!("scheme of '{}' cannot be sent over {}", url, transport.scheme()),
            })?;
    }

    let port = [request_port, context_port, embedded]
        .into_iter()
        .flatten()
        .find(|port| *port != 0)
        .unwrap_or_else(|| transport.default_port());

    url.set_port(Some(port)).map_err(|()| Error::InvalidUrl {
        message: format!("cannot set port {} on '{}'", port, url),
    })?;

    Ok(Target {
        url,
        transport,
        port,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(origin: &str, path: &str) -> String {
        join_origin(origin, path).unwrap().to_string()
    }

    #[test]
    fn full_url_needs_no_context() {
        let options = RequestOptions::url("http://star.trek/captains/jean-luc");
        let url = resolve_url(&options, None).unwrap();
        assert_eq!(url.as_str(), "http://star.trek/captains/jean-luc");
    }

    #[test]
    fn full_url_wins_over_context_path() {
        let context = ContextOptions::new().with_origin("http://star.trek");
        let mut options = RequestOptions::url("http://star.wars/jedi");
        options.path = Some("/captains".to_string());

        let url = resolve_url(&options, Some(&context)).unwrap();
        assert_eq!(url.as_str(), "http://star.wars/jedi");
    }

    #[test]
    fn path_without_context_is_rejected() {
        let err = resolve_url(&RequestOptions::path("/captain"), None).unwrap_err();
        assert!(matches!(err, Error::MissingUrl));
        assert_eq!(err.to_string(), "The request URL is mandatory.");
    }

    #[test]
    fn context_without_origin_is_rejected() {
        let context = ContextOptions::new().with_port(3000);
        let err = resolve_url(&RequestOptions::path("/captains"), Some(&context)).unwrap_err();
        assert!(matches!(err, Error::MissingOrigin));
        assert_eq!(err.to_string(), "The context's origin is mandatory.");
    }

    #[test]
    fn unparsable_url_is_a_configuration_error() {
        let err = resolve_url(&RequestOptions::url("star.trek/captains"), None).unwrap_err();
        assert!(matches!(err, Error::UrlParse(_)));
        assert!(err.is_configuration());
    }

    #[test]
    fn origin_and_path_are_normalized() {
        assert_eq!(joined("http://star.trek", "/captains"), "http://star.trek/captains");
        assert_eq!(joined("http://star.trek/", "captains"), "http://star.trek/captains");
        assert_eq!(
            joined("http://star.trek//", "//captains///kirk"),
            "http://star.trek/captains/kirk"
        );
        assert_eq!(
            joined("http://star.trek", "/captains/./picard/../kirk"),
            "http://star.trek/captains/kirk"
        );
        assert_eq!(joined("http://star.trek", "captains/"), "http://star.trek/captains/");
        assert_eq!(joined("http://star.trek", ""), "http://star.trek/");
    }

    #[test]
    fn origin_base_path_is_kept() {
        assert_eq!(joined("http://star.trek/api", "captains"), "http://star.trek/api/captains");
        assert_eq!(joined("http://star.trek/api/", "/../ships"), "http://star.trek/ships");
    }

    #[test]
    fn dot_dot_cannot_escape_the_host() {
        assert_eq!(
            joined("http://star.trek", "../../star.wars/jedi"),
            "http://star.trek/star.wars/jedi"
        );
        assert_eq!(
            join_origin("http://star.trek", "//star.wars/jedi").unwrap().host_str(),
            Some("star.trek")
        );
    }

    #[test]
    fn backslashes_cannot_escape_the_host() {
        for path in ["/\\star.wars/jedi", "\\\\star.wars/jedi", "\\/star.wars/jedi"] {
            let url = join_origin("http://star.trek", path).unwrap();
            assert_eq!(url.host_str(), Some("star.trek"), "path {:?}", path);
            assert_eq!(url.path(), "/star.wars/jedi");
        }

        let context = ContextOptions::new()
            .with_origin("http://star.trek")
            .with_port(3000);
        let options = RequestOptions::path("/\\star.wars/jedi");
        let url = resolve_url(&options, Some(&context)).unwrap();
        let target = resolve_target(url, None, context.port).unwrap();
        assert_eq!(target.url.as_str(), "http://star.trek:3000/star.wars/jedi");
    }

    #[test]
    fn fragment_without_query() {
        let url = join_origin("http://star.trek?old=1#old", "/captains#bio").unwrap();
        assert_eq!(url.path(), "/captains");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), Some("bio"));
    }

    #[test]
    fn query_and_fragment_survive_the_join() {
        let url = join_origin("http://star.trek", "/captains//?rank=captain#bio").unwrap();
        assert_eq!(url.path(), "/captains/");
        assert_eq!(url.query(), Some("rank=captain"));
        assert_eq!(url.fragment(), Some("bio"));
    }

    #[test]
    fn port_precedence() {
        let url = || Url::parse("http://star.trek:8080/captains").unwrap();
        let bare = || Url::parse("http://star.trek/captains").unwrap();

        assert_eq!(resolve_target(url(), Some(3000), Some(4000)).unwrap().port, 3000);
        assert_eq!(resolve_target(url(), None, Some(4000)).unwrap().port, 4000);
        assert_eq!(resolve_target(url(), None, None).unwrap().port, 8080);
        assert_eq!(resolve_target(bare(), None, None).unwrap().port, 80);
        assert_eq!(resolve_target(bare(), Some(3000), None).unwrap().port, 3000);
        assert_eq!(resolve_target(bare(), None, Some(4000)).unwrap().port, 4000);
        assert_eq!(resolve_target(url(), Some(0), Some(0)).unwrap().port, 8080);

        let secure = Url::parse("https://star.trek/captains").unwrap();
        let target = resolve_target(secure, None, None).unwrap();
        assert_eq!(target.transport, Transport::Secure);
        assert_eq!(target.port, 443);
    }

    #[test]
    fn port_is_written_into_the_url() {
        let url = Url::parse("http://star.trek/captains").unwrap();
        let target = resolve_target(url, Some(3000), None).unwrap();
        assert_eq!(target.url.as_str(), "http://star.trek:3000/captains");
        assert_eq!(target.url.port_or_known_default(), Some(3000));
    }

    #[test]
    fn other_schemes_go_out_as_plain_http() {
        let url = Url::parse("ws://star.trek:9000/feed").unwrap();
        let target = resolve_target(url, None, None).unwrap();
        assert_eq!(target.transport, Transport::Plain);
        assert_eq!(target.url.scheme(), "http");
        assert_eq!(target.port, 9000);

        let url = Url::parse("ftp://star.trek/logs").unwrap();
        let target = resolve_target(url, None, None).unwrap();
        assert_eq!(target.url.as_str(), "http://star.trek/logs");
        assert_eq!(target.port, 80);
    }

    #[test]
    fn url_without_host_is_rejected() {
        let url = Url::parse("mailto:kirk@star.trek").unwrap();
        let err = resolve_target(url, None, None).unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }));
    }
}
