use crate::url::matches_domain;
use crate::{UrlError, UrlResult};
use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use category_crawler::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// The boundary of one domain crawl
///
/// Built from a configured domain such as `example.com` (or
/// `127.0.0.1:8080` when a port is given). A URL is in scope when its host
/// is the root or a subdomain of it and, if the domain names a port, the
/// URL targets that port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlScope {
    host: String,
    port: Option<u16>,
}

impl CrawlScope {
    /// Parses a configured domain string
    pub fn parse(domain: &str) -> UrlResult<Self> {
        let domain = domain.trim();
        if domain.is_empty() || domain.contains('/') {
            return Err(UrlError::Parse(format!("'{}' is not a bare domain", domain)));
        }

        let url = Url::parse(&format!("http://{}", domain))
            .map_err(|e| UrlError::Parse(format!("{}: {}", domain, e)))?;
        let host = extract_domain(&url).ok_or(UrlError::MissingDomain)?;

        Ok(Self {
            host,
            port: url.port(),
        })
    }

    /// The root hostname
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Host plus explicit port, as used to build URLs for this domain
    pub fn authority(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        }
    }

    /// Returns `scheme://authority{path}` for this domain
    pub fn url_for(&self, scheme: &str, path: &str) -> UrlResult<Url> {
        Url::parse(&format!("{}://{}{}", scheme, self.authority(), path))
            .map_err(|e| UrlError::Parse(e.to_string()))
    }

    /// Checks whether a URL belongs to this crawl
    pub fn contains(&self, url: &Url) -> bool {
        if url.scheme() != "http" && url.scheme() != "https" {
            return false;
        }

        let Some(host) = extract_domain(url) else {
            return false;
        };

        if !matches_domain(&self.host, &host) {
            return false;
        }

        match self.port {
            Some(port) => url.port_or_known_default() == Some(port),
            None => true,
        }
    }
}
