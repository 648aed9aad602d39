use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Invalid page URL {url}: {source}")]
    Invalid {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// The address of the page a document was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    url: Url,
}

impl PageLocation {
    pub fn parse(href: &str) -> Result<Self, LocationError> {
        let url = Url::parse(href).map_err(|source| LocationError::Invalid {
            url: href.to_string(),
            source,
        })?;
        Ok(Self { url })
    }

    pub fn href(&self) -> &str {
        self.url.as_str()
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Host name without port, empty for host-less URLs.
    pub fn hostname(&self) -> &str {
        self.url.host_str().unwrap_or("")
    }

    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    pub fn pathname(&self) -> &str {
        self.url.path()
    }

    /// The first `depth` `/`-separated pieces of the path, counting the empty
    /// piece before the leading slash: depth 3 of `/o/r/pull/1` is `/o/r`.
    pub fn path_prefix(&self, depth: usize) -> String {
        self.pathname()
            .split('/')
            .take(depth)
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl std::fmt::Display for PageLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.href())
    }
}
