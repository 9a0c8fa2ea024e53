//! Access to the metadata service.
//!
//! The engine only sees [`MetadataSource`]; [`HttpSource`] is the real
//! implementation, talking to the service over blocking HTTP.

use std::io::Read;

use tracing::debug;

use crate::{Config, Error, Result};

/// Representation requested from the metadata service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accept {
    /// Structured listing (`application/json`).
    Json,
    /// Raw scalar value (`text/plain`).
    Text,
}

impl Accept {
    pub fn mime(&self) -> &'static str {
        match self {
            Accept::Json => "application/json",
            Accept::Text => "text/plain",
        }
    }
}

/// Read-only key/value hierarchy the query engine retrieves from.
pub trait MetadataSource {
    /// Fetch the body at `path` (relative to the base URL, no leading
    /// slash) in the requested representation.
    fn fetch(&self, path: &str, accept: Accept) -> Result<String>;
}

impl<T: MetadataSource + ?Sized> MetadataSource for &T {
    fn fetch(&self, path: &str, accept: Accept) -> Result<String> {
        (**self).fetch(path, accept)
    }
}

/// Metadata source backed by the HTTP API.
pub struct HttpSource {
    config: Config,
    agent: ureq::Agent,
}

impl HttpSource {
    pub fn new(config: &Config) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout())
            .user_agent(&config.user_agent)
            .build();
        Self {
            config: config.clone(),
            agent,
        }
    }

    /// Base URL requests are resolved against.
    pub fn base_url(&self) -> &str {
        &self.config.metadata_url
    }
}

impl MetadataSource for HttpSource {
    fn fetch(&self, path: &str, accept: Accept) -> Result<String> {
        let url = self.config.url_for(path);
        debug!(url = %url, accept = accept.mime(), "fetching metadata");

        let response = match self.agent.get(&url).set("Accept", accept.mime()).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, response)) => {
                return Err(Error::Retrieval {
                    url,
                    message: format!("HTTP {} {}", code, response.status_text()),
                });
            }
            Err(transport) => {
                return Err(Error::Retrieval {
                    url,
                    message: transport.to_string(),
                });
            }
        };

        // Read the whole body; `into_string` caps it at 10 MB.
        let mut body = Vec::new();
        if let Err(e) = response.into_reader().read_to_end(&mut body) {
            return Err(Error::Retrieval {
                url,
                message: format!("Failed to read body: {}", e),
            });
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}
