//! Immutable URL wrapper used throughout the scheduler.
//!
//! `ImUrl` shares the parsed `url::Url` via `Arc` so cloning a queued token is
//! cheap, and exposes the canonicalization the Frontier's visited-set relies
//! on: lowercase scheme/host, default port stripped, fragment removed.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::str::FromStr;
use std::sync::Arc;
use url::Url;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImUrl {
    url_str: Cow<'static, str>,
    url: Arc<Url>,
}

impl ImUrl {
    pub fn parse(input: &str) -> Result<Self> {
        let parsed_url = Url::parse(input).context("Failed to parse URL")?;
        let url_str = Cow::Owned(parsed_url.as_str().to_string());
        let url = Arc::new(parsed_url);
        Ok(Self { url_str, url })
    }

    pub fn as_str(&self) -> &str {
        &self.url_str
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }

    pub fn port(&self) -> Option<u16> {
        self.url.port()
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn fragment(&self) -> Option<&str> {
        self.url.fragment()
    }

    /// Returns the canonical form used as the Frontier's visited-set key:
    /// lowercase scheme and host, default port stripped, fragment removed.
    pub fn canonical(&self) -> Result<String> {
        let mut url = (*self.url).clone();
        let _ = url.set_scheme(&url.scheme().to_ascii_lowercase());
        if let Some(host) = url.host_str() {
            let lower = host.to_ascii_lowercase();
            url.set_host(Some(&lower)).context("failed to set host")?;
        }
        url.set_fragment(None);

        // Strip the port if it matches the scheme's default (url already
        // omits it from `port()` in that case, but `set_port` can leave an
        // explicit one behind if it was given explicitly in the input).
        if let Some(port) = url.port()
            && Some(port) == default_port_for_scheme(url.scheme())
        {
            url.set_port(None)
                .map_err(|()| anyhow::anyhow!("failed to strip default port"))?;
        }

        Ok(url.as_str().to_string())
    }

    pub fn resolve(&self, relative: &str) -> Result<Self> {
        let joined = self.url.join(relative).context("failed to join URL")?;
        Self::parse(joined.as_str())
    }
}

fn default_port_for_scheme(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}

impl fmt::Display for ImUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url_str)
    }
}

impl Hash for ImUrl {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url_str.hash(state);
    }
}

impl FromStr for ImUrl {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ImUrl {
    type Error = anyhow::Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl TryFrom<&str> for ImUrl {
    type Error = anyhow::Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for ImUrl {
    fn as_ref(&self) -> &str {
        &self.url_str
    }
}

impl Deref for ImUrl {
    type Target = Url;

    fn deref(&self) -> &Self::Target {
        &self.url
    }
}
