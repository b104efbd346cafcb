//! Robots consultation port and its concrete `/robots.txt`-backed policy.

use crate::collaborators::fetcher::Fetcher;
use crate::imurl::ImUrl;
use crate::scheduler::errors::{Cause, ClassifiedError};
use robotstxt::DefaultMatcher;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisallowReason {
    None,
    DisallowedByRobots,
}

#[derive(Clone, Debug)]
pub struct Decision {
    pub allowed: bool,
    pub reason: DisallowReason,
    pub crawl_delay: Option<Duration>,
}

pub trait Robots {
    fn decide(
        &self,
        url: &ImUrl,
    ) -> impl std::future::Future<Output = Result<Decision, ClassifiedError>> + Send;
}

struct CachedPolicy {
    body: String,
    crawl_delay: Option<Duration>,
}

/// Fetches `/robots.txt` once per host via the injected [`Fetcher`], parses
/// it with the `robotstxt` matcher, and caches the parsed policy for the
/// life of the run. The cache is owned by this struct instance — the one
/// acceptable kind of internal cache, never a global.
pub struct TxtRobotsPolicy<F> {
    fetcher: F,
    user_agent: String,
    cache: Mutex<HashMap<String, Option<CachedPolicy>>>,
}

impl<F: Fetcher> TxtRobotsPolicy<F> {
    pub fn new(fetcher: F, user_agent: impl Into<String>) -> Self {
        Self {
            fetcher,
            user_agent: user_agent.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn robots_url(url: &ImUrl) -> Result<ImUrl, ClassifiedError> {
        let origin = format!(
            "{}://{}{}",
            url.scheme(),
            url.host().unwrap_or_default(),
            url.port()
                .map(|p| format!(":{p}"))
                .unwrap_or_default()
        );
        ImUrl::parse(&format!("{origin}/robots.txt"))
            .map_err(|e| ClassifiedError::recoverable(Cause::RobotsParse(e.to_string())))
    }

    async fn fetch_and_parse(&self, url: &ImUrl) -> Result<Option<CachedPolicy>, ClassifiedError> {
        let robots_url = Self::robots_url(url)?;
        match self.fetcher.fetch(&robots_url).await {
            Ok(result) if result.status == 404 => Ok(None),
            Ok(result) if (200..300).contains(&result.status) => {
                let crawl_delay = extract_crawl_delay(&result.body, &self.user_agent);
                Ok(Some(CachedPolicy {
                    body: result.body,
                    crawl_delay,
                }))
            }
            Ok(result) if result.status == 429 => {
                Err(ClassifiedError::from_cause(Cause::RobotsHttpTooManyRequests))
            }
            Ok(result) if (500..600).contains(&result.status) => {
                Err(ClassifiedError::from_cause(Cause::RobotsHttpServerError))
            }
            Ok(result) => Err(ClassifiedError::from_cause(
                Cause::RobotsHttpUnexpectedStatus(result.status),
            )),
            Err(err) => Err(ClassifiedError::from_cause(Cause::RobotsTransport(
                err.to_string(),
            ))),
        }
    }
}

impl<F: Fetcher + Sync> Robots for TxtRobotsPolicy<F> {
    async fn decide(&self, url: &ImUrl) -> Result<Decision, ClassifiedError> {
        let host = url.host().unwrap_or_default().to_string();

        let already_cached = {
            let cache = self.cache.lock().expect("robots cache lock poisoned");
            cache.contains_key(&host)
        };

        if !already_cached {
            let parsed = self.fetch_and_parse(url).await?;
            let mut cache = self.cache.lock().expect("robots cache lock poisoned");
            cache.insert(host.clone(), parsed);
        }

        let (body, crawl_delay) = {
            let cache = self.cache.lock().expect("robots cache lock poisoned");
            match cache.get(&host).expect("just inserted or already present") {
                Some(policy) => (Some(policy.body.clone()), policy.crawl_delay),
                None => (None, None),
            }
        };

        let allowed = match &body {
            Some(body) => DefaultMatcher::default().one_agent_allowed_by_robots(
                body,
                &self.user_agent,
                url.as_str(),
            ),
            None => true,
        };

        Ok(Decision {
            allowed,
            reason: if allowed {
                DisallowReason::None
            } else {
                DisallowReason::DisallowedByRobots
            },
            crawl_delay,
        })
    }
}

/// Lets a caller retain a handle to a `Robots` implementation (e.g. to read
/// back a call counter in a test) while the scheduler holds its own `Arc`.
impl<T: Robots + ?Sized + Sync> Robots for Arc<T> {
    async fn decide(&self, url: &ImUrl) -> Result<Decision, ClassifiedError> {
        (**self).decide(url).await
    }
}

fn extract_crawl_delay(body: &str, user_agent: &str) -> Option<Duration> {
    let mut in_matching_group = false;
    let mut fallback_delay = None;
    let mut agent_delay = None;

    for line in body.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();

        match key.as_str() {
            "user-agent" => {
                in_matching_group = value == "*"
                    || user_agent.to_ascii_lowercase().contains(&value.to_ascii_lowercase());
                if value == "*" && fallback_delay.is_none() {
                    in_matching_group = true;
                }
            }
            "crawl-delay" => {
                if let Ok(secs) = value.parse::<f64>() {
                    let delay = Duration::from_secs_f64(secs);
                    if in_matching_group {
                        agent_delay = Some(delay);
                    } else {
                        fallback_delay = fallback_delay.or(Some(delay));
                    }
                }
            }
            _ => {}
        }
    }

    agent_delay.or(fallback_delay)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_crawl_delay_for_matching_agent() {
        let body = "User-agent: docscrape\nCrawl-delay: 5\n";
        let delay = extract_crawl_delay(body, "docscrape/0.1");
        assert_eq!(delay, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_extract_crawl_delay_falls_back_to_wildcard() {
        let body = "User-agent: *\nCrawl-delay: 2\n";
        let delay = extract_crawl_delay(body, "docscrape/0.1");
        assert_eq!(delay, Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_extract_crawl_delay_absent() {
        let body = "User-agent: *\nDisallow: /private\n";
        let delay = extract_crawl_delay(body, "docscrape/0.1");
        assert_eq!(delay, None);
    }
}
