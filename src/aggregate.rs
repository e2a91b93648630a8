use log::debug;
use std::collections::BTreeMap;
use url::Url;

use crate::config::Endpoint;
use crate::error::Error;
use crate::probe::{Outcome, Probe};

/// Per-domain results of one cycle, ordered by domain.
pub type CycleReport = BTreeMap<String, Tally>;

/// Successful and total probe counts for one domain within one cycle.
///
/// `success <= total` always holds.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    success: u32,
    total: u32,
}

impl Tally {
    /// Returns `None` if `success` exceeds `total`.
    #[must_use]
    pub fn new(success: u32, total: u32) -> Option<Self> {
        (success <= total).then_some(Self { success, total })
    }

    pub fn record(&mut self, outcome: Outcome) {
        self.total += 1;
        if outcome == Outcome::Up {
            self.success += 1;
        }
    }

    #[must_use]
    pub fn success(&self) -> u32 {
        self.success
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }
}

/// Extracts the aggregation key (`host` or `host:port`) from a URL string.
///
/// # Errors
///
/// Returns an error if `url` is not an absolute URL with a host.
pub fn extract_domain(url: &str) -> Result<String, Error> {
    let parsed = Url::parse(url)?;
    domain_of(&parsed).ok_or_else(|| Error::Config(format!("missing host in {url}")))
}

/// Host and explicit non-default port of `url`. Scheme, credentials, path and
/// query are dropped.
///
/// Unlike a raw network-location split, WHATWG parsing lowercases the host
/// and drops a port equal to the scheme default, so `https://API.Example.com:443/`
/// and `https://api.example.com/` share the key `api.example.com`.
#[must_use]
pub fn domain_of(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Probes every endpoint once, in order, and tallies the outcomes per domain.
pub async fn run_cycle<P: Probe>(endpoints: &[Endpoint], prober: &P) -> CycleReport {
    let mut report = CycleReport::new();

    for endpoint in endpoints {
        let outcome = prober.probe(endpoint).await;
        // Endpoints are validated to have a host when loaded
        let Some(domain) = domain_of(&endpoint.url) else {
            continue;
        };
        debug!(
            "Endpoint {} has status {outcome}",
            endpoint.name.as_deref().unwrap_or(endpoint.url.as_str())
        );

        report.entry(domain).or_default().record(outcome);
    }

    report
}
