use log::info;
use std::io::Write;
use std::time::Duration;
use tokio::{select, time::sleep};
use tokio_util::sync::CancellationToken;

use crate::aggregate::run_cycle;
use crate::config::{Config, Endpoint};
use crate::error::Error;
use crate::probe::{HttpProber, Probe};
use crate::report::{write_cycle_header, write_report};

/// Drives probe cycles at a fixed interval until cancelled.
pub struct Monitor<P> {
    endpoints: Vec<Endpoint>,
    prober: P,
    interval: Duration,
}

impl Monitor<HttpProber> {
    /// Builds a monitor that probes over HTTP with the configured settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: Config) -> Result<Self, Error> {
        info!("Timeout: {} seconds", config.settings.timeout.as_secs());
        info!(
            "Latency threshold: {} ms",
            config.settings.latency_threshold.as_millis()
        );

        let prober = HttpProber::new(&config.settings)?;
        Ok(Self::new(config.endpoints, prober, config.settings.interval))
    }
}

impl<P: Probe> Monitor<P> {
    pub fn new(endpoints: Vec<Endpoint>, prober: P, interval: Duration) -> Self {
        Self {
            endpoints,
            prober,
            interval,
        }
    }

    /// Runs cycles until `token` is cancelled, writing each cycle's header and
    /// per-domain availability lines to `out`.
    ///
    /// Cancellation is honoured before a cycle, while probing and while
    /// sleeping. A cycle interrupted mid-probe writes no availability lines.
    /// Returns the number of completed cycles.
    ///
    /// # Errors
    ///
    /// Returns an error only if writing to `out` fails.
    pub async fn run<W: Write>(&self, token: CancellationToken, out: &mut W) -> Result<u64, Error> {
        info!("Starting availability monitoring...");
        info!("Check interval: {} seconds", self.interval.as_secs());
        info!("Monitoring {} endpoints", self.endpoints.len());

        // Nominal elapsed time is cycle * interval; probe duration is not counted
        let mut cycle: u64 = 0;

        loop {
            if token.is_cancelled() {
                info!("Shutdown requested, stopping monitor");
                break;
            }

            write_cycle_header(out, cycle * self.interval.as_secs())?;

            let report = select! {
                report = run_cycle(&self.endpoints, &self.prober) => report,
                () = token.cancelled() => {
                    info!("Shutdown requested during probe cycle");
                    break;
                }
            };
            write_report(out, &report)?;
            cycle += 1;

            // Interruptible sleep
            select! {
                () = sleep(self.interval) => {},
                () = token.cancelled() => {
                    info!("Shutdown requested during sleep");
                    break;
                }
            }
        }

        info!("Availability monitoring stopped after {cycle} cycles");
        Ok(cycle)
    }
}
