use log::error;
use std::io::{self, Write};

use crate::aggregate::{CycleReport, Tally};

/// Percentage of successful probes, rounded half to even.
///
/// Computed with integer arithmetic, so ties such as 1/8 (12.5%) are exact
/// and round to the even neighbour (12). This deliberately differs from
/// rounding the floating-point quotient, where representation error can
/// push a tie either way (23/40 is 57.49999... as a float, 58 here).
/// Returns `None` for an empty tally.
#[must_use]
pub fn calculate_availability(tally: Tally) -> Option<u8> {
    let success = u64::from(tally.success());
    let total = u64::from(tally.total());
    if total == 0 {
        return None;
    }

    let scaled = success * 100;
    let quotient = scaled / total;
    let twice_remainder = (scaled % total) * 2;

    let rounded = if twice_remainder > total || (twice_remainder == total && quotient % 2 == 1) {
        quotient + 1
    } else {
        quotient
    };

    u8::try_from(rounded).ok()
}

pub fn write_cycle_header<W: Write>(out: &mut W, elapsed_secs: u64) -> io::Result<()> {
    writeln!(out, "\nTest cycle begins at time = {elapsed_secs} seconds:")
}

/// Writes one availability line per domain.
pub fn write_report<W: Write>(out: &mut W, report: &CycleReport) -> io::Result<()> {
    for (domain, tally) in report {
        debug_assert!(tally.total() > 0, "empty tally for {domain}");
        match calculate_availability(*tally) {
            Some(percentage) => {
                writeln!(out, "{domain} has {percentage}% availability percentage")?;
            }
            None => error!("Skipping {domain}: tally recorded no probes"),
        }
    }
    out.flush()
}
