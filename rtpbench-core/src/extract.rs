//! Metric extraction from captured client output.
//!
//! The client prints progress lines such as:
//!
//! ```text
//! 2025/01/01 12:00:00 📦 Time to First RTP: 112.43ms
//! 2025/01/01 12:00:01 📈 Packets: 42/s | Bitrate: 910.25 kbps
//! ```
//!
//! Each metric has a small grammar: a case-sensitive marker followed by a
//! numeric capture and a unit token. A marker whose payload does not fit the
//! grammar is ignored; extraction never fails.

const FIRST_RTP_MARKER: &str = "Time to First RTP";
const BITRATE_MARKER: &str = "Bitrate:";
const PACKETS_MARKER: &str = "Packets:";

const MS_UNIT: &str = "ms";
const KBPS_UNIT: &str = "kbps";
const PER_SECOND_UNIT: &str = "/s";

/// Metrics derived from one client's output stream.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientMetrics {
    pub client_id: u32,
    /// Latched on the first matching line; later matches are ignored.
    pub first_rtp_latency_ms: Option<f64>,
    pub max_bitrate_kbps: f64,
    pub max_packet_rate: u64,
}

/// Running extraction state for a single client.
///
/// Lines are fed in output order with [`MetricExtractor::observe`]. The bitrate
/// and packet-rate fields are running maxima and never decrease.
#[derive(Debug, Clone)]
pub struct MetricExtractor {
    metrics: ClientMetrics,
}

impl MetricExtractor {
    #[must_use]
    pub fn new(client_id: u32) -> Self {
        Self {
            metrics: ClientMetrics {
                client_id,
                first_rtp_latency_ms: None,
                max_bitrate_kbps: 0.0,
                max_packet_rate: 0,
            },
        }
    }

    /// Applies every rule to `line`. Rules are independent: one line may
    /// update several metrics.
    pub fn observe(&mut self, line: &str) {
        if self.metrics.first_rtp_latency_ms.is_none()
            && let Some(ms) = parse_first_rtp_ms(line)
        {
            self.metrics.first_rtp_latency_ms = Some(ms);
        }

        if let Some(kbps) = parse_bitrate_kbps(line) {
            self.metrics.max_bitrate_kbps = self.metrics.max_bitrate_kbps.max(kbps);
        }

        if let Some(pps) = parse_packet_rate(line) {
            self.metrics.max_packet_rate = self.metrics.max_packet_rate.max(pps);
        }
    }

    #[must_use]
    pub fn finish(self) -> ClientMetrics {
        self.metrics
    }
}

/// Extracts metrics from a full line sequence in a single pass.
pub fn extract<I, S>(client_id: u32, lines: I) -> ClientMetrics
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut extractor = MetricExtractor::new(client_id);
    for line in lines {
        extractor.observe(line.as_ref());
    }
    extractor.finish()
}

fn parse_first_rtp_ms(line: &str) -> Option<f64> {
    // Example: 📦 Time to First RTP: 112.43ms
    // The first number followed by `ms` after the marker wins.
    let (_, mut rest) = line.split_once(FIRST_RTP_MARKER)?;
    loop {
        let start = rest.find(is_decimal_char)?;
        let (num, tail) = split_number(&rest[start..], true);
        if tail.trim_start().starts_with(MS_UNIT) {
            return parse_finite(num);
        }
        rest = tail;
    }
}

fn parse_bitrate_kbps(line: &str) -> Option<f64> {
    // Example: Bitrate: 910.25 kbps
    let (_, rest) = line.split_once(BITRATE_MARKER)?;
    let (num, tail) = split_number(rest.trim_start(), true);
    if num.is_empty() || !tail.trim_start().starts_with(KBPS_UNIT) {
        return None;
    }
    parse_finite(num)
}

fn parse_packet_rate(line: &str) -> Option<u64> {
    // Example: Packets: 42/s
    let (_, rest) = line.split_once(PACKETS_MARKER)?;
    let (num, tail) = split_number(rest.trim_start(), false);
    if num.is_empty() || !tail.starts_with(PER_SECOND_UNIT) {
        return None;
    }
    num.parse().ok()
}

fn is_decimal_char(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}

fn split_number(s: &str, decimal: bool) -> (&str, &str) {
    let end = s
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || (decimal && *c == '.')))
        .map_or(s.len(), |(idx, _)| idx);
    s.split_at(end)
}

fn parse_finite(num: &str) -> Option<f64> {
    num.parse::<f64>().ok().filter(|v| v.is_finite())
}
