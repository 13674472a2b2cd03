use crate::extract::ClientMetrics;

/// Aggregate view over the successful clients of one benchmark.
///
/// Averages are `None` when there is nothing to average over, never `0`.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateReport {
    pub successful_count: usize,
    pub total_count: usize,
    /// Mean over clients that observed a first RTP packet.
    pub avg_first_rtp_ms: Option<f64>,
    /// Number of successful clients contributing to `avg_first_rtp_ms`.
    pub first_rtp_observed: usize,
    /// Mean over every successful client, defaults included.
    pub avg_max_bitrate_kbps: Option<f64>,
    pub avg_max_packet_rate: Option<f64>,
}

impl AggregateReport {
    /// Builds the report from the metrics of successful clients only.
    #[must_use]
    pub fn from_successful(metrics: &[ClientMetrics], total_count: usize) -> Self {
        let rtp: Vec<f64> = metrics
            .iter()
            .filter_map(|m| m.first_rtp_latency_ms)
            .collect();

        Self {
            successful_count: metrics.len(),
            total_count,
            avg_first_rtp_ms: mean(rtp.iter().copied()),
            first_rtp_observed: rtp.len(),
            avg_max_bitrate_kbps: mean(metrics.iter().map(|m| m.max_bitrate_kbps)),
            avg_max_packet_rate: mean(metrics.iter().map(|m| m.max_packet_rate as f64)),
        }
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.total_count.saturating_sub(self.successful_count)
    }

    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.successful_count == self.total_count
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}
