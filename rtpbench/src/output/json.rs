use serde::Serialize;
use std::io::Write as _;
use std::sync::Arc;

use rtpbench_core::{BenchmarkResult, ClientEvent, ClientReport, RunOutcome};

use super::OutputFormatter;

pub(crate) struct JsonOutput;

impl OutputFormatter for JsonOutput {
    fn print_header(&self, _cfg: &rtpbench_core::BenchmarkConfig) {}

    fn progress(&self) -> Option<rtpbench_core::ProgressFn> {
        Some(Arc::new(move |event: ClientEvent| {
            let line = build_progress_line(&event);
            emit_json_line(&line);
        }))
    }

    fn print_summary(&self, result: &BenchmarkResult) -> anyhow::Result<()> {
        for client in &result.clients {
            emit_json_line(&build_client_line(client));
        }
        emit_json_line(&build_summary_line(result));
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonProgressLine {
    pub kind: &'static str,
    pub event: &'static str,
    pub client_id: u32,
    pub offset_ms: Option<u64>,
    pub status: Option<&'static str>,
}

fn build_progress_line(event: &ClientEvent) -> JsonProgressLine {
    match event {
        ClientEvent::Launched { client_id, offset } => JsonProgressLine {
            kind: "progress",
            event: "launched",
            client_id: *client_id,
            offset_ms: Some(offset.as_millis() as u64),
            status: None,
        },
        ClientEvent::Finished { client_id, outcome } => JsonProgressLine {
            kind: "progress",
            event: "finished",
            client_id: *client_id,
            offset_ms: None,
            status: Some(outcome.kind()),
        },
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonClientLine {
    pub kind: &'static str,
    pub client_id: u32,
    pub status: &'static str,
    pub exit_code: Option<i32>,
    pub reason: Option<String>,
    pub launched_at_ms: u64,
    pub elapsed_ms: u64,
    pub peak_rss_bytes: Option<u64>,
    pub output_lines: usize,

    pub first_rtp_latency_ms: Option<f64>,
    pub max_bitrate_kbps: Option<f64>,
    pub max_packet_rate: Option<u64>,
}

fn build_client_line(client: &ClientReport) -> JsonClientLine {
    let run = &client.run;
    let (exit_code, reason) = match &run.outcome {
        RunOutcome::Success => (Some(0), None),
        RunOutcome::NonZeroExit(code) => (Some(*code), None),
        RunOutcome::Timeout => (None, None),
        RunOutcome::Failed { reason } => (None, Some(reason.clone())),
    };

    JsonClientLine {
        kind: "client",
        client_id: run.client_id,
        status: run.outcome.kind(),
        exit_code,
        reason,
        launched_at_ms: run.launched_at.as_millis() as u64,
        elapsed_ms: run.elapsed.as_millis() as u64,
        peak_rss_bytes: run.peak_rss_bytes,
        output_lines: run.output.len(),

        first_rtp_latency_ms: client.metrics.as_ref().and_then(|m| m.first_rtp_latency_ms),
        max_bitrate_kbps: client.metrics.as_ref().map(|m| m.max_bitrate_kbps),
        max_packet_rate: client.metrics.as_ref().map(|m| m.max_packet_rate),
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonSummaryLine {
    pub kind: &'static str,
    pub successful_count: usize,
    pub total_count: usize,
    pub failed_count: usize,
    pub failed_clients: Vec<u32>,
    pub avg_first_rtp_ms: Option<f64>,
    pub first_rtp_observed: usize,
    pub avg_max_bitrate_kbps: Option<f64>,
    pub avg_max_packet_rate: Option<f64>,
    pub elapsed_ms: u64,
}

fn build_summary_line(result: &BenchmarkResult) -> JsonSummaryLine {
    let report = &result.report;
    JsonSummaryLine {
        kind: "summary",
        successful_count: report.successful_count,
        total_count: report.total_count,
        failed_count: report.failed_count(),
        failed_clients: result.failed().map(|r| r.client_id).collect(),
        avg_first_rtp_ms: report.avg_first_rtp_ms,
        first_rtp_observed: report.first_rtp_observed,
        avg_max_bitrate_kbps: report.avg_max_bitrate_kbps,
        avg_max_packet_rate: report.avg_max_packet_rate,
        elapsed_ms: result.elapsed.as_millis() as u64,
    }
}

fn emit_json_line<T: Serialize>(line: &T) {
    let mut out = std::io::stdout().lock();
    if serde_json::to_writer(&mut out, line).is_ok() {
        let _ = writeln!(out);
    }
}
