use std::fmt::Write as _;

use rtpbench_core::{BenchmarkResult, ClientReport};

use super::format::{format_bytes, format_opt, format_secs};

pub(super) fn render(result: &BenchmarkResult) -> String {
    let mut out = String::new();

    out.push_str("=== Benchmark Results ===\n");
    for client in &result.clients {
        render_client(&mut out, client);
    }

    let report = &result.report;
    out.push('\n');
    writeln!(
        out,
        "successful clients: {} / {}",
        report.successful_count, report.total_count
    )
    .ok();

    let failed = result
        .failed()
        .map(|r| format!("client-{} ({})", r.client_id, r.outcome))
        .collect::<Vec<_>>();
    if !failed.is_empty() {
        writeln!(
            out,
            "failed ({}): {}",
            report.failed_count(),
            failed.join(", ")
        )
        .ok();
    }

    if report.successful_count == 0 {
        out.push_str("averages: n/a (no successful clients)\n");
        return out;
    }

    out.push_str("averages:\n");
    writeln!(
        out,
        "  first_rtp: {} ({} of {} clients)",
        format_opt(report.avg_first_rtp_ms, "ms"),
        report.first_rtp_observed,
        report.successful_count
    )
    .ok();
    writeln!(
        out,
        "  bitrate: {}",
        format_opt(report.avg_max_bitrate_kbps, " kbps")
    )
    .ok();
    writeln!(
        out,
        "  packets/s: {}",
        format_opt(report.avg_max_packet_rate, "")
    )
    .ok();
    writeln!(out, "elapsed: {}", format_secs(result.elapsed)).ok();

    out
}

fn render_client(out: &mut String, client: &ClientReport) {
    let run = &client.run;
    let rss = run
        .peak_rss_bytes
        .map(format_bytes)
        .unwrap_or_else(|| "n/a".to_string());

    match &client.metrics {
        Some(m) => {
            writeln!(
                out,
                "[client-{}] ok rtp={} bitrate={:.2} kbps pps={} elapsed={} rss={}",
                run.client_id,
                format_opt(m.first_rtp_latency_ms, "ms"),
                m.max_bitrate_kbps,
                m.max_packet_rate,
                format_secs(run.elapsed),
                rss
            )
            .ok();
        }
        None => {
            writeln!(
                out,
                "[client-{}] failed: {} elapsed={} lines={}",
                run.client_id,
                run.outcome,
                format_secs(run.elapsed),
                run.output.len()
            )
            .ok();
        }
    }
}
