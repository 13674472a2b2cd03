#![cfg(unix)]

mod support;

use anyhow::Context as _;
use serde_json::Value;
use support::{describe, json_lines, rtpbench, status_code, write_client};

const CLIENT: &str = r#"echo "Connected with $*"
echo "2025/01/01 12:00:00 📦 Time to First RTP: 112.43ms"
echo "2025/01/01 12:00:01 📈 Packets: 42/s | Bitrate: 910.25 kbps" 1>&2
echo "2025/01/01 12:00:02 📈 Packets: 40/s | Bitrate: 950.50 kbps" 1>&2
exit 0"#;

#[tokio::test]
async fn json_run_reports_clients_and_summary() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let client = write_client(tmp.path(), CLIENT).context("write client")?;
    let log_dir = tmp.path().join("logs");

    let out = rtpbench(vec![
        "run".to_string(),
        "--client".to_string(),
        client.display().to_string(),
        "--clients".to_string(),
        "3".to_string(),
        "--duration".to_string(),
        "1s".to_string(),
        "--stagger".to_string(),
        "20ms".to_string(),
        "--log-dir".to_string(),
        log_dir.display().to_string(),
        "--output".to_string(),
        "json".to_string(),
        "--".to_string(),
        "--room=bench".to_string(),
    ])
    .await?;

    anyhow::ensure!(status_code(out.status) == 0, "{}", describe(&out));

    let lines = json_lines(&out)?;
    let clients = lines
        .iter()
        .filter(|v| v.get("kind").and_then(Value::as_str) == Some("client"))
        .collect::<Vec<_>>();
    assert_eq!(clients.len(), 3);
    for (i, c) in clients.iter().enumerate() {
        assert_eq!(c.get("client_id").and_then(Value::as_u64), Some(i as u64));
        assert_eq!(c.get("status").and_then(Value::as_str), Some("success"));
        assert_eq!(c.get("max_bitrate_kbps").and_then(Value::as_f64), Some(950.5));
        assert_eq!(c.get("max_packet_rate").and_then(Value::as_u64), Some(42));
    }

    let summary = lines
        .iter()
        .find(|v| v.get("kind").and_then(Value::as_str) == Some("summary"))
        .context("summary line")?;
    assert_eq!(summary.get("successful_count").and_then(Value::as_u64), Some(3));
    assert_eq!(summary.get("total_count").and_then(Value::as_u64), Some(3));
    let avg_rtp = summary
        .get("avg_first_rtp_ms")
        .and_then(Value::as_f64)
        .context("avg_first_rtp_ms")?;
    assert!((avg_rtp - 112.43).abs() < 1e-9, "avg_first_rtp_ms={avg_rtp}");

    let log = std::fs::read_to_string(log_dir.join("client-1.log")).context("read client log")?;
    assert!(log.contains("Connected with --duration=1 --room=bench"));
    assert!(log.contains("Bitrate: 950.50 kbps"));
    Ok(())
}

#[tokio::test]
async fn captured_logs_parse_back() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let client = write_client(tmp.path(), CLIENT).context("write client")?;
    let log_dir = tmp.path().join("logs");

    let out = rtpbench(vec![
        "run".to_string(),
        "--client".to_string(),
        client.display().to_string(),
        "--clients".to_string(),
        "2".to_string(),
        "--duration".to_string(),
        "1s".to_string(),
        "--stagger".to_string(),
        "10ms".to_string(),
        "--log-dir".to_string(),
        log_dir.display().to_string(),
    ])
    .await?;
    anyhow::ensure!(status_code(out.status) == 0, "{}", describe(&out));

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("successful clients: 2 / 2"), "{stdout}");
    assert!(stdout.contains("bitrate: 950.50 kbps"), "{stdout}");

    let out = rtpbench(vec![
        "parse".to_string(),
        "--output".to_string(),
        "json".to_string(),
        log_dir.join("client-1.log").display().to_string(),
    ])
    .await?;
    anyhow::ensure!(status_code(out.status) == 0, "{}", describe(&out));

    let lines = json_lines(&out)?;
    let client = lines
        .iter()
        .find(|v| v.get("kind").and_then(Value::as_str) == Some("client"))
        .context("client line")?;
    assert_eq!(client.get("client_id").and_then(Value::as_u64), Some(1));
    assert_eq!(
        client.get("first_rtp_latency_ms").and_then(Value::as_f64),
        Some(112.43)
    );
    Ok(())
}

#[tokio::test]
async fn no_logs_skips_capture_files() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let client = write_client(tmp.path(), CLIENT).context("write client")?;
    let log_dir = tmp.path().join("logs");

    let out = rtpbench(vec![
        "run".to_string(),
        "--client".to_string(),
        client.display().to_string(),
        "--clients".to_string(),
        "1".to_string(),
        "--duration".to_string(),
        "1s".to_string(),
        "--log-dir".to_string(),
        log_dir.display().to_string(),
        "--no-logs".to_string(),
    ])
    .await?;

    anyhow::ensure!(status_code(out.status) == 0, "{}", describe(&out));
    anyhow::ensure!(!log_dir.exists(), "log dir should not be created");
    Ok(())
}

#[tokio::test]
async fn unwritable_log_dir_still_prints_the_report() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let client = write_client(tmp.path(), CLIENT).context("write client")?;
    let not_a_dir = tmp.path().join("not-a-dir");
    std::fs::write(&not_a_dir, "")?;

    let out = rtpbench(vec![
        "run".to_string(),
        "--client".to_string(),
        client.display().to_string(),
        "--clients".to_string(),
        "2".to_string(),
        "--duration".to_string(),
        "1s".to_string(),
        "--stagger".to_string(),
        "10ms".to_string(),
        "--log-dir".to_string(),
        not_a_dir.join("logs").display().to_string(),
        "--output".to_string(),
        "json".to_string(),
    ])
    .await?;

    anyhow::ensure!(status_code(out.status) == 40, "{}", describe(&out));

    let lines = json_lines(&out)?;
    let clients = lines
        .iter()
        .filter(|v| v.get("kind").and_then(Value::as_str) == Some("client"))
        .count();
    assert_eq!(clients, 2, "{}", describe(&out));

    let summary = lines
        .iter()
        .find(|v| v.get("kind").and_then(Value::as_str) == Some("summary"))
        .context("summary line")?;
    assert_eq!(summary.get("successful_count").and_then(Value::as_u64), Some(2));

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("failed to write client logs"), "{stderr}");
    Ok(())
}
