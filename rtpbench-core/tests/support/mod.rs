#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;

/// A throwaway client executable backed by a `/bin/sh` script.
pub struct FakeClient {
    dir: TempDir,
    pub path: PathBuf,
}

impl FakeClient {
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

pub fn fake_client(body: &str) -> std::io::Result<FakeClient> {
    let dir = tempfile::tempdir()?;
    let path = write_script(dir.path(), "client", body)?;
    Ok(FakeClient { dir, path })
}

pub fn write_script(dir: &Path, name: &str, body: &str) -> std::io::Result<PathBuf> {
    use std::os::unix::fs::PermissionsExt as _;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n"))?;
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    Ok(path)
}

/// Script that reports metrics scaled by its launch order.
///
/// Each invocation counts the markers left by earlier ones, so with a
/// non-zero stagger the n-th client (0-based) reports `(n + 1) * 100` kbps.
pub fn ordered_client(exit_code_for: &[(u32, i32)]) -> std::io::Result<FakeClient> {
    let dir = tempfile::tempdir()?;
    let seen = dir.path().join("seen");
    std::fs::create_dir_all(&seen)?;

    let mut exits = String::new();
    for (n, code) in exit_code_for {
        exits.push_str(&format!("if [ \"$n\" -eq {n} ]; then exit {code}; fi\n"));
    }

    let body = format!(
        r#"seen="{seen}"
n=$(ls "$seen" | wc -l)
touch "$seen/$$"
kbps=$(( (n + 1) * 100 ))
echo "Connected"
echo "📦 Time to First RTP: $(( 10 + n )).5ms"
echo "📈 Packets: $(( (n + 1) * 10 ))/s | Bitrate: $kbps.00 kbps"
echo "args: $*" 1>&2
{exits}exit 0"#,
        seen = seen.display(),
    );

    let path = write_script(dir.path(), "client", &body)?;
    Ok(FakeClient { dir, path })
}

/// True when `pid` no longer exists or is a zombie awaiting its reaper.
pub fn process_is_gone(pid: u32) -> bool {
    use sysinfo::{Pid, ProcessStatus, ProcessesToUpdate, System};

    let pid = Pid::from_u32(pid);
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    sys.process(pid)
        .is_none_or(|p| p.status() == ProcessStatus::Zombie)
}

/// Polls until `pid` is gone; SIGKILL delivery to a group is asynchronous.
pub async fn wait_until_gone(pid: u32, within: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    loop {
        if process_is_gone(pid) {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// Reads the pid a fake client wrote with `echo $! > <name>`.
pub fn read_pid(dir: &Path, name: &str) -> anyhow::Result<u32> {
    use anyhow::Context as _;

    let text = std::fs::read_to_string(dir.join(name)).with_context(|| format!("read {name}"))?;
    text.trim()
        .parse()
        .with_context(|| format!("parse pid from {name}: {text:?}"))
}
