use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use rtpbench_core::ClientEvent;

pub(crate) struct HumanProgress {
    pb: ProgressBar,
    running: AtomicU64,
    failed: AtomicU64,
}

impl HumanProgress {
    pub(crate) fn new() -> Self {
        let pb = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr_with_hz(5));
        pb.set_style(bar_style());
        pb.set_prefix("clients");

        Self {
            pb,
            running: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub(crate) fn start(&self, total: u64) {
        self.pb.set_length(total);
        self.pb.enable_steady_tick(Duration::from_millis(200));
        self.refresh();
    }

    pub(crate) fn on_event(&self, event: &ClientEvent) {
        match event {
            ClientEvent::Launched { .. } => {
                self.running.fetch_add(1, Ordering::Relaxed);
            }
            ClientEvent::Finished { outcome, .. } => {
                self.running.fetch_sub(1, Ordering::Relaxed);
                if !outcome.is_success() {
                    self.failed.fetch_add(1, Ordering::Relaxed);
                }
                self.pb.inc(1);
            }
        }
        self.refresh();
    }

    pub(crate) fn finish(&self) {
        self.pb.finish_and_clear();
    }

    fn refresh(&self) {
        self.pb.set_message(format!(
            "running={} failed={}",
            self.running.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed)
        ));
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{prefix} {spinner} [ {bar:20.cyan/blue} ] {pos}/{len} elapsed={elapsed} {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("█░")
}
