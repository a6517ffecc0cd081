use indicatif::{ProgressBar, ProgressStyle};
use quickmodel::engine::progress::{Progress, ProgressCallback};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

/// Drives one spinner per workflow phase. A finished phase stays on screen as a check line.
#[derive(Clone)]
pub struct CliProgressHandler {
    pb: Arc<Mutex<ProgressBar>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_draw_target(indicatif::ProgressDrawTarget::stderr())
    }

    fn with_draw_target(target: indicatif::ProgressDrawTarget) -> Self {
        let pb = ProgressBar::new_spinner()
            .with_style(Self::spinner_style())
            .with_message("Initializing...");
        pb.set_draw_target(target);
        pb.finish_and_clear();

        Self {
            pb: Arc::new(Mutex::new(pb)),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let pb_clone = self.pb.clone();

        Box::new(move |progress: Progress| {
            let Ok(mut pb_guard) = pb_clone.lock() else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };

            match progress {
                Progress::PhaseStart { name } => {
                    *pb_guard = Self::fresh_spinner(&pb_guard);
                    pb_guard.set_message(name.to_string());
                    pb_guard.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                }
                Progress::PhaseFinish => {
                    pb_guard.disable_steady_tick();
                    let done = format!("✓ {}", pb_guard.message());
                    pb_guard.finish_with_message(done);
                }
                Progress::Message(msg) => {
                    if pb_guard.is_finished() {
                        pb_guard.suspend(|| eprintln!("  {}", msg));
                    } else {
                        pb_guard.println(format!("  {}", msg));
                    }
                }
            }
        })
    }

    /// Stops the current spinner in place, e.g. when the workflow fails mid-phase.
    pub fn abandon(&self) {
        if let Ok(pb) = self.pb.lock() {
            if !pb.is_finished() {
                pb.disable_steady_tick();
                pb.abandon();
            }
        }
    }

    fn fresh_spinner(previous: &ProgressBar) -> ProgressBar {
        let pb = ProgressBar::new_spinner().with_style(Self::spinner_style());
        if previous.is_hidden() {
            pb.set_draw_target(indicatif::ProgressDrawTarget::hidden());
        } else {
            pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        }
        pb
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
