use crate::protocol::message::ProgressPayload;

/// Unified progress in percent, `0..=100`.
///
/// `clamp(max(iteration / max_iterations, accuracy / target_accuracy), 0, 1) * 100`. Either
/// ratio may exceed 1 on its own; a zero or non-finite denominator contributes nothing.
pub fn progress_percent(
    iteration: u64,
    max_iterations: u64,
    accuracy: f32,
    target_accuracy: f32,
) -> f64 {
    let iter_ratio = if max_iterations == 0 {
        0.0
    } else {
        iteration as f64 / max_iterations as f64
    };
    let acc_ratio = if target_accuracy > 0.0 && target_accuracy.is_finite() {
        f64::from(accuracy) / f64::from(target_accuracy)
    } else {
        0.0
    };
    // `f64::max` drops a NaN operand.
    iter_ratio.max(acc_ratio).clamp(0.0, 1.0) * 100.0
}

/// Status-line texts and controls shown to the user.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct StatusDisplay {
    /// Headline, e.g. `Running...` or `Error: <message>`.
    pub status: String,
    /// `Iteration: N`.
    pub iteration: String,
    /// `Accuracy: X.XX%`.
    pub accuracy: String,
    /// Unified progress in percent.
    pub progress: f64,
    /// Whether a start request would be accepted.
    pub start_enabled: bool,
    /// Whether a stop request would be accepted.
    pub stop_enabled: bool,
}

impl StatusDisplay {
    /// Nothing loaded yet.
    pub fn idle() -> Self {
        Self {
            status: "Load an image".to_owned(),
            iteration: iteration_text(0),
            accuracy: accuracy_text(0.0),
            progress: 0.0,
            start_enabled: false,
            stop_enabled: false,
        }
    }

    /// Image loaded, waiting for start.
    pub fn ready() -> Self {
        Self {
            status: "Ready - Click Start".to_owned(),
            start_enabled: true,
            ..Self::idle()
        }
    }

    pub(crate) fn running(&mut self) {
        self.status = "Running...".to_owned();
        self.start_enabled = false;
        self.stop_enabled = true;
    }

    pub(crate) fn record(&mut self, p: &ProgressPayload) {
        self.iteration = iteration_text(p.iteration);
        self.accuracy = accuracy_text(p.accuracy);
        self.progress =
            progress_percent(p.iteration, p.max_iterations, p.accuracy, p.target_accuracy);
    }

    /// Back to ready controls after a session ends, keeping the last figures.
    pub(crate) fn settle(&mut self, status: String) {
        self.status = status;
        self.start_enabled = true;
        self.stop_enabled = false;
    }

    /// Back to ready controls after a failure, clearing the progress indicator.
    pub(crate) fn settle_failed(&mut self, status: String) {
        self.settle(status);
        self.progress = 0.0;
    }
}

fn iteration_text(iteration: u64) -> String {
    format!("Iteration: {iteration}")
}

fn accuracy_text(accuracy: f32) -> String {
    format!("Accuracy: {:.2}%", f64::from(accuracy) * 100.0)
}

#[cfg(test)]
#[path = "../../tests/unit/lifecycle/progress.rs"]
mod tests;
