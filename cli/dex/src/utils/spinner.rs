use std::future::Future;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::watch;

/// Drive `work` to completion,
/// showing a spinner on stderr whenever the observed state reports loading.
///
/// The spinner is hidden if stderr is not a terminal.
pub async fn spin_while_loading<S, T>(
    message: &str,
    mut state: watch::Receiver<S>,
    is_loading: impl Fn(&S) -> bool,
    work: impl Future<Output = T>,
) -> T {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());

    let watch_state = async {
        loop {
            let loading = is_loading(&state.borrow_and_update());
            if loading {
                spinner.enable_steady_tick(Duration::from_millis(100));
            } else {
                spinner.disable_steady_tick();
            }
            if state.changed().await.is_err() {
                // the orchestrator is gone, keep waiting for the work
                std::future::pending::<()>().await;
            }
        }
    };

    let output = tokio::select! {
        output = work => output,
        _ = watch_state => unreachable!("state watcher never completes"),
    };
    spinner.finish_and_clear();
    output
}
