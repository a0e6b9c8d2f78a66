//! Watch command implementation.

use crate::cli::WatchArgs;
use crate::error::{CliError, Result};
use crate::output::{Formatter, TimeStyle};
use crate::view::ClientView;
use qkn_sdk::{PushEvent, QknClient};
use tracing::info;

/// Execute the watch command.
///
/// Prints every live record until Ctrl-C, the requested count, or the push
/// channel failing. The subscription is closed on every exit path.
pub async fn execute_watch(args: WatchArgs, client: &QknClient, formatter: &Formatter) -> Result<()> {
    let mut subscription = client.subscribe()?;
    let mut view = ClientView::new();
    let mut received = 0usize;

    let outcome = loop {
        if args.count.is_some_and(|count| received >= count) {
            break Ok(());
        }

        tokio::select! {
            event = subscription.next_event() => {
                let Some(event) = event else {
                    break Ok(());
                };
                if matches!(event, PushEvent::Connected) {
                    eprintln!("{}", formatter.info("Watching live updates, Ctrl-C to stop"));
                }
                if let Some(problem) = view.apply_push(event) {
                    received += 1;
                    match formatter.format_problem(problem, TimeStyle::TimeOfDay) {
                        Ok(text) => println!("{}", text),
                        Err(e) => break Err(e),
                    }
                }
                if let Some(message) = view.error() {
                    break Err(CliError::RequestFailed(message.to_string()));
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, closing live updates");
                break Ok(());
            }
        }
    };

    subscription.close().await;
    outcome
}
