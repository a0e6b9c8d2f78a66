//! History command implementation.

use crate::cli::HistoryArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::view::ClientView;
use qkn_sdk::QknClient;

/// Execute the history command.
pub async fn execute_history(args: HistoryArgs, client: &QknClient, formatter: &Formatter) -> Result<()> {
    let mut view = ClientView::new();
    view.apply_history(client.history().await);

    if let Some(message) = view.error() {
        return Err(CliError::RequestFailed(message.to_string()));
    }

    let records = view.history();
    let shown = match args.limit {
        Some(limit) => &records[..limit.min(records.len())],
        None => records,
    };
    println!("{}", formatter.format_history(shown)?);
    Ok(())
}
