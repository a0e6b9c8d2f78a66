//! Search command implementation.

use crate::cli::SearchArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use qkn_sdk::QknClient;

/// Execute the search command.
pub async fn execute_search(args: SearchArgs, client: &QknClient, formatter: &Formatter) -> Result<()> {
    let query = args.query.join(" ");
    if query.trim().is_empty() {
        return Err(CliError::InvalidInput("Search query cannot be empty".to_string()));
    }

    let results = client.search(query.trim()).await?;
    println!("{}", formatter.format_search(&results)?);
    Ok(())
}
