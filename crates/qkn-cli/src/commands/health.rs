//! Health command implementation.

use crate::error::Result;
use crate::output::Formatter;
use qkn_sdk::QknClient;

/// Execute the health command.
pub async fn execute_health(client: &QknClient, formatter: &Formatter) -> Result<()> {
    let status = client.health().await?;
    println!(
        "{}",
        formatter.format_status(client.service_url().as_str(), &status)?
    );
    Ok(())
}
