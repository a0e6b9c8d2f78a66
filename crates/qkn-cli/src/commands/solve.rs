//! Solve command implementation.

use crate::cli::SolveArgs;
use crate::error::{CliError, Result};
use crate::output::{Formatter, TimeStyle};
use crate::view::ClientView;
use qkn_sdk::QknClient;

/// Execute the solve command.
///
/// Goes through a [`ClientView`] so a one-shot solve validates and reports
/// failures exactly like the interactive view does.
pub async fn execute_solve(args: SolveArgs, client: &QknClient, formatter: &Formatter) -> Result<()> {
    let mut view = ClientView::new();
    view.set_question(args.question.join(" "));
    view.set_method(args.method.into());

    let request = view.begin_submit()?;
    let outcome = client.solve(&request).await;
    view.finish_submit(outcome);

    if let Some(message) = view.error() {
        return Err(CliError::RequestFailed(message.to_string()));
    }

    let problem = view
        .live()
        .front()
        .ok_or_else(|| CliError::RequestFailed("Service returned no record".to_string()))?;
    println!("{}", formatter.format_problem(problem, TimeStyle::DateTime)?);
    Ok(())
}
