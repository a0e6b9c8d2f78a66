//! Interactive view mode.
//!
//! One task owns the [`ClientView`] and `select!`s over terminal input, the
//! push subscription and the results of spawned network calls. The line
//! editor runs on a blocking thread and waits for an acknowledgement after
//! every line, so command output is printed before the next prompt.

use crate::error::{CliError, Result};
use crate::output::{Formatter, TimeStyle};
use crate::view::ClientView;
use qkn_domain::{Method, Problem, SearchResults};
use qkn_sdk::{PushEvent, PushSubscription, QknClient, SdkError};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use std::sync::mpsc as std_mpsc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

const PROMPT: &str = "qkn> ";

/// Messages delivered to the view task.
#[derive(Debug)]
enum ViewMessage {
    Line(String),
    Interrupted,
    InputClosed,
    InputFailed(String),
    History(std::result::Result<Vec<Problem>, SdkError>),
    Solved(std::result::Result<Problem, SdkError>),
    Searched(std::result::Result<SearchResults, SdkError>),
}

/// Commands understood by the view prompt.
#[derive(Debug, Clone, PartialEq)]
enum ViewCommand {
    Ask(String),
    Submit,
    Method(Option<Method>),
    Live,
    History,
    Reload,
    Search(String),
    Status,
    Dismiss,
    Help,
    Exit,
}

/// Line-editor settings.
pub struct InputSettings {
    /// Where entered lines are persisted between sessions
    pub history_path: Option<PathBuf>,
    /// Maximum number of remembered lines
    pub history_size: usize,
}

/// Run the interactive view until the user exits.
pub async fn run_view(client: QknClient, input: InputSettings, formatter: &Formatter) -> Result<()> {
    println!(
        "{}",
        formatter.info(&format!(
            "Quantum Knowledge Network at {} - type a question, /help for commands",
            client.service_url()
        ))
    );
    println!();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let (ack_tx, ack_rx) = std_mpsc::channel();
    let input_task = {
        let tx = tx.clone();
        tokio::task::spawn_blocking(move || read_lines(input, tx, ack_rx))
    };

    let mut view = ClientView::new();
    spawn_history(&client, &tx);
    let mut live = Some(client.subscribe()?);

    loop {
        tokio::select! {
            Some(message) = rx.recv() => {
                let line_done = matches!(message, ViewMessage::Line(_) | ViewMessage::Interrupted);
                let keep_going = match message {
                    ViewMessage::Line(line) => handle_line(&line, &mut view, &client, &tx, formatter),
                    ViewMessage::Interrupted => {
                        println!("{}", formatter.info("Use /exit to quit"));
                        true
                    }
                    ViewMessage::InputClosed => false,
                    ViewMessage::InputFailed(reason) => {
                        eprintln!("{}", formatter.error(&reason));
                        false
                    }
                    ViewMessage::History(outcome) => {
                        apply_history(&mut view, outcome, formatter);
                        true
                    }
                    ViewMessage::Solved(outcome) => {
                        finish_submit(&mut view, outcome, formatter);
                        true
                    }
                    ViewMessage::Searched(outcome) => {
                        print_search(outcome, formatter);
                        true
                    }
                };

                if line_done {
                    let _ = ack_tx.send(keep_going);
                }
                if !keep_going {
                    break;
                }
            }
            event = next_push(&mut live) => match event {
                Some(event) => apply_push(&mut view, event, formatter),
                None => {
                    debug!("Push subscription finished");
                    live = None;
                }
            },
        }
    }

    drop(ack_tx);
    if let Err(e) = input_task.await {
        warn!(error = %e, "Line editor thread ended abnormally");
    }
    if let Some(live) = live {
        live.close().await;
    }

    println!("{}", formatter.info("Goodbye!"));
    Ok(())
}

/// Next push event, or pending forever once the subscription is gone.
async fn next_push(live: &mut Option<PushSubscription>) -> Option<PushEvent> {
    match live.as_mut() {
        Some(subscription) => subscription.next_event().await,
        None => std::future::pending().await,
    }
}

/// Blocking line-editor loop.
fn read_lines(
    settings: InputSettings,
    tx: mpsc::UnboundedSender<ViewMessage>,
    ack: std_mpsc::Receiver<bool>,
) {
    let mut editor = match new_editor(settings.history_size) {
        Ok(editor) => editor,
        Err(e) => {
            let _ = tx.send(ViewMessage::InputFailed(format!("Failed to initialize editor: {}", e)));
            return;
        }
    };

    if let Some(path) = &settings.history_path {
        let _ = editor.load_history(path);
    }

    loop {
        let message = match editor.readline(PROMPT) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    editor.add_history_entry(line.as_str()).ok();
                }
                ViewMessage::Line(line)
            }
            Err(ReadlineError::Interrupted) => ViewMessage::Interrupted,
            Err(ReadlineError::Eof) => {
                let _ = tx.send(ViewMessage::InputClosed);
                break;
            }
            Err(e) => {
                let _ = tx.send(ViewMessage::InputFailed(format!("Input error: {}", e)));
                break;
            }
        };

        if tx.send(message).is_err() {
            break;
        }
        match ack.recv() {
            Ok(true) => {}
            _ => break,
        }
    }

    if let Some(path) = &settings.history_path {
        editor.save_history(path).ok();
    }
}

fn new_editor(history_size: usize) -> rustyline::Result<DefaultEditor> {
    let config = rustyline::Config::builder()
        .max_history_size(history_size)?
        .auto_add_history(false)
        .build();
    DefaultEditor::with_config(config)
}

/// Apply one input line; returns `false` when the user asked to leave.
fn handle_line(
    line: &str,
    view: &mut ClientView,
    client: &QknClient,
    tx: &mpsc::UnboundedSender<ViewMessage>,
    formatter: &Formatter,
) -> bool {
    let line = line.trim();
    if line.is_empty() {
        return true;
    }

    let command = match parse_view_command(line) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", formatter.error(&e.to_string()));
            return true;
        }
    };

    match command {
        ViewCommand::Exit => return false,
        ViewCommand::Help => print_help(formatter),
        // The pending question belongs to the in-flight submit until it lands.
        ViewCommand::Ask(_) if view.is_loading() => {
            eprintln!("{}", formatter.warning(&CliError::Busy.to_string()));
        }
        ViewCommand::Ask(question) => {
            view.set_question(question);
            submit(view, client, tx, formatter);
        }
        ViewCommand::Submit => submit(view, client, tx, formatter),
        ViewCommand::Method(None) => {
            println!("{}", formatter.info(&format!("Method: {}", view.method())));
        }
        ViewCommand::Method(Some(method)) => {
            view.set_method(method);
            println!("{}", formatter.success(&format!("Method set to {}", method)));
        }
        ViewCommand::Live => print_result(formatter.format_live(view.live()), formatter),
        ViewCommand::History => print_result(formatter.format_history(view.history()), formatter),
        ViewCommand::Reload => {
            spawn_history(client, tx);
            println!("{}", formatter.info("Reloading history..."));
        }
        ViewCommand::Search(query) => {
            let client = client.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let outcome = client.search(&query).await;
                let _ = tx.send(ViewMessage::Searched(outcome));
            });
        }
        ViewCommand::Status => print_status(view, client, formatter),
        ViewCommand::Dismiss => view.dismiss_error(),
    }
    true
}

fn submit(
    view: &mut ClientView,
    client: &QknClient,
    tx: &mpsc::UnboundedSender<ViewMessage>,
    formatter: &Formatter,
) {
    let request = match view.begin_submit() {
        Ok(request) => request,
        Err(e) => {
            eprintln!("{}", formatter.warning(&e.to_string()));
            return;
        }
    };

    println!("{}", formatter.info(&format!("Solving with {}...", request.method)));
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let outcome = client.solve(&request).await;
        let _ = tx.send(ViewMessage::Solved(outcome));
    });
}

fn spawn_history(client: &QknClient, tx: &mpsc::UnboundedSender<ViewMessage>) {
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let outcome = client.history().await;
        let _ = tx.send(ViewMessage::History(outcome));
    });
}

fn finish_submit(
    view: &mut ClientView,
    outcome: std::result::Result<Problem, SdkError>,
    formatter: &Formatter,
) {
    let solved = outcome.is_ok();
    view.finish_submit(outcome);

    if solved {
        if let Some(problem) = view.live().front() {
            print_result(formatter.format_problem(problem, TimeStyle::TimeOfDay), formatter);
        }
    } else if let Some(message) = view.error() {
        eprintln!("{}", formatter.banner(message));
    }
}

fn apply_history(
    view: &mut ClientView,
    outcome: std::result::Result<Vec<Problem>, SdkError>,
    formatter: &Formatter,
) {
    if let Err(e) = &outcome {
        warn!(error = %e, "Failed to load history");
    }
    let loaded = outcome.is_ok();
    view.apply_history(outcome);

    if loaded {
        println!(
            "{}",
            formatter.info(&format!("{} history record(s) loaded. /history to show them.", view.history().len()))
        );
    } else if let Some(message) = view.error() {
        eprintln!("{}", formatter.banner(message));
    }
}

fn apply_push(view: &mut ClientView, event: PushEvent, formatter: &Formatter) {
    match &event {
        PushEvent::ConnectError(reason) | PushEvent::Disconnected(reason) => {
            warn!(reason = %reason, "Live updates unavailable");
        }
        PushEvent::Connected => debug!("Live updates connected"),
        PushEvent::NewProblem(_) => {}
    }
    let failed = matches!(event, PushEvent::ConnectError(_) | PushEvent::Disconnected(_));

    if let Some(problem) = view.apply_push(event) {
        print_result(formatter.format_problem(problem, TimeStyle::TimeOfDay), formatter);
    } else if failed {
        if let Some(message) = view.error() {
            eprintln!("{}", formatter.banner(message));
        }
    }
}

fn print_search(outcome: std::result::Result<SearchResults, SdkError>, formatter: &Formatter) {
    match outcome {
        Ok(results) => print_result(formatter.format_search(&results), formatter),
        Err(e) => eprintln!("{}", formatter.error(&format!("Search failed: {}", e))),
    }
}

fn print_result(output: Result<String>, formatter: &Formatter) {
    match output {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("{}", formatter.error(&e.to_string())),
    }
}

fn print_status(view: &ClientView, client: &QknClient, formatter: &Formatter) {
    let live = if view.is_live_connected() {
        "connected"
    } else {
        "not connected"
    };
    println!("{}", formatter.info("View status:"));
    println!("  Service:   {}", client.service_url());
    println!("  Method:    {}", view.method());
    println!("  Live:      {} ({} record(s))", live, view.live().len());
    println!("  History:   {} record(s)", view.history().len());
    println!("  Solving:   {}", if view.is_loading() { "yes" } else { "no" });
    if !view.question().is_empty() {
        println!("  Question:  {}", view.question());
    }
    if let Some(error) = view.error() {
        println!("  {}", formatter.banner(error));
    }
}

/// Parse one non-empty input line.
fn parse_view_command(line: &str) -> Result<ViewCommand> {
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(ViewCommand::Ask(line.to_string()));
    };

    let mut parts = rest.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).unwrap_or_default();

    match name {
        "exit" | "quit" | "q" => Ok(ViewCommand::Exit),
        "help" | "?" => Ok(ViewCommand::Help),
        "submit" => Ok(ViewCommand::Submit),
        "method" | "m" if arg.is_empty() => Ok(ViewCommand::Method(None)),
        "method" | "m" => Ok(ViewCommand::Method(Some(arg.parse::<Method>()?))),
        "live" => Ok(ViewCommand::Live),
        "history" => Ok(ViewCommand::History),
        "reload" => Ok(ViewCommand::Reload),
        "search" if arg.is_empty() => Err(CliError::InvalidInput("Usage: /search <query>".to_string())),
        "search" => Ok(ViewCommand::Search(arg.to_string())),
        "status" => Ok(ViewCommand::Status),
        "dismiss" => Ok(ViewCommand::Dismiss),
        _ => Err(CliError::InvalidInput(format!(
            "Unknown command: /{}. Type /help for available commands.",
            name
        ))),
    }
}

fn print_help(formatter: &Formatter) {
    println!("{}", formatter.info("Available commands:"));
    println!();
    println!("  <question>              - Solve a question with the selected method");
    println!("  /submit                 - Resubmit the pending question");
    println!("  /method [quantum|ai]    - Show or select the solving method");
    println!("  /live                   - Show live results, newest first");
    println!("  /history                - Show the loaded history");
    println!("  /reload                 - Fetch the history again");
    println!("  /search <query>         - Find similar stored questions");
    println!("  /status                 - Show view state");
    println!("  /dismiss                - Clear the error banner");
    println!("  /help, /?               - Show this help");
    println!("  /exit, /quit, /q        - Leave the view");
    println!();
}
