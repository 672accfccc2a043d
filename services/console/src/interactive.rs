use crate::infra::{parse_assignment, parse_coordinate};
use crate::render::{render_enrichment, render_result, render_step, render_toast};
use price_wizard::error::AppError;
use price_wizard::wizard::{AdvanceOutcome, WizardSession};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

const HELP: &str = "commands: name=value | pick <lat> <lon> | next | back | status | help | quit";

enum Input {
    Set(String, String),
    Pick(String),
    Next,
    Back,
    Status,
    Help,
    Quit,
}

fn parse_input(line: &str) -> Option<Input> {
    let line = line.trim();
    match line {
        "" => None,
        "next" | "n" => Some(Input::Next),
        "back" | "b" => Some(Input::Back),
        "status" | "s" => Some(Input::Status),
        "help" | "?" => Some(Input::Help),
        "quit" | "q" | "exit" => Some(Input::Quit),
        _ => {
            if let Some(rest) = line.strip_prefix("pick ") {
                return Some(Input::Pick(rest.to_string()));
            }
            match parse_assignment(line) {
                Ok((name, value)) => Some(Input::Set(name, value)),
                Err(_) => Some(Input::Help),
            }
        }
    }
}

/// Line-driven wizard over stdin. Location lookups run as spawned tasks so
/// the prompt stays responsive while they resolve.
pub(crate) async fn run_interactive(session: WizardSession) -> Result<(), AppError> {
    let registry = session.registry();
    println!("{HELP}");
    render_step(&session.snapshot(), &registry);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(input) = parse_input(&line) else {
            continue;
        };

        match input {
            Input::Set(name, value) => match session.set_field(&name, &value) {
                Ok(snapshot) => debug!(field = %name, filled = snapshot.filled.is_filled(&name), "set"),
                Err(err) => println!("! {err}"),
            },
            Input::Pick(raw) => match parse_coordinate(&raw) {
                Ok(point) => match session.pick_location(point) {
                    Ok(lookup) => {
                        println!("{}", session.messages().locating());
                        tokio::spawn(async move {
                            let outcome = lookup.await;
                            render_enrichment(&outcome);
                        });
                    }
                    Err(err) => println!("! {err}"),
                },
                Err(err) => println!("! {err}"),
            },
            Input::Next => match session.request_advance().await {
                AdvanceOutcome::Advanced { .. } => render_step(&session.snapshot(), &registry),
                AdvanceOutcome::Blocked { toast, .. } => render_toast(&toast),
                AdvanceOutcome::SubmissionInFlight => println!("A prediction is already running."),
                AdvanceOutcome::Submitted(response) => {
                    render_result(&response, &registry);
                    return Ok(());
                }
                AdvanceOutcome::SubmissionFailed { toast, .. } => render_toast(&toast),
            },
            Input::Back => {
                session.request_retreat();
                render_step(&session.snapshot(), &registry);
            }
            Input::Status => render_step(&session.snapshot(), &registry),
            Input::Help => println!("{HELP}"),
            Input::Quit => break,
        }
    }

    Ok(())
}
