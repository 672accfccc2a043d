use crate::infra::{
    build_session, load_config, parse_assignment, parse_coordinate, parse_schema, parse_theme,
    registry, theme_store,
};
use crate::interactive::run_interactive;
use crate::render::{render_enrichment, render_result, render_schema, render_toast};
use clap::{Args, Parser, Subcommand};
use price_wizard::config::AppConfig;
use price_wizard::error::AppError;
use price_wizard::theme::Theme;
use price_wizard::wizard::{AdvanceOutcome, Coordinate, SchemaVariant};

#[derive(Parser, Debug)]
#[command(
    name = "price-wizard",
    about = "Estimate house prices through a guided, step-by-step wizard",
    version
)]
struct Cli {
    /// Override the configured schema (bandung or king_county)
    #[arg(long, global = true, value_parser = parse_schema)]
    schema: Option<SchemaVariant>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk through the wizard one step at a time (default command)
    Interactive,
    /// Fill every field from flags and submit in one go
    Predict(PredictArgs),
    /// List the steps and fields of the active schema
    Schema,
    /// Inspect or change the light/dark preference
    Theme {
        #[command(subcommand)]
        command: ThemeCommand,
    },
}

#[derive(Args, Debug, Default)]
pub(crate) struct PredictArgs {
    /// Field assignment as name=value; repeat for each field
    #[arg(long = "set", value_parser = parse_assignment)]
    pub(crate) assignments: Vec<(String, String)>,
    /// Location pick as lat,lon; resolved before assignments are applied
    #[arg(long, value_parser = parse_coordinate, allow_hyphen_values = true)]
    pub(crate) pick: Option<Coordinate>,
    /// Print the raw prediction payload as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Subcommand, Debug)]
enum ThemeCommand {
    /// Print the active theme
    Show {
        /// Current system preference
        #[arg(long, value_parser = parse_theme, default_value = "light")]
        system: Theme,
    },
    /// Switch between light and dark and remember the choice
    Toggle {
        /// Current system preference
        #[arg(long, value_parser = parse_theme, default_value = "light")]
        system: Theme,
    },
    /// Report a system preference change
    System {
        #[arg(value_parser = parse_theme)]
        preference: Theme,
    },
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = load_config(cli.schema)?;

    match cli.command.unwrap_or(Command::Interactive) {
        Command::Interactive => run_interactive(build_session(&config)?).await,
        Command::Predict(args) => run_predict(&config, args).await,
        Command::Schema => run_schema(&config),
        Command::Theme { command } => run_theme(&config, command),
    }
}

async fn run_predict(config: &AppConfig, args: PredictArgs) -> Result<(), AppError> {
    let PredictArgs {
        assignments,
        pick,
        json,
    } = args;

    let session = build_session(config)?;
    let registry = session.registry();

    if let Some(point) = pick {
        let outcome = session.pick_location(point)?.await;
        render_enrichment(&outcome);
    }
    for (name, value) in &assignments {
        session.set_field(name, value)?;
    }

    loop {
        match session.request_advance().await {
            AdvanceOutcome::Advanced { .. } => continue,
            AdvanceOutcome::Blocked { toast, .. } | AdvanceOutcome::SubmissionFailed { toast, .. } => {
                render_toast(&toast);
                return Ok(());
            }
            AdvanceOutcome::SubmissionInFlight => {
                println!("A prediction is already running.");
                return Ok(());
            }
            AdvanceOutcome::Submitted(response) => {
                if json {
                    let body = serde_json::to_string_pretty(&response)
                        .unwrap_or_else(|err| format!("{{\"error\": \"{err}\"}}"));
                    println!("{body}");
                } else {
                    render_result(&response, &registry);
                }
                return Ok(());
            }
        }
    }
}

fn run_schema(config: &AppConfig) -> Result<(), AppError> {
    let registry = registry(config)?;
    render_schema(&registry);
    Ok(())
}

fn run_theme(config: &AppConfig, command: ThemeCommand) -> Result<(), AppError> {
    match command {
        ThemeCommand::Show { system } => {
            let store = theme_store(config, system == Theme::Dark)?;
            let source = if store.is_explicit() { "saved" } else { "system" };
            println!("{} ({source})", store.current());
        }
        ThemeCommand::Toggle { system } => {
            let store = theme_store(config, system == Theme::Dark)?;
            println!("{}", store.toggle()?);
        }
        ThemeCommand::System { preference } => {
            let store = theme_store(config, false)?;
            let mut changes = store.subscribe();
            let applied = store.system_changed(preference == Theme::Dark);
            let current = *changes.borrow_and_update();
            if applied {
                println!("{current} (following system)");
            } else {
                println!("{current} (saved choice kept)");
            }
        }
    }
    Ok(())
}
