//! examforge CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "examforge", version, about = "Seeded payroll exam practice")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config and the bundled content packs
    Init,

    /// Validate content pack TOML files
    Validate {
        /// Path to a pack file or directory
        #[arg(long)]
        packs: PathBuf,
    },

    /// List the loaded content packs
    Packs,

    /// Build an attempt and print it without saving anything
    Generate {
        /// Mode: timed, study, drills, domain, weakness
        #[arg(long, default_value = "timed")]
        mode: String,

        /// Seed; a fresh one is derived when omitted
        #[arg(long)]
        seed: Option<String>,

        /// Domain ids for domain mode (comma-separated, e.g. "2,3")
        #[arg(long)]
        domains: Option<String>,

        /// Override the question count for the mode
        #[arg(long)]
        count: Option<usize>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Start a new attempt and make it current
    Start {
        /// Mode: timed, study, drills, domain, weakness
        #[arg(long)]
        mode: Option<String>,

        /// Seed; a fresh one is derived when omitted
        #[arg(long)]
        seed: Option<String>,

        /// Domain ids for domain mode (comma-separated, e.g. "2,3")
        #[arg(long)]
        domains: Option<String>,
    },

    /// Show the current attempt
    Show,

    /// Record a response for a question of the current attempt
    Answer {
        /// Question id
        question: String,

        /// Response as JSON (e.g. 2, [0,2], 950.25, "W-4"); bare text is taken as a string
        response: String,
    },

    /// Toggle the review flag on a question of the current attempt
    Flag {
        /// Question id
        question: String,
    },

    /// Reveal the worked steps for a question of the current attempt
    Hint {
        /// Question id
        question: String,
    },

    /// Score and close the current attempt
    Submit {
        /// Also write the full report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Start a retake from the last submitted attempt
    Retake {
        /// Which questions: incorrect, flagged, drill
        #[arg(default_value = "incorrect")]
        kind: String,
    },

    /// Score a saved attempt snapshot against a responses file
    Score {
        /// Attempt snapshot JSON
        #[arg(long)]
        attempt: PathBuf,

        /// JSON object mapping question id to response
        #[arg(long)]
        responses: PathBuf,

        /// Award partial credit
        #[arg(long)]
        partial_credit: bool,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show recent attempt history
    History,

    /// Show the current weakness profile
    Weakness,

    /// Forget saved settings, the current attempt, history and the profile
    Reset,
}

fn main() {
    let directive = match "examforge=info".parse::<tracing_subscriber::filter::Directive>() {
        Ok(directive) => directive,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate { packs } => commands::validate::execute(packs),
        Commands::Packs => commands::packs::execute(config),
        Commands::Generate {
            mode,
            seed,
            domains,
            count,
            format,
        } => commands::generate::execute(config, mode, seed, domains, count, format),
        Commands::Start {
            mode,
            seed,
            domains,
        } => commands::session::start(config, mode, seed, domains),
        Commands::Show => commands::session::show(config),
        Commands::Answer { question, response } => {
            commands::session::answer(config, question, response)
        }
        Commands::Flag { question } => commands::session::flag(config, question),
        Commands::Hint { question } => commands::session::hint(config, question),
        Commands::Submit { report } => commands::session::submit(config, report),
        Commands::Retake { kind } => commands::session::retake(config, kind),
        Commands::Score {
            attempt,
            responses,
            partial_credit,
            format,
        } => commands::score::execute(config, attempt, responses, partial_credit, format),
        Commands::History => commands::history::history(config),
        Commands::Weakness => commands::history::weakness(config),
        Commands::Reset => commands::history::reset(config),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
