//! Bazaar CLI

use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
};

use bazaar::{
    amounts::Minutes,
    api::{SlotQuery, TimeSlot},
    catalog::VendorId,
    chat::{Conversation, reducer::dedupe_conversations},
    config::Config,
    context::AppContext,
    fixtures::QuoteFixture,
    logging,
};
use clap::{Args, Parser, Subcommand};
use jiff::civil::Date;
use tabled::{builder::Builder, settings::Style};
use tracing::error;

#[derive(Debug, Parser)]
#[command(name = "bazaar", about = "Bazaar marketplace client", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Price a YAML quote fixture and print the summary
    Quote(QuoteArgs),

    /// List a vendor's bookable time slots
    Slots(SlotsArgs),

    /// List chat conversations, most recent first
    Conversations,
}

#[derive(Debug, Args)]
struct QuoteArgs {
    /// Path to the quote fixture
    fixture: PathBuf,
}

#[derive(Debug, Args)]
struct SlotsArgs {
    /// Vendor identifier
    #[arg(long)]
    vendor: u64,

    /// Service date, `YYYY-MM-DD`
    #[arg(long)]
    date: Date,

    /// Total service duration in minutes
    #[arg(long, default_value_t = 60)]
    duration: u32,
}

#[tokio::main]
async fn main() -> ExitCode {
    Config::load_env();

    let cli = Cli::parse();

    if let Err(error) = logging::init(&cli.config.logging) {
        let _written = writeln!(io::stderr(), "{error}");

        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!(%message, "command failed");

            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Commands::Quote(args) => quote(&args),
        Commands::Slots(args) => slots(&cli.config, &args).await,
        Commands::Conversations => conversations(&cli.config).await,
    }
}

fn quote(args: &QuoteArgs) -> Result<(), String> {
    let fixture = QuoteFixture::from_path(&args.fixture)
        .map_err(|error| format!("failed to load {}: {error}", args.fixture.display()))?;

    let summary = fixture
        .summary()
        .map_err(|error| format!("failed to price quote: {error}"))?;

    summary
        .write_to(io::stdout().lock())
        .map_err(|error| format!("failed to print summary: {error}"))
}

async fn slots(config: &Config, args: &SlotsArgs) -> Result<(), String> {
    let context = AppContext::from_config(config).map_err(|error| error.to_string())?;

    let slots = context
        .slots
        .available_slots(&SlotQuery {
            vendor: VendorId(args.vendor),
            date: args.date,
            service_duration: Minutes::new(args.duration),
        })
        .await
        .map_err(|error| error.user_message())?;

    print_table(&slots_table(&slots))
}

async fn conversations(config: &Config) -> Result<(), String> {
    let context = AppContext::from_config(config).map_err(|error| error.to_string())?;

    let conversations = context
        .chat
        .conversations()
        .await
        .map_err(|error| error.user_message())?;

    print_table(&conversations_table(&dedupe_conversations(conversations)))
}

fn slots_table(slots: &[TimeSlot]) -> String {
    let mut builder = Builder::default();

    builder.push_record(["Time", "Free", "Technicians"]);

    for slot in slots {
        let technicians = slot
            .available_technicians
            .iter()
            .map(|technician| technician.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        builder.push_record([
            slot.time.clone(),
            slot.available_count.to_string(),
            technicians,
        ]);
    }

    let mut table = builder.build();
    table.with(Style::modern_rounded());

    table.to_string()
}

fn conversations_table(conversations: &[Conversation]) -> String {
    let mut builder = Builder::default();

    builder.push_record(["#", "With", "Last message", "At", "Unread"]);

    for conversation in conversations {
        builder.push_record([
            conversation.id.to_string(),
            conversation
                .participant
                .as_ref()
                .map(|participant| participant.name.clone())
                .unwrap_or_default(),
            conversation.last_message.clone().unwrap_or_default(),
            conversation
                .last_message_at
                .map(|at| at.to_string())
                .unwrap_or_default(),
            conversation.unread_count.to_string(),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::modern_rounded());

    table.to_string()
}

fn print_table(table: &str) -> Result<(), String> {
    writeln!(io::stdout().lock(), "{table}").map_err(|error| format!("failed to print: {error}"))
}
