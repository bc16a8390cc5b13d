use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use intake::api::{HttpBackend, TicketBackend};
use intake::app::App;
use intake::config::Config;
use intake::logging;
use intake::types::Ticket;
use intake::workspace::SyntheticGenerator;

#[derive(Parser)]
#[command(name = "intake")]
#[command(about = "File requests and review the priority-ordered ticket queue")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Backend base URL (overrides config)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print tickets in priority order
    Tickets {
        /// Show requester, description and attachments for every ticket
        #[arg(short, long)]
        expand_all: bool,
    },

    /// Create ten synthetic contacts and tickets, then print the list
    Seed,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
    }

    // No subcommand means the TUI owns the terminal
    let is_tui_mode = cli.command.is_none();
    let logging_handle = logging::init_logging(&config, is_tui_mode, cli.debug)?;

    let backend =
        HttpBackend::from_config(&config).context("Failed to create backend client")?;

    match cli.command {
        Some(Commands::Tickets { expand_all }) => {
            cmd_tickets(&config, &backend, expand_all).await?;
        }
        Some(Commands::Seed) => {
            cmd_seed(&config, &backend).await?;
        }
        None => {
            run_tui(config, Arc::new(backend), logging_handle.log_file_path).await?;
        }
    }

    Ok(())
}

async fn run_tui(
    config: Config,
    backend: Arc<dyn TicketBackend>,
    log_file_path: Option<PathBuf>,
) -> Result<()> {
    let mut app = App::new(config, backend)?;
    let result = app.run().await;

    // Print log file path on exit if logs were written
    if let Some(log_path) = log_file_path {
        if let Ok(metadata) = log_path.metadata() {
            if metadata.len() > 0 {
                eprintln!("Session log: {}", log_path.display());
            }
        }
    }

    result
}

async fn cmd_tickets(config: &Config, backend: &dyn TicketBackend, expand_all: bool) -> Result<()> {
    let tickets = backend
        .list_ordered_tickets()
        .await
        .context("Failed to load tickets")?;

    if tickets.is_empty() {
        println!("No tickets");
        return Ok(());
    }

    println!("Tickets by priority ({} tickets)", tickets.len());
    println!("{}", "─".repeat(72));

    for ticket in &tickets {
        print_ticket(ticket, expand_all, config.base_url());
    }

    Ok(())
}

fn print_ticket(ticket: &Ticket, expanded: bool, base_url: &str) {
    println!(
        "#{:<4} {:>6}  {:<8} {:<12} {}  ({})",
        ticket.id,
        ticket
            .computed_priority_display()
            .unwrap_or_else(|| "-".to_string()),
        ticket.priority_level.label(),
        ticket.ticket_type.label(),
        ticket.requester.name,
        ticket.created_at_display()
    );

    if !expanded {
        return;
    }

    println!(
        "      Requester:   {} <{}>",
        ticket.requester.name, ticket.requester.email
    );
    if let Some(description) = ticket.description.as_deref().filter(|_| ticket.has_description()) {
        println!("      Description: {}", description);
    }
    for attachment in ticket.attachment_refs() {
        println!(
            "      Attachment:  {}  {}",
            attachment.original_name,
            attachment.download_url(base_url)
        );
    }
}

async fn cmd_seed(config: &Config, backend: &dyn TicketBackend) -> Result<()> {
    let generator = SyntheticGenerator::from_config(&config.generator)?;

    println!(
        "Creating {} synthetic requests against {}...",
        generator.total_requests(),
        config.base_url()
    );
    let report = generator.run(backend).await?;
    println!("{}", report.summary());
    println!();

    cmd_tickets(config, backend, false).await
}
