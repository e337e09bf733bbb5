mod commands;
mod config;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use platform_obs::{ObsConfig, init_tracing, shutdown_tracing};
use uuid::Uuid;

use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "crm-console", version, about = "CRM console over the REST backend")]
struct Cli {
    /// Backend base URL, overrides CRM_API_URL.
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Bearer token, overrides CRM_API_TOKEN.
    #[arg(long, global = true)]
    token: Option<String>,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[arg(long, env = "OTLP_ENDPOINT", global = true, hide_env_values = true)]
    otlp_endpoint: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Accounts,
    Contacts,
    Leads,
    Deals,
    Carepacks,
    Emails,
    EmailTemplates,
    CalendarEvents,
    Campaigns,
    Tasks,
    Tickets,
    Partners,
    Products,
    Users,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoardKind {
    Leads,
    Deals,
    Tasks,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatsKind {
    Accounts,
    Deals,
    Carepacks,
    Campaigns,
    Tasks,
    Leads,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List one page of records.
    List(ListArgs),
    /// Print one record as JSON.
    Show { resource: ResourceKind, id: Uuid },
    /// Delete a record. Without --yes only the confirmation prompt is shown.
    Delete {
        resource: ResourceKind,
        id: Uuid,
        #[arg(long)]
        yes: bool,
    },
    /// Create a record.
    #[command(subcommand)]
    Create(CreateCommand),
    /// Show a kanban board.
    Kanban {
        board: BoardKind,
        #[arg(long)]
        page_size: Option<u32>,
    },
    /// Move a card to another column.
    Move {
        board: BoardKind,
        id: Uuid,
        status: String,
        #[arg(long, default_value_t = 0)]
        position: usize,
    },
    /// Carepacks ending soon.
    Expiring {
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
    /// Summary figures over the first page of records.
    Stats {
        kind: StatsKind,
        #[arg(long)]
        page_size: Option<u32>,
    },
    /// Events between two dates, grouped by day.
    Calendar {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },
    /// Send a stored email.
    SendEmail { id: Uuid },
    /// Render an email template with `--var name=value` pairs.
    RenderTemplate {
        id: Uuid,
        #[arg(long = "var", value_parser = parse_pair)]
        vars: Vec<(String, String)>,
    },
    /// Upload a CSV file for bulk import.
    Import {
        entity: String,
        file: PathBuf,
        #[arg(long)]
        dry_run: bool,
    },
    /// Download the bulk export of a collection as CSV.
    Export {
        entity: String,
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
pub struct ListArgs {
    resource: ResourceKind,
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long)]
    page_size: Option<u32>,
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    sort: Option<String>,
    #[arg(long = "filter", value_parser = parse_pair)]
    filters: Vec<(String, String)>,
}

#[derive(Subcommand, Debug)]
pub enum CreateCommand {
    Account {
        #[arg(long)]
        name: String,
        #[arg(long)]
        industry: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        website: Option<String>,
    },
    Lead {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        company: Option<String>,
        /// Estimated value in cents.
        #[arg(long)]
        value_cents: Option<i64>,
    },
    Task {
        #[arg(long)]
        title: String,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        /// Due date, `YYYY-MM-DD`.
        #[arg(long)]
        due: Option<NaiveDate>,
    },
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in `{raw}`"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(ObsConfig {
        otlp_endpoint: cli.otlp_endpoint.clone(),
        ..ObsConfig::default().verbose(cli.verbose)
    })?;
    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load()?.with_overrides(cli.api_url, cli.token, None);
    let client = config.client()?;
    match cli.command {
        Command::List(args) => commands::list(&client, &config, args).await,
        Command::Show { resource, id } => commands::show(&client, resource, id).await,
        Command::Delete { resource, id, yes } => commands::delete(&client, resource, id, yes).await,
        Command::Create(cmd) => commands::create(&client, cmd).await,
        Command::Kanban { board, page_size } => {
            commands::kanban(&client, page_size.unwrap_or(config.page_size), board).await
        }
        Command::Move {
            board,
            id,
            status,
            position,
        } => commands::move_card(&client, &config, board, id, &status, position).await,
        Command::Expiring { days } => commands::expiring(&client, days).await,
        Command::Stats { kind, page_size } => {
            commands::stats(&client, page_size.unwrap_or(config.page_size), kind).await
        }
        Command::Calendar { from, to } => commands::calendar(&client, from, to).await,
        Command::SendEmail { id } => commands::send_email(&client, id).await,
        Command::RenderTemplate { id, vars } => commands::render_template(&client, id, vars).await,
        Command::Import {
            entity,
            file,
            dry_run,
        } => commands::import(&client, &entity, &file, dry_run).await,
        Command::Export { entity, output } => commands::export(&client, &entity, output).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn filters_and_vars_parse_as_pairs() {
        let cli = Cli::try_parse_from([
            "crm-console",
            "list",
            "accounts",
            "--filter",
            "status=active",
            "--filter",
            "industry = Retail",
            "--page",
            "3",
        ])
        .unwrap();
        let Command::List(args) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(args.resource, ResourceKind::Accounts);
        assert_eq!(args.page, 3);
        assert_eq!(
            args.filters,
            vec![
                ("status".to_string(), "active".to_string()),
                ("industry".to_string(), "Retail".to_string()),
            ]
        );
        assert!(parse_pair("novalue").is_err());
        assert!(parse_pair("=x").is_err());
    }

    #[test]
    fn multi_word_resources_use_kebab_case() {
        let id = Uuid::nil().to_string();
        let cli = Cli::try_parse_from(["crm-console", "show", "email-templates", id.as_str()]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Show {
                resource: ResourceKind::EmailTemplates,
                ..
            }
        ));
    }
}
