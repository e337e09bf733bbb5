use std::{collections::BTreeMap, path::Path, path::PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use chrono::{NaiveDate, Utc};
use entity::{
    Choice, KanbanRecord, Resource, account, calendar_event, campaign, carepack, contact, deal,
    email, email_template, lead, partner, product, task, ticket, user,
};
use platform_api::ApiClient;
use products_crm::{
    DeleteConfirm, KanbanBoard, ListPage, SubmitError, Validate,
    csv_io::{ImportError, preflight},
    pages::CalendarView,
    stats, submit, template,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    BoardKind, CreateCommand, ListArgs, ResourceKind, StatsKind,
    config::{AppConfig, clamp_page_size},
    render::{self, Row, money, percent},
};

/// Run `$body` with `$R` bound to the record type behind `$kind`.
macro_rules! with_resource {
    ($kind:expr, $R:ident => $body:expr) => {
        match $kind {
            ResourceKind::Accounts => { type $R = account::Model; $body }
            ResourceKind::Contacts => { type $R = contact::Model; $body }
            ResourceKind::Leads => { type $R = lead::Model; $body }
            ResourceKind::Deals => { type $R = deal::Model; $body }
            ResourceKind::Carepacks => { type $R = carepack::Model; $body }
            ResourceKind::Emails => { type $R = email::Model; $body }
            ResourceKind::EmailTemplates => { type $R = email_template::Model; $body }
            ResourceKind::CalendarEvents => { type $R = calendar_event::Model; $body }
            ResourceKind::Campaigns => { type $R = campaign::Model; $body }
            ResourceKind::Tasks => { type $R = task::Model; $body }
            ResourceKind::Tickets => { type $R = ticket::Model; $body }
            ResourceKind::Partners => { type $R = partner::Model; $body }
            ResourceKind::Products => { type $R = product::Model; $body }
            ResourceKind::Users => { type $R = user::Model; $body }
        }
    };
}

pub async fn list(client: &ApiClient, config: &AppConfig, args: ListArgs) -> Result<()> {
    let page_size = clamp_page_size(args.page_size.unwrap_or(config.page_size));
    with_resource!(args.resource, R => list_page::<R>(client, page_size, &args).await)
}

async fn list_page<R: Resource + Row>(client: &ApiClient, page_size: u32, args: &ListArgs) -> Result<()> {
    let mut page = ListPage::<R>::new(page_size).starting_at(args.page);
    if let Some(term) = &args.search {
        page = page.with_search(term.clone());
    }
    if let Some(sort) = &args.sort {
        page = page.with_sort(sort.clone());
    }
    for (key, value) in &args.filters {
        page = page.with_filter(key.clone(), value.clone());
    }
    page.init(&client.resource::<R>()).await;
    if let Some(err) = page.error() {
        bail!("{err}");
    }
    print!("{}", render::table(page.items()));
    println!("{}", render::footer(page.pager()));
    Ok(())
}

pub async fn show(client: &ApiClient, resource: ResourceKind, id: Uuid) -> Result<()> {
    let json = with_resource!(resource, R => {
        let record = client
            .resource::<R>()
            .get(id)
            .await
            .with_context(|| format!("failed to load {} {id}", R::LABEL.to_lowercase()))?;
        serde_json::to_string_pretty(&record)?
    });
    println!("{json}");
    Ok(())
}

pub async fn delete(client: &ApiClient, resource: ResourceKind, id: Uuid, yes: bool) -> Result<()> {
    with_resource!(resource, R => delete_record::<R>(client, id, yes).await)
}

async fn delete_record<R: Resource>(client: &ApiClient, id: Uuid, yes: bool) -> Result<()> {
    let api = client.resource::<R>();
    let record = api
        .get(id)
        .await
        .with_context(|| format!("failed to load {} {id}", R::LABEL.to_lowercase()))?;
    if !yes {
        println!(
            "Delete {} \"{}\"? Re-run with --yes to confirm.",
            R::LABEL.to_lowercase(),
            record.title()
        );
        return Ok(());
    }
    let mut control = DeleteConfirm::default();
    control.request(id);
    control
        .confirm::<R, _>(&api, id)
        .await
        .with_context(|| format!("failed to delete {} {id}", R::LABEL.to_lowercase()))?;
    println!("{} deleted", R::LABEL);
    Ok(())
}

pub async fn create(client: &ApiClient, command: CreateCommand) -> Result<()> {
    let id = match command {
        CreateCommand::Account {
            name,
            industry,
            email,
            website,
        } => {
            let draft = account::Draft {
                name,
                industry,
                email,
                website,
                ..Default::default()
            };
            create_record::<account::Model>(client, draft).await?
        }
        CreateCommand::Lead {
            name,
            email,
            company,
            value_cents,
        } => {
            let draft = lead::Draft {
                name,
                email,
                company,
                value_cents,
                ..Default::default()
            };
            create_record::<lead::Model>(client, draft).await?
        }
        CreateCommand::Task {
            title,
            notes,
            priority,
            due,
        } => {
            let priority = match priority {
                Some(raw) => raw.parse::<task::Priority>()?,
                None => task::Priority::default(),
            };
            let draft = task::Draft {
                title,
                notes,
                priority,
                due_at: due
                    .and_then(|d| d.and_hms_opt(17, 0, 0))
                    .map(|dt| dt.and_utc()),
                ..Default::default()
            };
            create_record::<task::Model>(client, draft).await?
        }
    };
    println!("{id}");
    Ok(())
}

async fn create_record<R>(client: &ApiClient, draft: R::Draft) -> Result<Uuid>
where
    R: Resource,
    R::Draft: Validate,
{
    match submit::<R, _>(&client.resource::<R>(), draft, None).await {
        Ok(saved) => {
            info!(resource = R::PATH, id = %saved.id(), "created");
            Ok(saved.id())
        }
        Err(SubmitError::Invalid(errors)) => {
            for (field, message) in errors.iter() {
                eprintln!("  {field}: {message}");
            }
            Err(anyhow!("{} not created: invalid input", R::LABEL))
        }
        Err(SubmitError::Api(err)) => {
            Err(anyhow!(err).context(format!("failed to create {}", R::LABEL.to_lowercase())))
        }
    }
}

pub async fn kanban(client: &ApiClient, page_size: u32, kind: BoardKind) -> Result<()> {
    let page_size = clamp_page_size(page_size);
    let out = match kind {
        BoardKind::Leads => load_board::<lead::Model>(client, page_size).await?,
        BoardKind::Deals => load_board::<deal::Model>(client, page_size).await?,
        BoardKind::Tasks => load_board::<task::Model>(client, page_size).await?,
    };
    print!("{out}");
    Ok(())
}

async fn load_board<R: KanbanRecord>(client: &ApiClient, page_size: u32) -> Result<String> {
    let mut board = KanbanBoard::<R>::new(page_size);
    board.load(&client.kanban::<R>()).await;
    if let Some(err) = board.error() {
        bail!("{err}");
    }
    Ok(render::board(&board))
}

pub async fn move_card(
    client: &ApiClient,
    config: &AppConfig,
    kind: BoardKind,
    id: Uuid,
    status: &str,
    position: usize,
) -> Result<()> {
    match kind {
        BoardKind::Leads => move_on::<lead::Model>(client, config, id, status, position).await,
        BoardKind::Deals => move_on::<deal::Model>(client, config, id, status, position).await,
        BoardKind::Tasks => move_on::<task::Model>(client, config, id, status, position).await,
    }
}

async fn move_on<R: KanbanRecord>(
    client: &ApiClient,
    config: &AppConfig,
    id: Uuid,
    status: &str,
    position: usize,
) -> Result<()> {
    let to = <R::Status as Choice>::parse(status).ok_or_else(|| {
        let known: Vec<&str> = <R::Status as Choice>::ALL.iter().map(|s| s.as_str()).collect();
        anyhow!("unknown status `{status}`, expected one of: {}", known.join(", "))
    })?;
    let source = client.kanban::<R>();
    let mut board = KanbanBoard::<R>::new(config.page_size);
    board.load(&source).await;
    // The card may sit past the first page of its column.
    board.load_until_found(&source, id).await;
    board
        .move_card(&source, id, to, position)
        .await
        .with_context(|| format!("failed to move {} {id}", R::LABEL.to_lowercase()))?;
    println!("Moved {} to {}", R::LABEL.to_lowercase(), to.as_str());
    Ok(())
}

pub async fn expiring(client: &ApiClient, days: u32) -> Result<()> {
    let mut packs = client
        .resource::<carepack::Model>()
        .expiring(days)
        .await
        .context("failed to load expiring carepacks")?;
    packs.sort_by_key(|p| p.end_date);
    let today = Utc::now().date_naive();
    for pack in &packs {
        println!(
            "{:>4}d  {}  {}  ends {}",
            pack.days_until_expiry(today),
            pack.id,
            pack.name,
            pack.end_date
        );
    }
    println!("{} carepacks expire within {days} days", packs.len());
    Ok(())
}

async fn first_page<R: Resource>(client: &ApiClient, page_size: u32) -> Result<Vec<R>> {
    let mut page = ListPage::<R>::new(clamp_page_size(page_size));
    page.init(&client.resource::<R>()).await;
    match page.error() {
        Some(err) => bail!("{err}"),
        None => Ok(page.items().to_vec()),
    }
}

pub async fn stats(client: &ApiClient, page_size: u32, kind: StatsKind) -> Result<()> {
    match kind {
        StatsKind::Accounts => {
            let s = stats::account_stats(&first_page(client, page_size).await?);
            println!("accounts: {}", s.total);
            for (status, count) in &s.by_status {
                println!("  {status}: {count}");
            }
            println!("annual revenue: {}", money(Some(s.annual_revenue_cents), None));
        }
        StatsKind::Deals => {
            let s = stats::deal_stats(&first_page(client, page_size).await?);
            println!("open: {}  won: {}  lost: {}", s.open, s.won, s.lost);
            println!("pipeline: {}", money(Some(s.pipeline_cents), None));
            println!("weighted: {}", money(Some(s.weighted_cents), None));
            println!("won value: {}", money(Some(s.won_cents), None));
            println!("win rate: {}", percent(s.win_rate()));
            for total in &s.by_stage {
                println!(
                    "  {:<10} {:>4}  {}",
                    total.stage.as_str(),
                    total.count,
                    money(Some(total.amount_cents), None)
                );
            }
        }
        StatsKind::Carepacks => {
            let packs: Vec<carepack::Model> = first_page(client, page_size).await?;
            let s = stats::carepack_stats(&packs, Utc::now().date_naive(), stats::EXPIRY_WINDOW_DAYS);
            println!(
                "active: {}  expiring soon: {}  expired: {}",
                s.active, s.expiring_soon, s.expired
            );
        }
        StatsKind::Campaigns => {
            let s = stats::campaign_stats(&first_page(client, page_size).await?);
            println!("running: {}  sent: {}", s.running, s.sent);
            println!("open rate: {}", percent(s.open_rate()));
            println!("click rate: {}", percent(s.click_rate()));
        }
        StatsKind::Tasks => {
            let s = stats::task_stats(&first_page(client, page_size).await?, Utc::now());
            println!("open: {}  overdue: {}  done: {}", s.open, s.overdue, s.done);
        }
        StatsKind::Leads => {
            let s = stats::lead_stats(&first_page(client, page_size).await?);
            println!("leads: {}  value: {}", s.total, money(Some(s.value_cents), None));
            for (status, count) in &s.by_status {
                println!("  {status}: {count}");
            }
        }
    }
    Ok(())
}

pub async fn calendar(client: &ApiClient, from: NaiveDate, to: NaiveDate) -> Result<()> {
    let start = from
        .and_hms_opt(0, 0, 0)
        .context("invalid start date")?
        .and_utc();
    // Inclusive end date on the command line.
    let end = to
        .succ_opt()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("invalid end date")?
        .and_utc();
    let mut view = CalendarView::new();
    view.load(client, start, end).await;
    if let Some(err) = view.error() {
        bail!("{err}");
    }
    let agenda = view.agenda();
    if agenda.is_empty() {
        println!("No events");
    }
    for day in agenda {
        println!("{}", day.date.format("%a %Y-%m-%d"));
        for event in &day.events {
            println!(
                "  {}-{}  {:<8} {}",
                event.starts_at.format("%H:%M"),
                event.ends_at.format("%H:%M"),
                event.kind.as_str(),
                event.title
            );
        }
    }
    Ok(())
}

pub async fn send_email(client: &ApiClient, id: Uuid) -> Result<()> {
    let sent = client
        .resource::<email::Model>()
        .send(id)
        .await
        .with_context(|| format!("failed to send email {id}"))?;
    println!("{} -> {} ({})", sent.subject, sent.to, sent.status);
    Ok(())
}

pub async fn render_template(client: &ApiClient, id: Uuid, vars: Vec<(String, String)>) -> Result<()> {
    let template = client
        .resource::<email_template::Model>()
        .get(id)
        .await
        .with_context(|| format!("failed to load template {id}"))?;
    let vars: BTreeMap<String, String> = vars.into_iter().collect();
    let subject = template::render(&template.subject, &vars)?;
    let body = template::render(&template.body, &vars)?;
    println!("Subject: {subject}\n\n{body}");
    Ok(())
}

pub async fn import(client: &ApiClient, entity: &str, file: &Path, dry_run: bool) -> Result<()> {
    let data = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let check = match preflight(entity, &data) {
        Ok(check) => check,
        Err(err @ ImportError::UnknownEntity(_)) => {
            let known: Vec<&str> = products_crm::csv_io::importable().collect();
            bail!("{err}; importable: {}", known.join(", "));
        }
        Err(err) => return Err(err).context("csv preflight failed"),
    };
    if !check.is_clean() {
        for row in &check.errors {
            eprintln!("  row {}: {}", row.row, row.message);
        }
        bail!("{} of {} rows need fixing before upload", check.errors.len(), check.rows);
    }
    let report = client
        .bulk()
        .import(entity, data, dry_run)
        .await
        .context("bulk import failed")?;
    for row in &report.errors {
        let field = row.field.as_deref().unwrap_or("-");
        eprintln!("  row {} [{field}]: {}", row.row, row.message);
    }
    let verb = if report.dry_run || dry_run { "would import" } else { "imported" };
    println!(
        "{verb} {} of {} rows, {} failed",
        report.imported, report.total_rows, report.failed
    );
    Ok(())
}

pub async fn export(client: &ApiClient, entity: &str, output: Option<PathBuf>) -> Result<()> {
    let csv = client
        .bulk()
        .export(entity)
        .await
        .with_context(|| format!("failed to export {entity}"))?;
    match output {
        Some(path) => {
            std::fs::write(&path, &csv)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(entity, path = %path.display(), bytes = csv.len(), "export written");
        }
        None => print!("{csv}"),
    }
    Ok(())
}
