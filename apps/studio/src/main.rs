use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{
    date_range::DateChange,
    debounce::SearchDebouncer,
    filters::{ContactFilterPanel, EmailFilterPanel},
    CaseStrategy, ContactStrategy, ContainerConfig, DefinitionCache, EmailStrategy,
    EntityStrategy, HttpRecordService, MessageComposer, RecordContainer,
};
use shared::{
    domain::{FilterName, RecordId, RecordView},
    protocol::{
        CaseFilterDelta, ContactFilterDelta, EntityFilterDelta, GeneralFilterDelta, WidgetEvent,
    },
};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::load_settings;

#[derive(Parser, Debug)]
#[command(about = "Browse and mail provider records")]
struct Args {
    /// Overrides the configured record service url.
    #[arg(long)]
    service_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print one page of records.
    Browse(BrowseArgs),
    /// Print the contact title and network pickers.
    Options,
    /// Send a mass email to the given contacts.
    Mail {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        body: String,
        #[arg(long = "to", required = true)]
        recipients: Vec<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    Contacts,
    Cases,
    Emails,
}

#[derive(clap::Args, Debug)]
struct BrowseArgs {
    #[arg(long, value_enum, default_value_t = Kind::Contacts)]
    kind: Kind,
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    limit: Option<u32>,
    /// Column index to sort by; repeat to toggle direction.
    #[arg(long)]
    sort: Vec<usize>,
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    county: Option<String>,
    /// Email whose cases are listed.
    #[arg(long)]
    email_id: Option<String>,
    #[arg(long)]
    start_date: Option<NaiveDate>,
    #[arg(long)]
    end_date: Option<NaiveDate>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let settings = load_settings();
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args = Args::parse();
    let service_url = args.service_url.unwrap_or(settings.service_url.clone());
    let service = Arc::new(HttpRecordService::new(&service_url)?);
    let cache = Arc::new(DefinitionCache::new());
    let config = settings.container_config();
    info!(%service_url, "studio: starting");

    match args.command {
        Command::Browse(browse_args) => browse(service, cache, config, browse_args).await,
        Command::Options => options(service, &config).await,
        Command::Mail {
            subject,
            body,
            recipients,
        } => mail(service, &cache, subject, body, recipients).await,
    }
}

async fn browse(
    service: Arc<HttpRecordService>,
    cache: Arc<DefinitionCache>,
    config: ContainerConfig,
    args: BrowseArgs,
) -> Result<()> {
    let mut events = Vec::new();
    match args.kind {
        Kind::Contacts => {
            if args.title.is_some() || args.county.is_some() {
                events.push(WidgetEvent::UniqueFilterChange {
                    filter_name: FilterName::ContactFilter,
                    delta: EntityFilterDelta::Contact(ContactFilterDelta {
                        title: args.title.clone().map(Some),
                        county: args.county.clone().map(Some),
                        ..ContactFilterDelta::default()
                    }),
                });
            }
        }
        Kind::Cases => {
            let email_id = args
                .email_id
                .clone()
                .ok_or_else(|| anyhow!("--email-id is required to list cases"))?;
            events.push(WidgetEvent::UniqueFilterChange {
                filter_name: FilterName::CaseFilter,
                delta: EntityFilterDelta::Case(CaseFilterDelta {
                    email_id: Some(Some(RecordId::new(email_id))),
                }),
            });
        }
        Kind::Emails => {
            let mut panel = EmailFilterPanel::load(service.as_ref(), &cache).await?;
            let mut change = DateChange::Pending;
            if let Some(start_date) = args.start_date {
                change = panel.picker_mut().set_start_date(Some(start_date));
            }
            if let Some(end_date) = args.end_date {
                change = panel.picker_mut().set_end_date(Some(end_date));
            }
            if let DateChange::Invalid(notice) = &change {
                return Err(anyhow!("{} {}", notice.title, notice.message));
            }
            events.extend(EmailFilterPanel::date_changed(&change));
        }
    }

    let definitions = service.clone();
    match args.kind {
        Kind::Contacts => {
            let container = RecordContainer::new(
                ContactStrategy::new(service),
                definitions,
                cache,
                config,
            );
            run_browse(container, events, &args).await
        }
        Kind::Cases => {
            let container =
                RecordContainer::new(CaseStrategy::new(service), definitions, cache, config);
            run_browse(container, events, &args).await
        }
        Kind::Emails => {
            let container =
                RecordContainer::new(EmailStrategy::new(service), definitions, cache, config);
            run_browse(container, events, &args).await
        }
    }
}

async fn run_browse<S: EntityStrategy>(
    container: Arc<RecordContainer<S>>,
    mut events: Vec<WidgetEvent>,
    args: &BrowseArgs,
) -> Result<()> {
    container.initialize().await?;

    // A limit change resets every other criterion, so it goes first.
    if let Some(limit) = args.limit {
        events.insert(0, WidgetEvent::RecordLimitChange { limit });
    }
    if let Some(search) = &args.search {
        events.push(WidgetEvent::GeneralFilterChange {
            delta: GeneralFilterDelta::search(search.clone()),
        });
    }
    events.extend(
        args.sort
            .iter()
            .map(|&column_index| WidgetEvent::SortChange { column_index }),
    );
    if let Some(current_page) = args.page {
        events.push(WidgetEvent::PageTurn { current_page });
    }

    for event in events {
        container.handle_event(event).await?;
    }

    let snapshot = container.snapshot().await;
    for record in &snapshot.records {
        println!("{}", serde_json::to_string(record)?);
    }
    let paginator = snapshot.paginator();
    println!(
        "page {} of {} ({} records, {} per page)",
        paginator.current_page(),
        paginator.total_pages(),
        snapshot.total_record_count,
        snapshot.record_limit
    );
    Ok(())
}

async fn options(service: Arc<HttpRecordService>, config: &ContainerConfig) -> Result<()> {
    let (tx, _rx) = mpsc::unbounded_channel();
    let county = SearchDebouncer::county_search(config.search_debounce, tx);
    let mut panel = ContactFilterPanel::new(county);
    panel.load_options(service.as_ref()).await;

    println!("titles: {}", serde_json::to_string(panel.title_options())?);
    println!("networks: {}", serde_json::to_string(panel.network_options())?);
    Ok(())
}

async fn mail(
    service: Arc<HttpRecordService>,
    cache: &DefinitionCache,
    subject: String,
    body: String,
    recipients: Vec<String>,
) -> Result<()> {
    let mut composer = MessageComposer::open(service, cache).await?;
    composer.set_subject(subject);
    composer.set_message_body(body);

    let records = recipients
        .into_iter()
        .map(|id| {
            let mut record = RecordView::default();
            record.set_field(RecordView::ID_FIELD, id);
            record
        })
        .collect();
    composer.handle_selection(&WidgetEvent::SelectionAdded { records });

    let sent = composer.send().await?;
    if sent == 0 {
        warn!("studio: service accepted the draft but sent nothing");
    }
    println!("sent {sent} emails");
    Ok(())
}
