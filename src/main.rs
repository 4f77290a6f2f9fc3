use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use campus_events::api::{
    ListParams, auth, categories, events, notifications, registrations, reports, reviews, users,
};
use campus_events::pipeline::navigator::LoggingNavigator;
use campus_events::realtime::bus::{LogToaster, NotificationBus};
use campus_events::{
    ApiClient, ApiError, ClientConfig, RealtimeChannel, RealtimeError, RealtimeOptions,
    SessionCookies, SessionError,
};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Realtime(#[from] RealtimeError),
    #[error("session store failed: {0}")]
    Session(#[from] SessionError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    InvalidArgument(String),
}

#[derive(Parser, Debug)]
#[command(name = "campus", about = "Campus events API and notification CLI")]
struct Cli {
    #[arg(long, env = "CAMPUS_API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "CAMPUS_SESSION_FILE")]
    session_file: Option<PathBuf>,

    #[arg(long, env = "CAMPUS_WS_URL")]
    ws_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Auth(AuthCommand),
    Events(EventsCommand),
    Registrations(RegistrationsCommand),
    Categories(CategoriesCommand),
    Notifications(NotificationsCommand),
    Reviews(ReviewsCommand),
    Users(UsersCommand),
    Reports(ReportsCommand),
}

#[derive(Args, Debug)]
struct AuthCommand {
    #[command(subcommand)]
    command: AuthSubcommand,
}

#[derive(Subcommand, Debug)]
enum AuthSubcommand {
    Login {
        username: String,
        #[arg(long, env = "CAMPUS_PASSWORD")]
        password: String,
    },
    Logout,
    Verify,
    Refresh,
    Register {
        #[arg(long)]
        data: String,
    },
    Roles,
    Csrf,
}

/// Paging flags shared by list commands.
#[derive(Args, Debug, Clone, Default)]
struct PageArgs {
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    page_size: Option<u32>,
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    ordering: Option<String>,
}

impl PageArgs {
    fn into_params(self) -> ListParams {
        let mut params = ListParams::new();
        if let Some(page) = self.page {
            params = params.page(page);
        }
        if let Some(size) = self.page_size {
            params = params.page_size(size);
        }
        if let Some(search) = self.search {
            params = params.search(search);
        }
        if let Some(ordering) = self.ordering {
            params = params.ordering(ordering);
        }
        params
    }
}

#[derive(Args, Debug)]
struct EventsCommand {
    #[command(subcommand)]
    command: EventsSubcommand,
}

#[derive(Subcommand, Debug)]
enum EventsSubcommand {
    List(PageArgs),
    Read {
        id: i64,
    },
    Create {
        #[arg(long)]
        data: String,
    },
    Update {
        id: i64,
        #[arg(long)]
        data: String,
    },
    Delete {
        id: i64,
    },
    Featured {
        #[arg(long, default_value_t = events::DEFAULT_FEATURED_LIMIT)]
        limit: u32,
    },
}

#[derive(Args, Debug)]
struct RegistrationsCommand {
    #[command(subcommand)]
    command: RegistrationsSubcommand,
}

#[derive(Subcommand, Debug)]
enum RegistrationsSubcommand {
    List {
        #[arg(long)]
        event: Option<i64>,
        #[arg(long)]
        user: Option<i64>,
    },
    Read {
        id: i64,
    },
    Create {
        event: i64,
    },
    Delete {
        id: i64,
    },
}

#[derive(Args, Debug)]
struct CategoriesCommand {
    #[command(subcommand)]
    command: CategoriesSubcommand,
}

#[derive(Subcommand, Debug)]
enum CategoriesSubcommand {
    List,
    Count,
    Read { id: i64 },
}

#[derive(Args, Debug)]
struct NotificationsCommand {
    #[command(subcommand)]
    command: NotificationsSubcommand,
}

#[derive(Subcommand, Debug)]
enum NotificationsSubcommand {
    List(PageArgs),
    Read {
        id: i64,
    },
    Search {
        term: String,
        #[command(flatten)]
        page: PageArgs,
    },
    MarkRead {
        id: i64,
    },
    Count,
    Delete {
        id: i64,
    },
    /// Hold the realtime channel open and print pushed notifications.
    Watch {
        /// Skip loading the current inbox before connecting.
        #[arg(long)]
        no_backfill: bool,
    },
}

#[derive(Args, Debug)]
struct ReviewsCommand {
    #[command(subcommand)]
    command: ReviewsSubcommand,
}

#[derive(Subcommand, Debug)]
enum ReviewsSubcommand {
    ForEvent {
        event: i64,
    },
    Mine,
    Rateable,
    Create {
        #[arg(long)]
        data: String,
    },
    Update {
        id: i64,
        #[arg(long)]
        data: String,
    },
    Delete {
        id: i64,
    },
    Average {
        event: i64,
    },
}

#[derive(Args, Debug)]
struct UsersCommand {
    #[command(subcommand)]
    command: UsersSubcommand,
}

#[derive(Subcommand, Debug)]
enum UsersSubcommand {
    Count,
    Read {
        id: i64,
    },
    Update {
        id: i64,
        #[arg(long)]
        data: String,
    },
}

#[derive(Args, Debug)]
struct ReportsCommand {
    #[command(subcommand)]
    command: ReportsSubcommand,
}

#[derive(Subcommand, Debug)]
enum ReportsSubcommand {
    ByMonth {
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
    ByUser,
    ByCategory,
    ByLocation,
    ByStatus,
    Export {
        format: reports::ExportFormat,
        #[arg(long)]
        kind: Option<String>,
        /// Directory the file is written to.
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env();
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }
    if let Some(session_file) = cli.session_file {
        config.session_file = session_file;
    }
    if cli.ws_url.is_some() {
        config.ws_url = cli.ws_url;
    }

    let session = SessionCookies::new(&config.api_url)?;
    let loaded = session.load(&config.session_file)?;
    tracing::debug!(loaded, path = %config.session_file.display(), "session loaded");

    let navigator = Arc::new(LoggingNavigator::new(config.login_page.clone()));
    let client = ApiClient::new(&config, session.clone(), navigator)?;

    let result = run(&config, &client, cli.command).await;

    // Persist rotated cookies even when the command failed.
    session.save(&config.session_file)?;
    result
}

async fn run(config: &ClientConfig, client: &ApiClient, command: Command) -> Result<(), CliError> {
    match command {
        Command::Auth(cmd) => run_auth(client, cmd).await,
        Command::Events(cmd) => run_events(client, cmd).await,
        Command::Registrations(cmd) => run_registrations(client, cmd).await,
        Command::Categories(cmd) => run_categories(client, cmd).await,
        Command::Notifications(cmd) => run_notifications(config, client, cmd).await,
        Command::Reviews(cmd) => run_reviews(client, cmd).await,
        Command::Users(cmd) => run_users(client, cmd).await,
        Command::Reports(cmd) => run_reports(client, cmd).await,
    }
}

async fn run_auth(client: &ApiClient, cmd: AuthCommand) -> Result<(), CliError> {
    let json = match cmd.command {
        AuthSubcommand::Login { username, password } => {
            auth::login(client, &username, &password).await?
        }
        AuthSubcommand::Logout => auth::logout(client).await?,
        AuthSubcommand::Verify => auth::verify(client).await?,
        AuthSubcommand::Refresh => auth::refresh(client).await?,
        AuthSubcommand::Register { data } => auth::register(client, parse_data(&data)?).await?,
        AuthSubcommand::Roles => auth::roles(client).await?,
        AuthSubcommand::Csrf => {
            serde_json::json!({ "csrf_token": auth::fetch_csrf_token(client).await })
        }
    };
    print_json(&json)
}

async fn run_events(client: &ApiClient, cmd: EventsCommand) -> Result<(), CliError> {
    let json = match cmd.command {
        EventsSubcommand::List(page) => events::list(client, page.into_params()).await?,
        EventsSubcommand::Read { id } => events::get(client, id).await?,
        EventsSubcommand::Create { data } => events::create(client, parse_data(&data)?).await?,
        EventsSubcommand::Update { id, data } => {
            events::update(client, id, parse_data(&data)?).await?
        }
        EventsSubcommand::Delete { id } => {
            events::delete(client, id).await?;
            serde_json::json!({ "deleted": id })
        }
        EventsSubcommand::Featured { limit } => events::featured(client, limit).await?,
    };
    print_json(&json)
}

async fn run_registrations(
    client: &ApiClient,
    cmd: RegistrationsCommand,
) -> Result<(), CliError> {
    let json = match cmd.command {
        RegistrationsSubcommand::List { event, user } => {
            registrations::list(client, event, user).await?
        }
        RegistrationsSubcommand::Read { id } => registrations::get(client, id).await?,
        RegistrationsSubcommand::Create { event } => registrations::create(client, event).await?,
        RegistrationsSubcommand::Delete { id } => {
            registrations::delete(client, id).await?;
            serde_json::json!({ "deleted": id })
        }
    };
    print_json(&json)
}

async fn run_categories(client: &ApiClient, cmd: CategoriesCommand) -> Result<(), CliError> {
    let json = match cmd.command {
        CategoriesSubcommand::List => categories::list(client).await?,
        CategoriesSubcommand::Count => categories::count(client).await?,
        CategoriesSubcommand::Read { id } => categories::get(client, id).await?,
    };
    print_json(&json)
}

async fn run_notifications(
    config: &ClientConfig,
    client: &ApiClient,
    cmd: NotificationsCommand,
) -> Result<(), CliError> {
    match cmd.command {
        NotificationsSubcommand::List(page) => {
            let page = notifications::list(client, page.into_params()).await?;
            print_serialized(&page)
        }
        NotificationsSubcommand::Read { id } => {
            print_serialized(&notifications::get(client, id).await?)
        }
        NotificationsSubcommand::Search { term, page } => {
            let page = notifications::search(client, &term, page.into_params()).await?;
            print_serialized(&page)
        }
        NotificationsSubcommand::MarkRead { id } => {
            print_json(&notifications::mark_read(client, id).await?)
        }
        NotificationsSubcommand::Count => print_serialized(&notifications::count(client).await?),
        NotificationsSubcommand::Delete { id } => {
            print_json(&notifications::delete(client, id).await?)
        }
        NotificationsSubcommand::Watch { no_backfill } => {
            watch_notifications(config, client, !no_backfill).await
        }
    }
}

async fn watch_notifications(
    config: &ClientConfig,
    client: &ApiClient,
    backfill: bool,
) -> Result<(), CliError> {
    let options = RealtimeOptions::from_config(config, client.session().clone())?;

    let inbox = if backfill {
        match notifications::list(client, ListParams::new()).await {
            Ok(page) => {
                tracing::info!(count = page.count, "inbox loaded");
                page.results
            }
            Err(error) => {
                tracing::warn!(%error, "inbox backfill failed");
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    tracing::info!(url = %options.url, "opening notification channel");
    let handle = RealtimeChannel::spawn(options, NotificationBus::default(), Arc::new(LogToaster));
    let mut pushed = handle.subscribe();
    handle.notifications().merge_older(inbox);

    let mut finished_check = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted; closing notification channel");
                break;
            }
            received = pushed.recv() => match received {
                Ok(notification) => print_serialized(&notification)?,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "watcher fell behind; notifications dropped");
                }
                Err(RecvError::Closed) => break,
            },
            _ = finished_check.tick() => {
                if handle.is_finished() {
                    tracing::warn!("notification channel stopped by server");
                    break;
                }
            }
        }
    }

    let unread = handle.notifications().unread();
    handle.shutdown().await;
    tracing::info!(unread, "notification channel closed");
    Ok(())
}

async fn run_reviews(client: &ApiClient, cmd: ReviewsCommand) -> Result<(), CliError> {
    let json = match cmd.command {
        ReviewsSubcommand::ForEvent { event } => reviews::for_event(client, event).await?,
        ReviewsSubcommand::Mine => reviews::mine(client).await?,
        ReviewsSubcommand::Rateable => reviews::rateable_events(client).await?,
        ReviewsSubcommand::Create { data } => reviews::create(client, parse_data(&data)?).await?,
        ReviewsSubcommand::Update { id, data } => {
            reviews::update(client, id, parse_data(&data)?).await?
        }
        ReviewsSubcommand::Delete { id } => {
            reviews::delete(client, id).await?;
            serde_json::json!({ "deleted": id })
        }
        ReviewsSubcommand::Average { event } => reviews::average_rating(client, event).await?,
    };
    print_json(&json)
}

async fn run_users(client: &ApiClient, cmd: UsersCommand) -> Result<(), CliError> {
    let json = match cmd.command {
        UsersSubcommand::Count => users::count(client).await?,
        UsersSubcommand::Read { id } => users::get(client, id).await?,
        UsersSubcommand::Update { id, data } => users::update(client, id, parse_data(&data)?).await?,
    };
    print_json(&json)
}

async fn run_reports(client: &ApiClient, cmd: ReportsCommand) -> Result<(), CliError> {
    let json = match cmd.command {
        ReportsSubcommand::ByMonth { start, end } => {
            reports::events_by_month(client, start.as_deref(), end.as_deref()).await?
        }
        ReportsSubcommand::ByUser => reports::summary(client, reports::Summary::ByUser).await?,
        ReportsSubcommand::ByCategory => {
            reports::summary(client, reports::Summary::ByCategory).await?
        }
        ReportsSubcommand::ByLocation => {
            reports::summary(client, reports::Summary::ByLocation).await?
        }
        ReportsSubcommand::ByStatus => reports::summary(client, reports::Summary::ByStatus).await?,
        ReportsSubcommand::Export {
            format,
            kind,
            out_dir,
        } => {
            let report = reports::export(client, format, kind.as_deref()).await?;
            let path = out_dir.join(&report.file_name);
            std::fs::write(&path, &report.bytes)?;
            serde_json::json!({ "file": path.display().to_string(), "bytes": report.bytes.len() })
        }
    };
    print_json(&json)
}

fn parse_data(data: &str) -> Result<Value, CliError> {
    let value = serde_json::from_str::<Value>(data)?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(CliError::InvalidArgument(
            "--data must be a JSON object".to_owned(),
        ))
    }
}

fn print_serialized<T: Serialize>(value: &T) -> Result<(), CliError> {
    print_json(&serde_json::to_value(value)?)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
