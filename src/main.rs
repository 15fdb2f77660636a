//! Command-line entry point.
//!
//! Every subcommand mounts one list screen, waits for the initial fetch,
//! replays the requested interactions as events and prints the resulting
//! frame:
//!
//! ```text
//! aptdesk list households --filter building=A --sort floor:desc --page 2
//! aptdesk bulk residents deactivate --ids r1,r2
//! aptdesk bulk vehicles delete --ids v9 --yes
//! aptdesk export households --format xlsx
//! aptdesk import households new.csv --yes
//! aptdesk watch residents --seconds 120
//! ```
//!
//! `--fixture FILE` serves the collections from a JSON file instead of the API.

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use aptdesk::api::{HttpApiClient, InMemoryApi};
use aptdesk::app::{BulkAction, DeleteConfirmation, Event, SortDirection, SortSpec, ViewMode};
use aptdesk::domain::{EntityId, ExportFormat};
use aptdesk::infrastructure::{default_config_path, store_path};
use aptdesk::storage::{ActivityLog, JsonStore, KeyValueStore, Preferences};
use aptdesk::worker::WorkerHandle;
use aptdesk::{
    initialize, observability, AptdeskError, Config, Entity, EntityKind, Household, Resident,
    Result, ScreenRuntime, Theme, Vehicle,
};

/// How long a command waits for outstanding requests.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Clock resolution of `watch`.
const WATCH_TICK: Duration = Duration::from_millis(250);

#[derive(Parser)]
#[command(name = "aptdesk")]
#[command(about = "Browse and manage apartment registry records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file path (default: ~/.config/aptdesk/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Serve collections from a JSON fixture instead of the API
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    /// Terminal width used for layout
    #[arg(long, global = true, default_value = "100")]
    width: usize,

    /// Print log events to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Show one page of a registry
    List {
        /// households, residents or vehicles
        kind: EntityKind,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Apply an action to several records
    Bulk {
        kind: EntityKind,

        /// activate, deactivate, delete or export
        action: BulkAction,

        /// Comma-separated record ids
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<String>,

        /// Confirm a delete
        #[arg(long)]
        yes: bool,

        /// File format for export
        #[arg(long, default_value = "csv")]
        format: ExportFormat,
    },

    /// Export the whole collection
    Export {
        kind: EntityKind,

        #[arg(long, default_value = "csv")]
        format: ExportFormat,
    },

    /// Load records from a CSV or JSON file
    Import {
        kind: EntityKind,

        file: PathBuf,

        /// Store the previewed rows instead of only showing them
        #[arg(long)]
        yes: bool,
    },

    /// Undo a delete
    Restore { kind: EntityKind, id: String },

    /// Keep a screen open with background refresh
    Watch {
        kind: EntityKind,

        /// Stop after this many seconds
        #[arg(long, default_value = "60")]
        seconds: u64,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Show or reset stored view preferences
    Prefs {
        kind: EntityKind,

        #[arg(long)]
        reset: bool,
    },

    /// Show recent mutations
    Activity { kind: EntityKind },
}

#[derive(Args, Default)]
struct ViewArgs {
    /// Free-text search
    #[arg(short, long)]
    search: Option<String>,

    /// Field filter, repeatable (key=value)
    #[arg(short, long = "filter")]
    filters: Vec<String>,

    /// Sort as field or field:asc|desc
    #[arg(long)]
    sort: Option<String>,

    #[arg(long)]
    page: Option<usize>,

    #[arg(long)]
    page_size: Option<usize>,

    /// table, card or grid
    #[arg(long)]
    view: Option<ViewMode>,

    /// Apply a saved filter by name
    #[arg(long)]
    saved: Option<String>,

    /// Save the resulting filters under a name
    #[arg(long)]
    save_as: Option<String>,
}

impl ViewArgs {
    /// Translates the flags into screen events, in the order a user would act.
    fn events(&self) -> Result<Vec<Event>> {
        let mut events = Vec::new();

        if let Some(name) = &self.saved {
            events.push(Event::ApplySavedFilter(name.clone()));
        }
        for filter in &self.filters {
            let (key, value) = filter.split_once('=').ok_or_else(|| {
                AptdeskError::Validation(format!("filter must be key=value: {filter}"))
            })?;
            events.push(Event::SetFilter {
                key: key.trim().to_string(),
                value: value.trim().to_string(),
            });
        }
        if let Some(search) = &self.search {
            events.push(Event::SearchInput(search.clone()));
            events.push(Event::CommitSearch);
        }
        if let Some(sort) = &self.sort {
            let (field, direction) = match sort.split_once(':') {
                Some((field, dir)) => (field, dir.parse::<SortDirection>()?),
                None => (sort.as_str(), SortDirection::Asc),
            };
            events.push(Event::SetSort(SortSpec::new(field, direction)));
        }
        if let Some(mode) = self.view {
            events.push(Event::SetViewMode(mode));
        }
        if let Some(size) = self.page_size {
            events.push(Event::SetPageSize(size));
        }
        if let Some(page) = self.page {
            events.push(Event::SetPage(page));
        }
        if let Some(name) = &self.save_as {
            events.push(Event::SaveFilter(name.clone()));
        }
        Ok(events)
    }
}

struct Context {
    config: Config,
    theme: Theme,
    fixture: Option<PathBuf>,
    color: bool,
    width: usize,
}

impl Context {
    fn open_store(&self) -> Result<JsonStore> {
        JsonStore::open(store_path(&self.config.data_dir()))
    }

    fn spawn_worker(&self) -> Result<WorkerHandle> {
        match &self.fixture {
            Some(path) => WorkerHandle::spawn(InMemoryApi::from_fixture(path)?),
            None => WorkerHandle::spawn(HttpApiClient::from_config(&self.config)?),
        }
    }

    fn runtime<E: Entity>(&self) -> Result<ScreenRuntime<E>> {
        let mut runtime = ScreenRuntime::new(
            self.config.screen_settings(),
            self.spawn_worker()?,
            Box::new(self.open_store()?),
            self.config.download_dir(),
        );
        runtime.mount(Utc::now())?;
        runtime.settle(SETTLE_TIMEOUT)?;
        Ok(runtime)
    }

    fn print<E: Entity>(&self, runtime: &ScreenRuntime<E>) {
        print!(
            "{}",
            aptdesk::ui::render(runtime.state(), &self.theme, self.width, self.color)
        );
    }
}

/// Fails the command when the screen ended in a state the user must act on.
fn outcome<E: Entity>(runtime: &ScreenRuntime<E>) -> Result<()> {
    if let Some(status) = runtime.session_expired() {
        return Err(AptdeskError::Auth { status });
    }
    for path in runtime.downloads() {
        println!("saved {}", path.display());
    }
    Ok(())
}

fn run_screen<E: Entity>(ctx: &Context, command: &Command) -> Result<()> {
    match command {
        Command::List { view, .. } => {
            let mut runtime = ctx.runtime::<E>()?;
            for event in view.events()? {
                runtime.dispatch(event)?;
            }
            runtime.settle(SETTLE_TIMEOUT)?;
            ctx.print(&runtime);
            outcome(&runtime)
        }

        Command::Bulk {
            action,
            ids,
            yes,
            format,
            ..
        } => {
            let action = match action {
                BulkAction::Export(_) => BulkAction::Export(*format),
                other => *other,
            };
            let mut runtime = ctx.runtime::<E>()?;
            for id in ids {
                runtime.dispatch(Event::ToggleSelection(EntityId::new(id.trim())))?;
            }
            let selected = runtime.state().selection.sorted_ids();
            if selected.is_empty() {
                return Err(AptdeskError::Validation(
                    "none of the given ids are in the collection".to_string(),
                ));
            }
            if action == BulkAction::Delete && !yes {
                return Err(AptdeskError::Validation(format!(
                    "refusing to delete {} record(s) without --yes",
                    selected.len()
                )));
            }
            let confirmation = yes.then(|| DeleteConfirmation::for_ids(&selected));
            runtime.dispatch(Event::RunBulk {
                action,
                confirmation,
            })?;
            runtime.settle(SETTLE_TIMEOUT)?;
            ctx.print(&runtime);
            outcome(&runtime)
        }

        Command::Export { format, .. } => {
            let mut runtime = ctx.runtime::<E>()?;
            runtime.dispatch(Event::ExportAll(*format))?;
            runtime.settle(SETTLE_TIMEOUT)?;
            outcome(&runtime)
        }

        Command::Import { file, yes, .. } => {
            let bytes = std::fs::read(file)?;
            let filename = file
                .file_name()
                .map_or_else(|| "import".to_string(), |n| n.to_string_lossy().into_owned());
            let mut runtime = ctx.runtime::<E>()?;
            runtime.dispatch(Event::ImportFile { filename, bytes })?;
            runtime.settle(SETTLE_TIMEOUT)?;
            outcome(&runtime)?;

            let Some(rows) = runtime.state().import_preview.as_ref().map(Vec::len) else {
                ctx.print(&runtime);
                return Err(AptdeskError::Validation(format!(
                    "could not read {}",
                    file.display()
                )));
            };
            if !yes {
                ctx.print(&runtime);
                println!("{rows} row(s) read; re-run with --yes to import them");
                return Ok(());
            }
            runtime.dispatch(Event::ConfirmImport)?;
            runtime.settle(SETTLE_TIMEOUT)?;
            ctx.print(&runtime);
            outcome(&runtime)
        }

        Command::Restore { id, .. } => {
            let mut runtime = ctx.runtime::<E>()?;
            runtime.dispatch(Event::Restore(EntityId::new(id.trim())))?;
            runtime.settle(SETTLE_TIMEOUT)?;
            ctx.print(&runtime);
            outcome(&runtime)
        }

        Command::Watch { seconds, view, .. } => {
            let mut runtime = ctx.runtime::<E>()?;
            for event in view.events()? {
                runtime.dispatch(event)?;
            }
            ctx.print(&runtime);

            let deadline = std::time::Instant::now() + Duration::from_secs(*seconds);
            while std::time::Instant::now() < deadline {
                std::thread::sleep(WATCH_TICK);
                let mut render = runtime.pump()?;
                render |= runtime.tick(Utc::now())?;
                if render {
                    print!("\u{1b}[2J\u{1b}[H");
                    ctx.print(&runtime);
                }
                if runtime.session_expired().is_some() {
                    break;
                }
            }
            runtime.unmount()?;
            outcome(&runtime)
        }

        Command::Prefs { reset, .. } => {
            let mut store = ctx.open_store()?;
            if *reset {
                store.remove(&Preferences::key(E::KIND))?;
                println!("preferences for {} reset", E::KIND);
                return Ok(());
            }
            let prefs = Preferences::load(&store, E::KIND)?;
            println!("{}", serde_json::to_string_pretty(&prefs)?);
            Ok(())
        }

        Command::Activity { .. } => {
            let store = ctx.open_store()?;
            let log = ActivityLog::load(&store, E::KIND)?;
            if log.entries().is_empty() {
                println!("no activity recorded for {}", E::KIND);
            }
            for entry in log.entries() {
                println!(
                    "{}  {:<12} {}",
                    entry.at.format("%Y-%m-%d %H:%M"),
                    entry.action,
                    entry.summary
                );
            }
            Ok(())
        }
    }
}

const fn command_kind(command: &Command) -> EntityKind {
    match command {
        Command::List { kind, .. }
        | Command::Bulk { kind, .. }
        | Command::Export { kind, .. }
        | Command::Import { kind, .. }
        | Command::Restore { kind, .. }
        | Command::Watch { kind, .. }
        | Command::Prefs { kind, .. }
        | Command::Activity { kind } => *kind,
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config = match (&cli.config, default_config_path()) {
        (Some(path), _) => Config::from_file(path)?,
        (None, Some(path)) if path.exists() => Config::from_file(&path)?,
        _ => Config::default(),
    };
    let mut config = config.with_env(|key| std::env::var(key).ok());
    config.log_to_stderr |= cli.verbose;
    Ok(config)
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    observability::init_tracing(&config);

    let ctx = Context {
        theme: initialize(&config),
        config,
        fixture: cli.fixture.clone(),
        color: !cli.no_color,
        width: cli.width.max(20),
    };

    let _span = tracing::info_span!("command", kind = %command_kind(&cli.command)).entered();
    match command_kind(&cli.command) {
        EntityKind::Household => run_screen::<Household>(&ctx, &cli.command),
        EntityKind::Resident => run_screen::<Resident>(&ctx, &cli.command),
        EntityKind::Vehicle => run_screen::<Vehicle>(&ctx, &cli.command),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ AptdeskError::Auth { .. }) => {
            eprintln!("aptdesk: {e}; sign in again and retry");
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("aptdesk: {e}");
            ExitCode::FAILURE
        }
    }
}
