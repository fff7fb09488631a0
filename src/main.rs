//! querybook - browse and edit SQL query results in the terminal
//!
//! Parses arguments, resolves the connection, loads the first grid and then
//! hands the terminal to the controller's event loop.

use anyhow::{Context, Result, bail};
use clap::Parser;
use crossterm::event::{self, Event, KeyEventKind};
use std::rc::Rc;
use std::time::Instant;

use querybook::app::{Action, AppEvent, Controller, Services};
use querybook::clipboard::SystemClipboard;
use querybook::commands::{CommandExecutor, CommandLine, PromptContext, ShellExecutor, parse_command};
use querybook::config::{self, ConfigFile, ConnectionConfig, FileLibrary, InMemoryLibrary, QueryLibrary};
use querybook::db::{self, DatabaseHandle};
use querybook::editor::ExternalEditor;
use querybook::grid::ResultGrid;
use querybook::{logging, terminal, ui};

#[derive(Debug, Parser)]
#[command(name = "querybook", version, about = "Browse and edit SQL query results")]
struct Cli {
    /// Saved query id or name
    selector: Option<String>,

    /// Connection name from the config file
    #[arg(short = 'c', long)]
    connection: Option<String>,

    /// Run this SQL instead of a saved query
    #[arg(short = 'e', long = "sql")]
    sql: Option<String>,

    /// Connect to this URL instead of a configured connection
    #[arg(long)]
    url: Option<String>,

    /// Row cap for row-producing queries (0 disables)
    #[arg(long)]
    limit: Option<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(path) = logging::init().context("failed to set up logging")? {
        eprintln!("logging to {}", path.display());
    }

    let file = ConfigFile::load().context("failed to load configuration")?;
    let mut settings = file.settings.clone();
    if let Some(limit) = cli.limit {
        settings.row_limit = limit;
    }

    let (connection, library): (ConnectionConfig, Box<dyn QueryLibrary>) = match &cli.url {
        Some(url) => (
            ConnectionConfig::from_url(url).context("invalid connection URL")?,
            Box::new(InMemoryLibrary::default()),
        ),
        None => {
            let connection = file
                .resolve_connection(cli.connection.as_deref())
                .context("no connection to use")?
                .clone();
            let library = FileLibrary::open(config::config_file()?, &connection.name)
                .context("failed to open saved queries")?;
            (connection, Box::new(library))
        }
    };

    let endpoint = connection.endpoint().context("invalid connection URL")?;
    let handle: Rc<dyn DatabaseHandle> = db::connect(&endpoint)
        .with_context(|| format!("failed to connect to '{}'", connection.name))?;
    tracing::info!(connection = %connection.name, dialect = %endpoint.dialect, "connected");

    let mut executor = ShellExecutor::new(&handle, library, settings.row_limit);
    let first = if let Some(sql) = &cli.sql {
        parse_command(sql, "").context("empty SQL")?
    } else if let Some(selector) = &cli.selector {
        CommandLine::new("query", selector.as_str())
    } else if let Some(last) = &connection.last_query {
        CommandLine::new("run", last.as_str())
    } else {
        bail!("nothing to run: pass a saved query, -e SQL, or run a query once first");
    };

    let grid = match executor
        .execute(&first, &PromptContext::default())
        .with_context(|| format!("failed to run `{}`", first))?
    {
        Some(grid) => grid,
        None => {
            println!("Done: {}", first);
            return Ok(());
        }
    };

    let services = Services {
        editor: Box::new(ExternalEditor::from_env()),
        clipboard: Box::new(SystemClipboard::new()),
        executor: Box::new(executor),
    };
    run_viewer(grid, settings, services)
}

fn run_viewer(grid: ResultGrid, settings: config::Settings, services: Services) -> Result<()> {
    let tick_rate = settings.tick_rate();
    let mut tui =
        terminal::init().context("failed to initialize terminal; are you running in a real TTY?")?;
    let size = tui.size().context("failed to read terminal size")?;
    let mut controller = Controller::new(grid, settings, services, (size.width, size.height));

    let res = event_loop(&mut tui, &mut controller, tick_rate);
    terminal::restore(&mut tui).context("failed to restore terminal")?;
    res
}

fn event_loop(
    tui: &mut terminal::Tui,
    controller: &mut Controller,
    tick_rate: std::time::Duration,
) -> Result<()> {
    loop {
        if controller.take_full_redraw() {
            tui.clear()?;
        }
        tui.draw(|frame| ui::render(frame, controller))?;

        let event = if event::poll(tick_rate)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => AppEvent::Key(key),
                Event::Resize(w, h) => AppEvent::Resize(w, h),
                _ => continue,
            }
        } else {
            AppEvent::Tick(Instant::now())
        };

        match controller.handle_event(event)? {
            Action::None => {}
            Action::Quit => return Ok(()),
            Action::Rerun(sql) => {
                controller.run_sql(&sql)?;
            }
        }
    }
}
