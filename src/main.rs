use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{fs::OpenOptions, io, sync::Mutex};
use taskdash::{
    config::Config,
    dashboard::Dashboard,
    error::ConfigError,
    task_store::{SystemClock, TaskStore},
    ui,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "TASKDASH_LOG";

fn init_tracing(config: &Config) -> Result<(), ConfigError> {
    let Some(path) = &config.log_file else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| ConfigError::LogFile {
            path: path.clone(),
            source,
        })?;
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("taskdash=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    init_tracing(&config)?;

    let store = if config.seed_demo_tasks {
        TaskStore::with_demo_tasks(SystemClock)?
    } else {
        TaskStore::new(SystemClock)
    };
    info!(tasks = store.len(), columns = config.columns, "starting dashboard");
    let mut dashboard = Dashboard::new(store, config.columns);

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = ui::run_app(&mut terminal, &mut dashboard);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        error!(%err, "dashboard exited with an error");
        eprintln!("{:?}", err);
    }
    info!("dashboard closed");
    Ok(())
}
