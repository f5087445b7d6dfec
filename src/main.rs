pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use speedgame::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    results_log::ResultsLog,
    runtime::{Action, CrosstermEventSource, EventSource, GameEvent, InputMode, Runner},
    Clock, HighscoreRecord, HighscoreStore, SystemClock, TapOutcome, TimingController,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
    time::Duration,
};
use tracing_subscriber::EnvFilter;

const TICK_RATE_MS: u64 = 100;
/// How many ticks a status message stays on screen
const STATUS_TICKS: u16 = 30;

/// double-tap the circle as fast as you can and keep a list of the best times
#[derive(Parser, Debug, Clone, Default)]
#[clap(
    version,
    about,
    long_about = "A reaction-time game: tap once to arm the timer, tap again to stop it. Save good times as named highscores, kept sorted fastest first in a local database."
)]
pub struct Cli {
    /// highscore database file (defaults to the state directory)
    #[clap(long, value_name = "PATH")]
    db: Option<PathBuf>,

    /// reject empty names and negative scores when saving highscores
    #[clap(long)]
    strict_names: bool,

    /// do not append measurements to the results journal
    #[clap(long)]
    no_results_log: bool,

    /// configuration file to use instead of the platform default
    #[clap(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// write the effective configuration back to the configuration file
    #[clap(long)]
    save_config: bool,

    /// print the highscores, fastest first, and exit
    #[clap(long)]
    list: bool,

    /// print the highscore list as JSON
    #[clap(long, requires = "list")]
    json: bool,

    /// delete every highscore and exit
    #[clap(long, conflicts_with = "list")]
    reset_scores: bool,

    /// file receiving diagnostic logs (filter with RUST_LOG)
    #[clap(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Overlay command line flags on the stored configuration
    fn effective_config(&self, mut cfg: Config) -> Config {
        if let Some(db) = &self.db {
            cfg.db_path = Some(db.clone());
        }
        if self.strict_names {
            cfg.strict_names = true;
        }
        if self.no_results_log {
            cfg.log_results = false;
        }
        cfg
    }

    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Tab {
    Game,
    Highscores,
}

impl Tab {
    pub const ALL: [Tab; 2] = [Tab::Game, Tab::Highscores];

    pub fn index(self) -> usize {
        match self {
            Tab::Game => 0,
            Tab::Highscores => 1,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Tab::Game => Tab::Highscores,
            Tab::Highscores => Tab::Game,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    pub text: String,
    pub is_error: bool,
    ticks_left: u16,
}

impl Status {
    fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
            ticks_left: STATUS_TICKS,
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
            ticks_left: STATUS_TICKS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug)]
pub struct App<C: Clock = SystemClock> {
    pub timing: TimingController<C>,
    pub store: HighscoreStore,
    pub results_log: Option<ResultsLog>,
    pub tab: Tab,
    pub dialog_visible: bool,
    pub name: String,
    pub highscores: Vec<HighscoreRecord>,
    pub scroll_offset: usize,
    pub status: Option<Status>,
}

impl<C: Clock> App<C> {
    pub fn new(
        store: HighscoreStore,
        timing: TimingController<C>,
        results_log: Option<ResultsLog>,
    ) -> Self {
        Self {
            timing,
            store,
            results_log,
            tab: Tab::Game,
            dialog_visible: false,
            name: String::new(),
            highscores: Vec::new(),
            scroll_offset: 0,
            status: None,
        }
    }

    pub fn into_store(self) -> HighscoreStore {
        self.store
    }

    pub fn tap(&mut self) {
        if let TapOutcome::Measured(elapsed_ms) = self.timing.on_tap() {
            if let Some(log) = &self.results_log {
                if let Err(e) = log.append(elapsed_ms) {
                    tracing::warn!(error = %e, path = %log.path().display(), "failed to journal result");
                }
            }
        }
    }

    pub fn reset(&mut self) {
        self.timing.reset();
    }

    pub fn toggle_add_dialog(&mut self) {
        self.dialog_visible = !self.dialog_visible;
    }

    /// Save the current score under the dialog's name. The dialog stays open
    /// when the store refuses, so nothing typed is lost.
    pub fn add_highscore(&mut self) {
        let score = i64::try_from(self.timing.current_score()).unwrap_or(i64::MAX);
        match self.store.create(&self.name, score) {
            Ok(record) => {
                self.status = Some(Status::info(format!(
                    "Saved {} with {} ms",
                    record.name, record.score
                )));
                self.dialog_visible = false;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to save highscore");
                self.status = Some(Status::error(e.to_string()));
            }
        }
    }

    pub fn select_tab(&mut self, tab: Tab) {
        self.tab = tab;
        if tab == Tab::Highscores {
            self.refresh_highscores();
        }
    }

    pub fn refresh_highscores(&mut self) {
        match self.store.list_sorted() {
            Ok(records) => {
                self.highscores = records;
                self.scroll_offset = self
                    .scroll_offset
                    .min(self.highscores.len().saturating_sub(1));
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load highscores");
                self.status = Some(Status::error(e.to_string()));
            }
        }
    }

    pub fn reset_all_scores(&mut self) {
        match self.store.clear() {
            Ok(()) => {
                self.highscores.clear();
                self.scroll_offset = 0;
                self.status = Some(Status::info("All highscores deleted"));
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to delete highscores");
                self.status = Some(Status::error(e.to_string()));
            }
        }
    }

    /// Age the status line. Returns true when the screen needs a redraw.
    pub fn on_tick(&mut self) -> bool {
        match self.status.as_mut() {
            Some(status) if status.ticks_left > 1 => {
                status.ticks_left -= 1;
                false
            }
            Some(_) => {
                self.status = None;
                true
            }
            None => false,
        }
    }

    pub fn input_mode(&self) -> InputMode {
        match (self.dialog_visible, self.tab) {
            (true, _) => InputMode::NameEntry,
            (false, Tab::Game) => InputMode::Game,
            (false, Tab::Highscores) => InputMode::Highscores,
        }
    }

    pub fn handle_action(&mut self, action: Action) -> Flow {
        let last = self.highscores.len().saturating_sub(1);
        match action {
            Action::Quit => return Flow::Quit,
            Action::Tap => self.tap(),
            Action::Reset => self.reset(),
            Action::OpenDialog | Action::CancelDialog => self.toggle_add_dialog(),
            Action::SubmitName => self.add_highscore(),
            Action::InsertChar(c) => self.name.push(c),
            Action::DeleteChar => {
                self.name.pop();
            }
            Action::SwitchTab => self.select_tab(self.tab.next()),
            Action::ShowGame => self.select_tab(Tab::Game),
            Action::ShowHighscores => self.select_tab(Tab::Highscores),
            Action::ResetAllScores => self.reset_all_scores(),
            Action::ScrollUp(by) => self.scroll_offset = self.scroll_offset.saturating_sub(by),
            Action::ScrollDown(by) => self.scroll_offset = (self.scroll_offset + by).min(last),
            Action::ScrollTop => self.scroll_offset = 0,
        }
        Flow::Continue
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    init_tracing(cli.log_file.clone().or_else(AppDirs::log_file_path));

    let config_store = cli.config_store();
    let config = cli.effective_config(config_store.load());
    if cli.save_config {
        config_store.save(&config)?;
    }

    let mut store =
        HighscoreStore::open(config.resolved_db_path())?.with_validation(config.validation());

    if cli.list {
        print_highscores(&store, cli.json)?;
        store.close()?;
        return Ok(());
    }

    if cli.reset_scores {
        store.clear()?;
        println!("All highscores deleted");
        store.close()?;
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let results_log = if config.log_results {
        AppDirs::results_log_path().map(ResultsLog::new)
    } else {
        None
    };
    let mut app = App::new(store, TimingController::new(), results_log);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(
        CrosstermEventSource::new(),
        Duration::from_millis(TICK_RATE_MS),
    );
    let outcome = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    outcome?;
    app.into_store().close()?;

    Ok(())
}

fn start_tui<B: Backend, C: Clock, E: EventSource>(
    terminal: &mut Terminal<B>,
    app: &mut App<C>,
    runner: &Runner<E>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui::draw(app, f))?;

    loop {
        match runner.step(app.input_mode()) {
            GameEvent::Tick => {
                if app.on_tick() {
                    terminal.draw(|f| ui::draw(app, f))?;
                }
            }
            GameEvent::Redraw => {
                terminal.draw(|f| ui::draw(app, f))?;
            }
            GameEvent::Action(action) => {
                if app.handle_action(action) == Flow::Quit {
                    break;
                }
                terminal.draw(|f| ui::draw(app, f))?;
            }
        }
    }

    Ok(())
}

fn print_highscores(store: &HighscoreStore, json: bool) -> Result<(), Box<dyn Error>> {
    let records = store.list_sorted()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else if records.is_empty() {
        println!("No highscores yet");
    } else {
        for (idx, record) in records.iter().enumerate() {
            println!("{}. {} {}", idx + 1, record.name, record.score);
        }
    }
    Ok(())
}

/// Send tracing output to `path`. The terminal belongs to the UI, so without a
/// writable log file logging is simply off.
fn init_tracing(path: Option<PathBuf>) {
    let Some(path) = path else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}
