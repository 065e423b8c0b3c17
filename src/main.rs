use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use mocktest::{
    api::HttpExamClient,
    app::App,
    app_dirs::AppDirs,
    config::{ConfigStore, FileConfigStore, Overrides},
    exam::Difficulty,
    gateway::ExamApi,
    history::HistoryDb,
    logging,
    runtime::{AppEvent, AppEventSource, CrosstermEventSource, FixedTicker, Runner, Ticker},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    sync::Arc,
};

/// timed mock tests in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Generate a mock test from the exam-practice service, take it against the clock, and get it scored. Results are kept locally so progress can be tracked over time."
)]
pub struct Cli {
    /// base url of the exam-practice service
    #[clap(long, env = "MOCKTEST_API_URL")]
    api_url: Option<String>,

    /// subject to generate questions for
    #[clap(short = 's', long)]
    subject: Option<String>,

    /// narrow the test to one topic
    #[clap(short = 't', long)]
    topic: Option<String>,

    /// question difficulty
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// number of questions
    #[clap(short = 'n', long = "questions")]
    question_count: Option<u32>,

    /// time limit in minutes
    #[clap(short = 'm', long = "minutes")]
    duration_minutes: Option<u32>,

    /// practice mode: the clock can be paused
    #[clap(long)]
    practice: bool,

    /// http request timeout in seconds
    #[clap(long)]
    timeout_secs: Option<u64>,

    /// write the effective settings back to the config file
    #[clap(long)]
    save_config: bool,

    /// print a summary of past attempts and exit
    #[clap(long)]
    history: bool,

    /// export past attempts as csv and exit
    #[clap(long, value_name = "PATH")]
    export_history: Option<PathBuf>,

    /// delete all recorded attempts and exit (runs after --export-history)
    #[clap(long)]
    clear_history: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            api_base_url: self.api_url.clone(),
            subject: self.subject.clone(),
            topic: self.topic.clone(),
            difficulty: self.difficulty,
            question_count: self.question_count,
            duration_minutes: self.duration_minutes,
            request_timeout_secs: self.timeout_secs,
            practice_mode: self.practice,
        }
    }
}

fn open_history() -> Option<HistoryDb> {
    let path = AppDirs::db_path()?;
    match HistoryDb::open(&path) {
        Ok(db) => Some(db),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "history unavailable");
            None
        }
    }
}

fn print_history(db: &HistoryDb) -> Result<(), Box<dyn Error>> {
    let summary = db.summary()?;
    if summary.attempts == 0 {
        println!("No attempts recorded yet.");
        return Ok(());
    }

    println!(
        "{} attempts, average {:.1}%, best {:.1}%",
        summary.attempts, summary.average_score, summary.best_score
    );
    for subject in &summary.subjects {
        println!(
            "  {:<16} {:>3} attempts  avg {:>5.1}%  best {:>5.1}%",
            subject.subject, subject.attempts, subject.average_score, subject.best_score
        );
    }

    let now = chrono::Local::now();
    println!();
    for entry in db.recent(10)? {
        println!(
            "  {:>5.1}%  {:<16} {:<32} {}",
            entry.score,
            entry.subject,
            entry.title,
            entry.age(now)
        );
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let store = FileConfigStore::new();
    let config = store.load().merged(&cli.overrides());

    let _log_guard = match AppDirs::log_dir() {
        Some(dir) => logging::init(&dir, &config.log_level).ok(),
        None => None,
    };
    tracing::info!(version = env!("CARGO_PKG_VERSION"), api = %config.api_base_url, "starting");

    if cli.save_config {
        store.save(&config)?;
        tracing::info!(path = %store.path().display(), "config saved");
    }

    if cli.history || cli.clear_history || cli.export_history.is_some() {
        let Some(db) = open_history() else {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::Io, "history database is not available").exit();
        };
        if let Some(path) = &cli.export_history {
            let rows = db.export_csv(path)?;
            println!("exported {rows} attempts to {}", path.display());
        }
        if cli.clear_history {
            db.clear()?;
            tracing::info!("history cleared");
            println!("history cleared");
        }
        if cli.history {
            print_history(&db)?;
        }
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let api = Arc::new(HttpExamClient::new(
        &config.api_base_url,
        config.request_timeout(),
    )?);
    let mut app = App::new(api, config, open_history());

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::seconds());
    let result = start_tui(&mut terminal, &mut app, runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if cli.save_config {
        store.save(app.config())?;
    }
    tracing::info!("exiting");

    result
}

fn start_tui<B: Backend, A: ExamApi, E: AppEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App<A>,
    mut runner: Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    while !app.should_quit() {
        let redraw = match runner.step() {
            AppEvent::Tick => app.on_tick(),
            AppEvent::Resize => true,
            AppEvent::Key(key) => {
                app.on_key(key);
                true
            }
        };

        if app.pending().is_some() {
            // Show the loading frame before blocking on the request.
            terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            app.run_pending();
            runner.drain();
            runner.reset_tick();
            terminal.draw(|f| f.render_widget(&*app, f.area()))?;
        } else if redraw {
            terminal.draw(|f| f.render_widget(&*app, f.area()))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_maps_to_overrides() {
        let cli = Cli::try_parse_from([
            "mocktest",
            "--api-url",
            "http://exams.local:9000",
            "-s",
            "Chemistry",
            "-d",
            "hard",
            "-n",
            "20",
            "-m",
            "45",
            "--practice",
        ])
        .unwrap();

        let overrides = cli.overrides();
        assert_eq!(overrides.api_base_url.as_deref(), Some("http://exams.local:9000"));
        assert_eq!(overrides.subject.as_deref(), Some("Chemistry"));
        assert_eq!(overrides.difficulty, Some(Difficulty::Hard));
        assert_eq!(overrides.question_count, Some(20));
        assert_eq!(overrides.duration_minutes, Some(45));
        assert!(overrides.practice_mode);
        assert_eq!(overrides.topic, None);
    }

    #[test]
    fn cli_rejects_unknown_difficulty() {
        let err = Cli::try_parse_from(["mocktest", "-d", "impossible"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn cli_export_path() {
        let cli = Cli::try_parse_from(["mocktest", "--export-history", "out.csv"]).unwrap();
        assert_eq!(cli.export_history, Some(PathBuf::from("out.csv")));
        assert!(!cli.history);
        assert!(!cli.clear_history);
    }

    #[test]
    fn cli_clear_history_combines_with_export() {
        let cli =
            Cli::try_parse_from(["mocktest", "--export-history", "out.csv", "--clear-history"])
                .unwrap();
        assert!(cli.clear_history);
        assert!(cli.export_history.is_some());
    }
}
