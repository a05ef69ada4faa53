use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use quiz_core::model::{AnswerKey, PerformanceBand, SessionState};
use quiz_core::violation::{EnvironmentEvent, KeyCombo, SelectionControl, ViolationNotice};
use services::sessions::SessionSnapshot;
use services::{
    AppServices, Clock, HttpBankConfig, HttpQuestionBank, Navigator, SessionCommand, SessionRunner,
    ViolationNotifier,
};
use storage::json_bank::JsonFileQuestionBank;
use storage::repository::QuestionBankSource;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt as log_fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidSeed { raw: String },
    InvalidCount { raw: String },
    MissingCount,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
            ArgsError::InvalidCount { raw } => write!(f, "invalid --count value: {raw}"),
            ArgsError::MissingCount => write!(f, "configure requires --count <n>"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Run,
    Configure,
    Results,
    Clear,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "run" => Some(Self::Run),
            "configure" => Some(Self::Configure),
            "results" => Some(Self::Results),
            "clear" => Some(Self::Clear),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    bank_path: String,
    bank_url: Option<String>,
    seed: Option<u64>,
    count: Option<u32>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| normalize_sqlite_url("sqlite:quiz.sqlite3".into()), normalize_sqlite_url);
        let mut bank_path =
            std::env::var("QUIZ_BANK_PATH").unwrap_or_else(|_| "quizquestion.json".into());
        let mut bank_url = HttpBankConfig::from_env().map(|config| config.url);
        let mut seed = None;
        let mut count = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--bank" => {
                    bank_path = require_value(args, "--bank")?;
                }
                "--bank-url" => {
                    bank_url = Some(require_value(args, "--bank-url")?);
                }
                "--seed" => {
                    let value = require_value(args, "--seed")?;
                    let parsed = value
                        .parse::<u64>()
                        .map_err(|_| ArgsError::InvalidSeed { raw: value.clone() })?;
                    seed = Some(parsed);
                }
                "--count" => {
                    let value = require_value(args, "--count")?;
                    let parsed = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidCount { raw: value.clone() })?;
                    count = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            bank_path,
            bank_url,
            seed,
            count,
        })
    }

    fn bank(&self) -> Arc<dyn QuestionBankSource> {
        match &self.bank_url {
            Some(url) => Arc::new(HttpQuestionBank::new(Some(HttpBankConfig {
                url: url.clone(),
            }))),
            None => Arc::new(JsonFileQuestionBank::new(&self.bank_path)),
        }
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- run       [--db <sqlite_url>] [--bank <path> | --bank-url <url>] [--seed <n>]");
    eprintln!("  cargo run -p app -- configure --count <10|20|30|40|50> [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- results   [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- clear     [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:quiz.sqlite3");
    eprintln!("  --bank quizquestion.json");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_BANK_PATH, QUIZ_BANK_URL, RUST_LOG");
}

fn print_controls() {
    println!("Answer with a, b, c or d. x clears the answer.");
    println!("n / p move between questions, f finishes on the last one, q gives up.");
    println!("Simulated host signals: hide, blur, copy, cut, paste, menu, f12, fs-exit, pause <ms>.");
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

//
// ─── TERMINAL ADAPTERS ─────────────────────────────────────────────────────────
//

struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn show_results(&self) {
        println!();
        println!("Quiz completed.");
    }
}

struct TerminalNotifier;

impl ViolationNotifier for TerminalNotifier {
    fn warn(&self, notice: &ViolationNotice) {
        println!(
            "! {} Warning {} ({} left before auto-submit)",
            notice.reason, notice.count, notice.remaining
        );
    }

    fn disqualify(&self, notice: &ViolationNotice) {
        println!(
            "! {} Too many violations. Your quiz is being submitted.",
            notice.reason
        );
    }
}

/// A terminal cannot block selection; the toggle is only logged.
struct TerminalSelection;

impl SelectionControl for TerminalSelection {
    fn set_selection_enabled(&self, enabled: bool) {
        debug!(enabled, "text selection toggled");
    }
}

enum Input {
    Command(SessionCommand),
    Help,
    Quit,
    Unknown(String),
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    let event = |event| Input::Command(SessionCommand::Event(event));
    match line.to_ascii_lowercase().as_str() {
        "a" | "b" | "c" | "d" => match line.parse::<AnswerKey>() {
            Ok(key) => Input::Command(SessionCommand::Select(key)),
            Err(_) => Input::Unknown(line.to_string()),
        },
        "x" => Input::Command(SessionCommand::Clear),
        "n" => Input::Command(SessionCommand::Next),
        "p" => Input::Command(SessionCommand::Previous),
        "f" => Input::Command(SessionCommand::Finish),
        "q" => Input::Quit,
        "?" | "help" => Input::Help,
        "hide" => event(EnvironmentEvent::VisibilityHidden),
        "blur" => event(EnvironmentEvent::WindowBlur),
        "copy" => event(EnvironmentEvent::Copy),
        "cut" => event(EnvironmentEvent::Cut),
        "paste" => event(EnvironmentEvent::Paste),
        "menu" => event(EnvironmentEvent::ContextMenu),
        "f12" => event(EnvironmentEvent::KeyDown(KeyCombo::new("F12"))),
        "fs-exit" => event(EnvironmentEvent::FullscreenExited),
        other => match other.strip_prefix("pause ").map(str::trim) {
            Some(ms) => match ms.parse::<u64>() {
                Ok(ms) => event(EnvironmentEvent::DebuggerPause(Duration::from_millis(ms))),
                Err(_) => Input::Unknown(line.to_string()),
            },
            None => Input::Unknown(line.to_string()),
        },
    }
}

fn render(snapshot: &SessionSnapshot) {
    if snapshot.state != SessionState::InProgress {
        return;
    }
    let Some(question) = &snapshot.question else {
        return;
    };
    println!();
    println!(
        "Question {}/{}  ({}:{:02} left, {} answered, {} violations)",
        snapshot.current + 1,
        snapshot.total,
        snapshot.remaining_secs / 60,
        snapshot.remaining_secs % 60,
        snapshot.answered,
        snapshot.violations
    );
    println!("{}", question.text());
    for (key, option) in question.options() {
        let marker = if snapshot.answer.key() == Some(key) { '*' } else { ' ' };
        println!(" {marker}{key}) {option}");
    }
}

/// Snapshots arrive every tick; only redraw when the screen would change.
fn screen_changed(previous: Option<&SessionSnapshot>, next: &SessionSnapshot) -> bool {
    previous.is_none_or(|prev| {
        prev.state != next.state
            || prev.current != next.current
            || prev.answer != next.answer
            || prev.violations != next.violations
            || (next.remaining_secs % 60 == 0 && prev.remaining_secs != next.remaining_secs)
    })
}

//
// ─── COMMANDS ──────────────────────────────────────────────────────────────────
//

async fn run_quiz(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let controller = services
        .new_session(Arc::new(TerminalNavigator))
        .with_notifier(Arc::new(TerminalNotifier))
        .with_selection_control(Arc::new(TerminalSelection));
    let (runner, handle) = SessionRunner::new(controller);
    let snapshots = runner.subscribe();

    let session = tokio::spawn(runner.run());
    let renderer = tokio::spawn(render_loop(snapshots));

    // Stdin is read on a plain thread so an idle prompt never holds up shutdown.
    let (lines_tx, mut lines) = mpsc::channel::<String>(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if lines_tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    print_controls();
    loop {
        tokio::select! {
            () = handle.closed() => break,
            line = lines.recv() => {
                let Some(line) = line else { break };
                match parse_input(&line) {
                    Input::Command(command) => {
                        if handle.send(command).await.is_err() {
                            break;
                        }
                    }
                    Input::Help => print_controls(),
                    Input::Quit => break,
                    Input::Unknown(raw) => println!("unknown input: {raw} (? for help)"),
                }
            }
        }
    }
    // Dropping the last handle submits a session that is still running.
    drop(handle);

    let outcome = session.await?;
    renderer.abort();
    let result = outcome?;
    info!(
        score = result.final_score(),
        total = result.total_questions(),
        auto_submitted = result.auto_submitted(),
        "quiz finished"
    );

    show_results(services).await
}

async fn render_loop(mut snapshots: watch::Receiver<SessionSnapshot>) {
    let mut last: Option<SessionSnapshot> = None;
    loop {
        let snapshot = snapshots.borrow_and_update().clone();
        if screen_changed(last.as_ref(), &snapshot) {
            render(&snapshot);
        }
        last = Some(snapshot);
        if snapshots.changed().await.is_err() {
            break;
        }
    }
}

async fn show_results(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let view = services.results().load().await?;
    if !view.has_result() {
        println!("No quiz result stored.");
        return Ok(());
    }

    if view.auto_submitted {
        println!("Auto-submitted due to rule violations or timeout.");
    }
    println!(
        "Score: {} / {} ({:.0}%)",
        view.score, view.total_questions, view.percentage
    );
    println!(
        "Correct: {} | Incorrect: {} | Unanswered: {}",
        view.breakdown.correct, view.breakdown.incorrect, view.breakdown.unanswered
    );
    println!(
        "{}",
        match view.band {
            PerformanceBand::Perfect => "Perfect score!",
            PerformanceBand::Excellent => "Excellent! Keep it up!",
            PerformanceBand::Good => "Good job! You can do even better!",
            PerformanceBand::NeedsPractice => "Keep practicing! You'll improve!",
        }
    );
    println!(
        "Time: {}s total, {:.1}s per question",
        view.timing.total_secs, view.timing.average_secs
    );
    for point in &view.time_spent {
        println!("  Q{}: {}s ({:?})", point.question, point.seconds, point.status);
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(log_fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: start a quiz when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Run,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Run,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(&parsed.db_url, Clock::default_clock(), parsed.bank())
        .await?
        .with_seed(parsed.seed);

    match cmd {
        Command::Run => run_quiz(&services).await,
        Command::Configure => {
            let raw = parsed.count.ok_or(ArgsError::MissingCount)?;
            let count = services.setup().select_count(raw).await?;
            println!("Next quiz will draw {} questions.", count.get());
            Ok(())
        }
        Command::Results => show_results(&services).await,
        Command::Clear => {
            services.results().clear().await?;
            println!("Quiz data cleared.");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
