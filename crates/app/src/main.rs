use std::error::Error;
use std::fmt;
use std::time::Duration;

use exam_core::model::{QuestionId, SessionMode, SubjectId};
use services::sessions::{
    LiveSession, Navigation, ResultReport, SessionController, StatusKind, format_clock,
};
use services::{AppServices, Clock, ExamConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidSubjectId { raw: String },
    InvalidDbUrl { raw: String },
    InvalidLimit { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidSubjectId { raw } => write!(f, "invalid --subject value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidLimit { raw } => write!(f, "invalid --limit value: {raw}"),
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

struct Args {
    db_url: String,
    subject_id: SubjectId,
    api: Option<String>,
    limit: usize,
    clear: bool,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- take    [--db <sqlite_url>] [--subject <id>] [--api <base_url>]");
    eprintln!("  cargo run -p app -- history [--db <sqlite_url>] [--limit <n>] [--clear]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:exam.sqlite3");
    eprintln!("  --subject 1");
    eprintln!("  --limit 10");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_DB_URL, EXAM_SUBJECT_ID, EXAM_API_BASE_URL, EXAM_HTTP_TIMEOUT_SECS,");
    eprintln!("  EXAM_REMOTE_SUBMIT, EXAM_DURATION_POLICY, EXAM_LOG");
}

fn print_help() {
    println!("Commands:");
    println!("  <n>          choose option n for the current question");
    println!("  n / p        next / previous question");
    println!("  g <k>        go to question k");
    println!("  m            mark or unmark the current question");
    println!("  pause        pause the timer (resume with `resume`)");
    println!("  s            submit");
    println!("  r            toggle the answer review after submitting");
    println!("  restart      discard answers and start over");
    println!("  start        begin a new timed attempt");
    println!("  study        browse the questions untimed, answers shown at once");
    println!("  status       show the question navigator");
    println!("  q            quit (progress is kept)");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Take,
    History,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "take" => Some(Self::Take),
            "history" => Some(Self::History),
            _ => None,
        }
    }
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("EXAM_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://exam.sqlite3".into(), normalize_sqlite_url);
        let mut subject_id = std::env::var("EXAM_SUBJECT_ID")
            .ok()
            .and_then(|value| value.parse::<SubjectId>().ok())
            .unwrap_or_else(|| SubjectId::new(1));
        let mut api = None;
        let mut limit = 10;
        let mut clear = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--subject" => {
                    let value = require_value(args, "--subject")?;
                    subject_id = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidSubjectId { raw: value.clone() })?;
                }
                "--api" => api = Some(require_value(args, "--api")?),
                "--limit" => {
                    let value = require_value(args, "--limit")?;
                    limit = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidLimit { raw: value.clone() })?;
                }
                "--clear" => clear = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            subject_id,
            api,
            limit,
            clear,
        })
    }
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

fn init_tracing() {
    let filter = EnvFilter::try_from_env("EXAM_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,reqwest=warn,hyper=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: take an exam when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Take,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Take,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let parsed = Args::parse(&mut argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let mut config = ExamConfig::from_env()?;
    if let Some(api) = parsed.api.as_deref() {
        config = config.with_base_url(api)?;
    }

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    tracing::debug!(db = %parsed.db_url, api = %config.base_url, "opening storage");
    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(&parsed.db_url, Clock::system(), config).await?;

    match cmd {
        Command::Take => take_exam(&services, parsed.subject_id).await,
        Command::History => show_history(&services, parsed.limit, parsed.clear).await,
    }
}

async fn show_history(
    services: &AppServices,
    limit: usize,
    clear: bool,
) -> Result<(), Box<dyn Error>> {
    let history = services.history();
    if clear {
        history.clear().await?;
        println!("History cleared.");
        return Ok(());
    }

    let results = history.recent(limit).await?;
    if results.is_empty() {
        println!("No exams taken yet.");
    }
    for result in results {
        println!(
            "{}  {:<30} {:>3}%  {}/{}  {}{}",
            result.completed_at().format("%Y-%m-%d %H:%M"),
            result.subject_name(),
            result.score_percent(),
            result.correct_count(),
            result.total_questions(),
            format_clock(result.time_spent_seconds()),
            if result.using_fallback_data() { "  (demo)" } else { "" },
        );
    }
    Ok(())
}

async fn take_exam(services: &AppServices, subject_id: SubjectId) -> Result<(), Box<dyn Error>> {
    let session = services.sessions().open(subject_id).await?;

    let intro = session
        .read(|c| {
            format!(
                "{}: {} questions, {} on the clock.",
                c.exam().subject_name(),
                c.exam().question_count(),
                format_clock(c.time_remaining()),
            )
        })
        .await;
    println!("{intro}");
    if session.read(SessionController::using_fallback_data).await {
        println!("The question service is unavailable; using demo questions.");
    }
    if session.resumed() {
        println!("Resuming your saved progress.");
    }
    println!("Type `help` for commands.");
    render(&session).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut display = tokio::time::interval(Duration::from_secs(1));
    let mut last_mode = session.read(SessionController::mode).await;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_line(&session, line.trim()).await {
                    break;
                }
                last_mode = session.read(SessionController::mode).await;
            }
            _ = display.tick() => {
                // Catch auto-submission by the countdown.
                let mode = session.read(SessionController::mode).await;
                if mode != last_mode {
                    if mode == SessionMode::Submitted {
                        println!("Time is up.");
                    }
                    render(&session).await;
                    last_mode = mode;
                }
            }
        }
    }

    session.close().await;
    Ok(())
}

/// Returns false when the user asked to quit.
async fn handle_line(session: &LiveSession, line: &str) -> bool {
    let mut parts = line.split_whitespace();
    let Some(word) = parts.next() else {
        render(session).await;
        return true;
    };

    match word {
        "q" | "quit" | "exit" => return false,
        "help" | "h" | "?" => {
            print_help();
            return true;
        }
        "start" => session.start().await,
        "n" | "next" => {
            session.navigate(Navigation::Delta(1)).await;
        }
        "p" | "prev" => {
            session.navigate(Navigation::Delta(-1)).await;
        }
        "g" | "go" => match parts.next().and_then(|k| k.parse::<usize>().ok()) {
            Some(k) if k > 0 => {
                session.navigate(Navigation::Index(k - 1)).await;
            }
            _ => println!("usage: g <question number>"),
        },
        "m" | "mark" => {
            if let Some(id) = current_question(session).await {
                session.toggle_mark(id).await;
            }
        }
        "pause" => {
            if session.pause_timer().await {
                println!("Paused. Type `resume` to continue.");
            }
            return true;
        }
        "resume" => {
            if !session.resume_timer().await {
                println!("The timer is not paused.");
            }
        }
        "s" | "submit" => {
            let unanswered = session.read(|c| c.progress().remaining).await;
            if unanswered > 0 {
                println!("Submitting with {unanswered} unanswered question(s).");
            }
            session.submit().await;
        }
        "r" | "review" => {
            session.toggle_review().await;
        }
        "restart" => session.restart().await,
        "study" => session.study().await,
        "status" => {
            print_navigator(session).await;
            return true;
        }
        choice => match choice.parse::<usize>() {
            Ok(n) if n > 0 => select_option(session, n - 1).await,
            _ => println!("unknown command: {choice} (type `help`)"),
        },
    }

    render(session).await;
    true
}

async fn current_question(session: &LiveSession) -> Option<QuestionId> {
    session
        .read(|c| c.current_page_questions().first().map(|q| q.id()))
        .await
}

async fn select_option(session: &LiveSession, index: usize) {
    let choice = session
        .read(|c| {
            c.current_page_questions()
                .first()
                .and_then(|q| q.options().get(index).map(|option| (q.id(), option.clone())))
        })
        .await;
    match choice {
        Some((id, option)) => session.select_answer(id, &option).await,
        None => println!("no such option"),
    }
}

async fn print_navigator(session: &LiveSession) {
    let line = session
        .read(|c| {
            (0..c.exam().question_count())
                .filter_map(|index| c.question_status(index).map(|status| (index, status)))
                .map(|(index, status)| {
                    let badge = match status.kind {
                        StatusKind::Current => ">",
                        StatusKind::Answered => "*",
                        StatusKind::Unanswered => " ",
                    };
                    let flag = if status.marked { "!" } else { "" };
                    format!("[{badge}{}{flag}]", index + 1)
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .await;
    println!("{line}");
}

async fn render(session: &LiveSession) {
    let text = session.read(render_controller).await;
    print!("{text}");
}

fn render_controller(c: &SessionController) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    match c.mode() {
        SessionMode::NotStarted => {
            let _ = writeln!(out, "Type `start` to begin, or `study` to practise untimed.");
        }
        SessionMode::InProgress => {
            let progress = c.progress();
            let _ = writeln!(
                out,
                "\n[{}] question {}/{}  answered {}/{}  marked {}",
                format_clock(c.time_remaining()),
                c.current_page() + 1,
                c.total_pages(),
                progress.answered,
                progress.total,
                progress.marked,
            );
            for question in c.current_page_questions() {
                let _ = writeln!(out, "{}", question.text());
                let chosen = c.answers().answer(question.id());
                for (index, option) in question.options().iter().enumerate() {
                    let selected = if chosen == Some(option.as_str()) { "x" } else { " " };
                    let _ = writeln!(out, "  [{selected}] {}. {option}", index + 1);
                }
                if c.answers().is_marked(question.id()) {
                    let _ = writeln!(out, "  (marked for review)");
                }
            }
        }
        SessionMode::Study => {
            let progress = c.progress();
            let _ = writeln!(
                out,
                "\n[study] question {}/{}  answered {}/{}",
                c.current_page() + 1,
                c.total_pages(),
                progress.answered,
                progress.total,
            );
            for question in c.current_page_questions() {
                let _ = writeln!(out, "{}", question.text());
                let chosen = c.answers().answer(question.id());
                for (index, option) in question.options().iter().enumerate() {
                    let selected = if chosen == Some(option.as_str()) { "x" } else { " " };
                    let _ = writeln!(out, "  [{selected}] {}. {option}", index + 1);
                }
                if let Some(reveal) = c.study_reveal(question.id()) {
                    let verdict = if reveal.is_correct { "Correct" } else { "Incorrect" };
                    let _ = writeln!(out, "  {verdict}. Answer: {}", reveal.correct_answer);
                    if let Some(explanation) = &reveal.explanation {
                        let _ = writeln!(out, "  {explanation}");
                    }
                }
            }
        }
        SessionMode::Submitted => {
            if let Some(result) = c.result() {
                let report = ResultReport::new(result, &[]);
                let _ = write!(out, "\n{report}");
                let _ = writeln!(out, "{}", report.share_text());
                let _ = writeln!(out, "Type `r` to review answers or `restart` to try again.");
            }
        }
        SessionMode::Review => {
            if let Some(result) = c.result() {
                let review = c.review_items();
                let _ = write!(out, "\n{}", ResultReport::new(result, &review));
            }
        }
    }
    out
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

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
