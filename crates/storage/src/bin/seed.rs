use std::fmt;
use std::sync::Arc;

use quiz_core::model::{AnswerKey, QuestionCount};
use storage::PersistenceGateway;
use storage::repository::{QuestionRecord, Storage};

#[derive(Debug, Clone)]
struct Args {
    db_url: Option<String>,
    out: String,
    questions: u32,
    count: Option<QuestionCount>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidQuestions { raw: String },
    InvalidCount { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidQuestions { raw } => write!(f, "invalid --questions value: {raw}"),
            ArgsError::InvalidCount { raw } => {
                write!(f, "invalid --count value (expected 10, 20, 30, 40 or 50): {raw}")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL").ok();
        let mut out =
            std::env::var("QUIZ_BANK_PATH").unwrap_or_else(|_| "quizquestion.json".into());
        let mut questions = 60;
        let mut count = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = Some(value);
                }
                "--out" => {
                    out = require_value(&mut args, "--out")?;
                }
                "--questions" => {
                    let value = require_value(&mut args, "--questions")?;
                    questions = value
                        .parse::<u32>()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or_else(|| ArgsError::InvalidQuestions { raw: value.clone() })?;
                }
                "--count" => {
                    let value = require_value(&mut args, "--count")?;
                    let parsed = value
                        .parse::<u32>()
                        .ok()
                        .and_then(|n| QuestionCount::new(n).ok())
                        .ok_or_else(|| ArgsError::InvalidCount { raw: value.clone() })?;
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
            out,
            questions,
            count,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --out <path>              Question bank file to write (default: quizquestion.json)");
    eprintln!("  --questions <n>           Number of generated questions (default: 60)");
    eprintln!("  --db <sqlite_url>         Also store the configured count in this database");
    eprintln!("  --count <n>               Configured question count (10, 20, 30, 40, 50)");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  QUIZ_DB_URL, QUIZ_BANK_PATH");
}

/// Arithmetic question whose correct option rotates through the keys.
fn sample_question(i: u32) -> QuestionRecord {
    let a = (i * 7) % 20 + 1;
    let b = (i * 3) % 15 + 1;
    let sum = a + b;
    let correct = AnswerKey::ALL[(i % 4) as usize];

    let distractors = [sum + 1, sum + 2, sum.saturating_sub(1).max(sum + 3)];
    let mut options = [String::new(), String::new(), String::new(), String::new()];
    let mut next = distractors.iter();
    for key in AnswerKey::ALL {
        let value = if key == correct {
            sum
        } else {
            next.next().copied().unwrap_or(sum + 4)
        };
        options[key.index()] = value.to_string();
    }
    let [opt_a, opt_b, opt_c, opt_d] = options;

    QuestionRecord {
        question: format!("What is {a} + {b}?"),
        a: opt_a,
        b: opt_b,
        c: opt_c,
        d: opt_d,
        answer: correct.as_str().to_string(),
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let records: Vec<QuestionRecord> = (0..args.questions).map(sample_question).collect();
    let json = serde_json::to_string_pretty(&records)?;
    tokio::fs::write(&args.out, json).await?;
    println!("Wrote {} questions to {}", records.len(), args.out);

    if let (Some(db_url), Some(count)) = (args.db_url.as_deref(), args.count) {
        let storage = Storage::sqlite(db_url).await?;
        PersistenceGateway::new(Arc::clone(&storage.store))
            .set_question_count(count)
            .await?;
        println!("Configured {} questions per session in {db_url}", count.get());
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
