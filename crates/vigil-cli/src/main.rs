//! CLI entry point for the Vigil assessment platform.
//!
//! Drives the full lifecycle against a local JSON data directory:
//! create an assessment from a question bank, invite candidates, run a
//! simulated proctored session against an invite link, grade archived
//! submissions, and aggregate per-assessment analytics.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing_subscriber::{fmt, EnvFilter};

use vigil_assess::analytics::summarize;
use vigil_assess::bank::QuestionBank;
use vigil_assess::builder::AssessmentBuilder;
use vigil_assess::grading::{grade, GradeReport};
use vigil_assess::invite::{invite_candidates, send_invitations, LoggingNotifier};
use vigil_core::config::{load_engine_config, EngineConfig};
use vigil_core::types::{AssessmentId, OptionKey, SessionId, SessionStatus};
use vigil_session::detector::SimulatedDetector;
use vigil_session::media::SimulatedMedia;
use vigil_session::scheduler::ManualScheduler;
use vigil_session::signals::{EnvironmentEvent, Shortcut, SimulatedSignals};
use vigil_session::SessionEngine;
use vigil_store::repo::{AssessmentRepo, JsonAssessmentRepo};
use vigil_store::store::{JsonSubmissionStore, SubmissionQuery, SubmissionStore};

#[derive(Parser)]
#[command(name = "vigil")]
#[command(about = "Proctored assessment engine for the Vigil platform")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Data directory holding assessments, candidates, and submissions.
    #[arg(long, default_value = "./data", global = true)]
    data_dir: String,

    /// Config file prefix (default: vigil).
    #[arg(short, long, default_value = "vigil", global = true)]
    config: String,
}

#[derive(Subcommand)]
enum Command {
    /// Create an assessment by drawing random questions from a bank.
    Create {
        /// Assessment title.
        #[arg(long)]
        title: String,
        /// Path to a question bank JSON file.
        #[arg(long)]
        bank: String,
        /// Topic draw as topic=count; repeatable.
        #[arg(long = "topic")]
        topics: Vec<String>,
        /// Time limit in minutes.
        #[arg(long, default_value_t = 45)]
        duration_mins: u64,
        /// Optional RFC 3339 deadline.
        #[arg(long)]
        deadline: Option<String>,
    },
    /// Invite candidates (email:name pairs; repeatable) to an assessment.
    Invite {
        /// Assessment ID.
        #[arg(long)]
        assessment: String,
        /// Candidate as email:name; repeatable.
        #[arg(long = "candidate")]
        candidates: Vec<String>,
    },
    /// Run a simulated proctored session for an invite link.
    Simulate {
        /// Invite link of the candidate.
        #[arg(long)]
        link: String,
        /// Probability the simulated candidate answers each question.
        #[arg(long, default_value_t = 0.85)]
        answer_rate: f64,
        /// Virtual seconds the candidate spends per question.
        #[arg(long, default_value_t = 20)]
        think_secs: u64,
    },
    /// Grade one archived submission.
    Grade {
        /// Session ID of the submission.
        #[arg(long)]
        session: String,
    },
    /// Aggregate analytics across an assessment's submissions.
    Analytics {
        /// Assessment ID.
        #[arg(long)]
        assessment: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let engine_config = load_engine_config(&cli.config)?;
    let data_dir = PathBuf::from(&cli.data_dir);

    match cli.command {
        Command::Create {
            ref title,
            ref bank,
            ref topics,
            duration_mins,
            ref deadline,
        } => create_assessment(&data_dir, title, bank, topics, duration_mins, deadline.as_deref()),
        Command::Invite {
            ref assessment,
            ref candidates,
        } => invite(&data_dir, assessment, candidates),
        Command::Simulate {
            ref link,
            answer_rate,
            think_secs,
        } => simulate(&data_dir, engine_config, link, answer_rate, think_secs).await,
        Command::Grade { ref session } => grade_submission(&data_dir, &engine_config, session),
        Command::Analytics { ref assessment } => {
            assessment_analytics(&data_dir, &engine_config, assessment)
        }
    }
}

/// Submissions are archived under the configured directory, resolved
/// relative to the data directory.
fn open_submission_store(
    data_dir: &Path,
    config: &EngineConfig,
) -> anyhow::Result<JsonSubmissionStore> {
    Ok(JsonSubmissionStore::new(data_dir.join(&config.archive_dir))?)
}

fn create_assessment(
    data_dir: &Path,
    title: &str,
    bank_path: &str,
    topics: &[String],
    duration_mins: u64,
    deadline: Option<&str>,
) -> anyhow::Result<()> {
    let bank = QuestionBank::load(bank_path)?;
    let mut builder = AssessmentBuilder::new(title).duration_seconds(duration_mins * 60);

    if let Some(raw) = deadline {
        let parsed = chrono::DateTime::parse_from_rfc3339(raw)?;
        builder = builder.deadline(parsed.with_timezone(&chrono::Utc));
    }

    for draw in topics {
        let (topic, count) = parse_topic_arg(draw)?;
        builder = builder.random_from_bank(&bank, topic, count)?;
    }

    let assessment = builder.build()?;
    let repo = JsonAssessmentRepo::new(data_dir)?;
    repo.save_assessment(&assessment)?;

    println!("{}", assessment.assessment_id);
    Ok(())
}

fn invite(data_dir: &Path, assessment: &str, candidates: &[String]) -> anyhow::Result<()> {
    if candidates.is_empty() {
        anyhow::bail!("At least one --candidate email:name is required");
    }

    let repo = JsonAssessmentRepo::new(data_dir)?;
    let assessment = repo.assessment_by_id(parse_assessment_id(assessment)?)?;

    let entries: Vec<(String, String)> = candidates
        .iter()
        .map(|raw| parse_candidate_arg(raw))
        .collect::<anyhow::Result<_>>()?;

    let mut invited = invite_candidates(&assessment, &entries);
    let sent = send_invitations(&LoggingNotifier, &mut invited);

    for candidate in &invited {
        repo.save_candidate(candidate)?;
        println!("{}\t{}", candidate.email, candidate.invite_link);
    }
    tracing::info!(invited = invited.len(), sent, "Invitations processed");
    Ok(())
}

/// Run a whole proctored session on virtual time: a simulated candidate
/// works through the questions while the simulated detector and
/// scripted environment noise feed the integrity monitor.
async fn simulate(
    data_dir: &Path,
    engine_config: EngineConfig,
    link: &str,
    answer_rate: f64,
    think_secs: u64,
) -> anyhow::Result<()> {
    let repo = JsonAssessmentRepo::new(data_dir)?;
    let candidate = repo.load_candidate(link)?;
    let assessment = repo.load_assessment(link)?;

    let store = Arc::new(open_submission_store(data_dir, &engine_config)?);
    let scheduler = Arc::new(ManualScheduler::new());
    let signals = Arc::new(SimulatedSignals::new());

    let engine = SessionEngine::new(
        &assessment,
        candidate.candidate_id,
        scheduler.clone(),
        Arc::new(SimulatedDetector),
        Arc::new(SimulatedMedia::granted()),
        signals.clone(),
        store.clone(),
    )
    .with_config(engine_config);

    engine.start().await?;
    tracing::info!(
        session_id = %engine.session_id(),
        candidate = %candidate.email,
        questions = assessment.questions.len(),
        "Simulated session started"
    );

    let mut rng = rand::thread_rng();
    let options = [OptionKey::A, OptionKey::B, OptionKey::C, OptionKey::D];

    for question in &assessment.questions {
        scheduler.advance(Duration::from_secs(think_secs));
        if engine.status() != SessionStatus::InProgress {
            break;
        }

        if rng.gen::<f64>() < answer_rate {
            let pick = options.choose(&mut rng).copied().unwrap_or(OptionKey::A);
            engine.set_answer(question.question_id, pick)?;
        }

        // Occasional candidate misbehavior for the guard to catch.
        if rng.gen::<f64>() < 0.1 {
            signals.emit(EnvironmentEvent::BlockedShortcut(Shortcut::Copy));
        }
        if rng.gen::<f64>() < 0.05 {
            signals.set_hidden(true);
            scheduler.advance(Duration::from_secs(2));
            signals.set_hidden(false);
        }
    }

    let record = match engine.status() {
        SessionStatus::InProgress => engine.submit()?.record,
        _ => engine
            .record()
            .ok_or_else(|| anyhow::anyhow!("session ended without a record"))?,
    };

    let report = grade(&assessment, &record);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn grade_submission(data_dir: &Path, config: &EngineConfig, session: &str) -> anyhow::Result<()> {
    let session_id = SessionId(uuid::Uuid::parse_str(session)?);
    let store = open_submission_store(data_dir, config)?;
    let record = store.get(session_id)?;

    let repo = JsonAssessmentRepo::new(data_dir)?;
    let assessment = repo.assessment_by_id(record.assessment_id)?;

    let report = grade(&assessment, &record);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn assessment_analytics(
    data_dir: &Path,
    config: &EngineConfig,
    assessment: &str,
) -> anyhow::Result<()> {
    let assessment_id = parse_assessment_id(assessment)?;
    let repo = JsonAssessmentRepo::new(data_dir)?;
    let assessment = repo.assessment_by_id(assessment_id)?;

    let store = open_submission_store(data_dir, config)?;
    let records = store.list(&SubmissionQuery {
        assessment_id: Some(assessment_id),
        ..Default::default()
    })?;

    let reports: Vec<GradeReport> = records.iter().map(|r| grade(&assessment, r)).collect();
    println!("{}", serde_json::to_string_pretty(&summarize(&reports))?);
    Ok(())
}

fn parse_assessment_id(raw: &str) -> anyhow::Result<AssessmentId> {
    Ok(AssessmentId(uuid::Uuid::parse_str(raw)?))
}

fn parse_topic_arg(raw: &str) -> anyhow::Result<(&str, usize)> {
    let (topic, count) = raw
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("Invalid topic spec: {raw}. Expected topic=count"))?;
    Ok((topic, count.parse()?))
}

fn parse_candidate_arg(raw: &str) -> anyhow::Result<(String, String)> {
    let (email, name) = raw
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("Invalid candidate spec: {raw}. Expected email:name"))?;
    Ok((email.to_string(), name.to_string()))
}
