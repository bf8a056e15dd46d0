#[cfg(target_env = "musl")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod telemetry;

use anyhow::Context;
use clap::Parser;
use ghgrade_core::coordination::rerun_all;
use ghgrade_core::http::{CanvasApiClient, GitHubApiClient, GoogleSheetsClient};
use ghgrade_core::{credentials, Comparator, DueDateConfig, Grader, GraderConfig, LatePolicy, ScoringEngine};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "ghgrade",
    version,
    about = "Grade GitHub Actions results into a Canvas gradebook"
)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Grade every repository of an assignment and post the scores
    Grade(GradeArgs),
    /// Print the base64 token for a service-account JSON file
    Encode(EncodeArgs),
    /// Re-run the graded workflow in every repository of an assignment
    Rerun(RerunArgs),
}

#[derive(clap::Args)]
struct EnvOverrides {
    /// Override an environment value (repeatable)
    #[arg(
        long = "env",
        num_args = 2,
        value_names = ["NAME", "VALUE"],
        action = clap::ArgAction::Append
    )]
    env: Vec<String>,
}

impl EnvOverrides {
    fn pairs(&self) -> Vec<(String, String)> {
        self.env
            .chunks_exact(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect()
    }
}

#[derive(clap::Args)]
struct GradeArgs {
    /// Assignment name; repositories containing it are graded
    assignment: String,

    /// Apply the late rule: due date, time, time zone and multiplier
    #[arg(long, num_args = 4, value_names = ["DATE", "TIME", "TIMEZONE", "MULTIPLIER"])]
    due: Option<Vec<String>>,

    /// Comparison applied to the commit/due difference: le, lt, ge or gt
    #[arg(long, default_value = "le")]
    late_comparator: String,

    /// Workflow name matched against run names
    #[arg(long)]
    workflow: Option<String>,

    /// Local username map (default: username_map.csv)
    #[arg(long)]
    identity_file: Option<PathBuf>,

    /// Output format: text or json
    #[arg(long, default_value = "text")]
    output_format: String,

    #[command(flatten)]
    overrides: EnvOverrides,
}

#[derive(clap::Args)]
struct EncodeArgs {
    /// Service-account credentials JSON file
    file: PathBuf,
}

#[derive(clap::Args)]
struct RerunArgs {
    /// Assignment name; repositories containing it are re-run
    assignment: String,

    /// Workflow name matched against run names
    #[arg(long)]
    workflow: Option<String>,

    /// Output format: text or json
    #[arg(long, default_value = "text")]
    output_format: String,

    #[command(flatten)]
    overrides: EnvOverrides,
}

/// Output format for the CLI
enum OutputFormat {
    /// Full JSON to stdout
    Json,
    /// Human-readable text to stdout
    Text,
}

impl OutputFormat {
    fn parse(value: &str) -> anyhow::Result<Self> {
        match value {
            "json" => Ok(OutputFormat::Json),
            "text" => Ok(OutputFormat::Text),
            other => anyhow::bail!("unknown output format '{}' (expected text or json)", other),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    telemetry::init_tracing(cli.log_json, level);

    let result = match cli.command {
        Commands::Grade(args) => run_grade(args),
        Commands::Encode(args) => run_encode(args),
        Commands::Rerun(args) => run_rerun(args),
    };

    let code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            1
        }
    };
    std::process::exit(code);
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create runtime")
}

fn late_policy(args: &GradeArgs) -> anyhow::Result<Option<LatePolicy>> {
    let comparator: Comparator = args
        .late_comparator
        .parse()
        .context("invalid --late-comparator")?;

    match args.due.as_deref() {
        Some([date, time, timezone, multiplier]) => {
            let due = DueDateConfig::parse(date, time, timezone, multiplier)
                .context("invalid --due")?;
            Ok(Some(LatePolicy::new(due).with_comparator(comparator)))
        }
        Some(other) => anyhow::bail!("--due takes 4 values, got {}", other.len()),
        None => Ok(None),
    }
}

fn run_grade(args: GradeArgs) -> anyhow::Result<i32> {
    let format = OutputFormat::parse(&args.output_format)?;
    let policy = late_policy(&args)?;

    let mut config = GraderConfig::from_env(args.overrides.pairs()).context("configuration")?;
    if let Some(workflow) = args.workflow {
        config.workflow_name = workflow;
    }
    if let Some(path) = args.identity_file {
        config.identity_file = path;
    }

    let github = GitHubApiClient::new(config.github_api_url.clone(), Some(config.github_token.clone()));
    let canvas = CanvasApiClient::new(config.canvas_url.clone(), config.canvas_token()?);
    let sheets = GoogleSheetsClient::new();

    let report = runtime()?.block_on(
        Grader::new(&config, &github, &canvas, &sheets)
            .with_scoring(ScoringEngine::new(policy))
            .run(&args.assignment),
    )
    .with_context(|| format!("grading {} failed", args.assignment))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => println!("{}", report),
    }

    Ok(if report.is_clean() { 0 } else { 2 })
}

fn run_encode(args: EncodeArgs) -> anyhow::Result<i32> {
    let token = credentials::encode_file(&args.file)
        .with_context(|| format!("cannot encode {}", args.file.display()))?;
    println!("{}", token);
    Ok(0)
}

fn run_rerun(args: RerunArgs) -> anyhow::Result<i32> {
    let format = OutputFormat::parse(&args.output_format)?;
    let config = GraderConfig::from_env(args.overrides.pairs()).context("configuration")?;
    let workflow = args.workflow.as_deref().unwrap_or(&config.workflow_name);

    let github = GitHubApiClient::new(config.github_api_url.clone(), Some(config.github_token.clone()));
    let report = runtime()?
        .block_on(rerun_all(&github, &config.org, &args.assignment, workflow))
        .with_context(|| format!("re-running {} failed", args.assignment))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => println!("{}", report),
    }

    Ok(if report.failed() == 0 { 0 } else { 2 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_grade_parses_env_pairs_and_due() {
        let cli = Cli::parse_from([
            "ghgrade",
            "grade",
            "hw1",
            "--env",
            "GH_TOKEN",
            "abc",
            "--env",
            "CANVAS_COURSE_ID",
            "42",
            "--due",
            "2024-01-15",
            "23:59:00",
            "America/Chicago",
            "0.5",
        ]);
        let Commands::Grade(args) = cli.command else {
            panic!("expected grade");
        };
        assert_eq!(
            args.overrides.pairs(),
            vec![
                ("GH_TOKEN".to_string(), "abc".to_string()),
                ("CANVAS_COURSE_ID".to_string(), "42".to_string()),
            ]
        );
        let policy = late_policy(&args).unwrap().unwrap();
        assert_eq!(policy.due.multiplier, 0.5);
        assert_eq!(policy.comparator, Comparator::LessOrEqual);
    }

    #[test]
    fn test_bad_comparator_rejected() {
        let cli = Cli::parse_from(["ghgrade", "grade", "hw1", "--late-comparator", "eq"]);
        let Commands::Grade(args) = cli.command else {
            panic!("expected grade");
        };
        assert!(late_policy(&args).is_err());
    }

    #[test]
    fn test_output_format() {
        assert!(matches!(OutputFormat::parse("json"), Ok(OutputFormat::Json)));
        assert!(OutputFormat::parse("gha").is_err());
    }
}
