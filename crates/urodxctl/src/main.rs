//! urodxctl - differential diagnosis from the command line
//!
//! Scores case files, suggests the next question, or runs an interactive
//! consultation on stdin/stdout.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use tracing::info;
use urodx_engine::{DifferentialEngine, EngineConfig, Gender, PatientContext, RiskFlag, SymptomEvidence};
use urodxctl::case::CaseFile;
use urodxctl::session::Session;
use urodxctl::{config, display, logging};

#[derive(Parser)]
#[command(name = "urodxctl")]
#[command(about = "Urology differential diagnosis engine", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (overrides $URODX_CONFIG and the default locations)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Catalog TOML to use instead of the built-in tables
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a case file and print the posterior and recommendation
    Score {
        /// Case file (JSON with "patient" and "evidence")
        #[arg(long)]
        case: PathBuf,

        /// Human-readable output instead of JSON
        #[arg(long)]
        text: bool,
    },

    /// Rank the next questions for a case file
    Next {
        #[arg(long)]
        case: PathBuf,

        #[arg(long)]
        text: bool,
    },

    /// Interactive consultation: answer questions until the engine is confident
    Consult {
        #[arg(long)]
        age: Option<u32>,

        #[arg(long, value_enum, default_value_t = GenderArg::Unknown)]
        gender: GenderArg,

        /// History of kidney stones
        #[arg(long)]
        previous_stones: bool,

        /// Family history of prostate cancer
        #[arg(long)]
        family_history: bool,

        /// Print the final outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the active catalog as TOML
    Catalog,

    /// Print the resolved config and its source
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum GenderArg {
    Female,
    Male,
    Unknown,
}

impl From<GenderArg> for Gender {
    fn from(arg: GenderArg) -> Self {
        match arg {
            GenderArg::Female => Gender::Female,
            GenderArg::Male => Gender::Male,
            GenderArg::Unknown => Gender::Unknown,
        }
    }
}

fn build_engine(cli: &Cli, engine_config: &EngineConfig) -> Result<DifferentialEngine> {
    let catalog = config::load_catalog(cli.catalog.as_deref())?;
    info!(catalog = %catalog.name, conditions = catalog.len(), "catalog loaded");
    DifferentialEngine::new(catalog, engine_config.clone()).context("Catalog does not form a consistent graph")
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn score(engine: &DifferentialEngine, case_path: &Path, text: bool) -> Result<()> {
    let case = CaseFile::load(case_path)?;
    let result = engine.score(&case.evidence, &case.patient);
    info!(
        top = %result.recommendation.primary_diagnosis,
        probability = result.recommendation.probability,
        "case scored"
    );
    if text {
        print!("{}", display::render_score(&result, io::stdout().is_terminal()));
        Ok(())
    } else {
        print_json(&result)
    }
}

fn next(engine: &DifferentialEngine, case_path: &Path, text: bool) -> Result<()> {
    let case = CaseFile::load(case_path)?;
    let plan = engine.plan_questions(&case.evidence, &case.patient);
    info!(suggestions = plan.suggestions.len(), entropy = plan.current_entropy, "questions planned");
    if text {
        print!("{}", display::render_plan(&plan));
        Ok(())
    } else {
        print_json(&plan)
    }
}

fn consult(engine: &DifferentialEngine, patient: PatientContext, json: bool) -> Result<()> {
    info!(age = ?patient.age, gender = patient.gender.as_str(), "consultation started");
    let session = Session::new(engine, patient, SymptomEvidence::new());
    let stdin = io::stdin();
    let outcome = session.run(stdin.lock(), io::stdout())?;
    if json {
        print_json(&outcome)
    } else {
        print!("{}", display::render_outcome(&outcome, io::stdout().is_terminal()));
        Ok(())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (engine_config, source) = config::load_config(cli.config.as_deref())?;
    logging::init(&engine_config.log.level);
    match &source {
        Some(path) => info!(path = %path.display(), "config loaded"),
        None => info!("using default config"),
    }

    match &cli.command {
        Commands::Score { case, text } => score(&build_engine(&cli, &engine_config)?, case, *text),
        Commands::Next { case, text } => next(&build_engine(&cli, &engine_config)?, case, *text),
        Commands::Consult {
            age,
            gender,
            previous_stones,
            family_history,
            json,
        } => {
            let mut patient = PatientContext {
                age: *age,
                gender: (*gender).into(),
                ..PatientContext::default()
            };
            if *previous_stones {
                patient = patient.with_risk(RiskFlag::PreviousKidneyStones);
            }
            if *family_history {
                patient = patient.with_risk(RiskFlag::FamilyHistoryProstateCancer);
            }
            consult(&build_engine(&cli, &engine_config)?, patient, *json)
        }
        Commands::Catalog => {
            let catalog = config::load_catalog(cli.catalog.as_deref())?;
            print!("{}", catalog.to_toml_string()?);
            Ok(())
        }
        Commands::Config => {
            match source {
                Some(path) => println!("# source: {}", path.display()),
                None => println!("# source: defaults"),
            }
            print!("{}", engine_config.to_toml_string()?);
            Ok(())
        }
    }
}
