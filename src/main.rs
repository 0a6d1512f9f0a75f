mod cli;
mod config;
mod db;
mod error;
mod logic;
mod models;

use anyhow::{bail, Context};
use clap::Parser;
use cli::{Cli, Commands, RulesCommand};
use config::Config;
use db::{Database, RuleRepository};
use logic::{estimate_tdee, InferenceEngine};
use models::{Facts, Rule, Sex};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let command = match cli.command {
        Commands::Init => {
            init_logging(cli.verbose, "warn");
            Config::setup_interactive().context("Interactive setup failed")?;
            return Ok(());
        }
        command => command,
    };

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    init_logging(cli.verbose, &config.logging.level);

    match command {
        Commands::Infer { facts } => {
            let facts = read_facts(facts.as_deref())?;
            let db = open_database(&config, cli.data_dir.as_ref())?;
            let rules = db.list_all_ordered()?;
            let result = logic::infer(&facts, &rules);
            print_json(&result)?;
        }
        Commands::Rules { action } => {
            let db = open_database(&config, cli.data_dir.as_ref())?;
            run_rules_command(&db, action)?;
        }
        Commands::Tdee {
            sex,
            age,
            height,
            weight,
            activity,
        } => {
            let sex = match Sex::from_str(&sex.to_uppercase()) {
                Some(s) => s,
                None => bail!("sex must be M or F (got '{}')", sex),
            };
            let tdee = estimate_tdee(sex, age, height, weight, &activity);
            println!("{:.1}", tdee);
        }
        Commands::Check => {
            run_check(&config, cli.data_dir.as_ref())?;
        }
        Commands::Init => {}
    }

    Ok(())
}

fn init_logging(verbose: u8, configured_level: &str) {
    let level = match verbose {
        0 => configured_level,
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();
}

fn open_database(config: &Config, data_dir: Option<&PathBuf>) -> anyhow::Result<Database> {
    let path = config.db_path(data_dir)?;
    let db = Database::open(&path)
        .with_context(|| format!("Failed to open database at {}", path.display()))?;

    if config.rules.seed_defaults {
        db.seed_default_rules()?;
    }

    Ok(db)
}

fn read_facts(path: Option<&Path>) -> anyhow::Result<Facts> {
    let json = match path {
        Some(p) => std::fs::read_to_string(p)
            .with_context(|| format!("Failed to read facts from {}", p.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read facts from stdin")?;
            buf
        }
    };
    Ok(Facts::from_json(&json)?)
}

fn read_rule(path: &Path) -> anyhow::Result<Rule> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read rule from {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Malformed rule in {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_rules_command(db: &Database, action: RulesCommand) -> anyhow::Result<()> {
    match action {
        RulesCommand::List => {
            print_json(&db.list_all_ordered()?)?;
        }
        RulesCommand::Show { id } => match db.get(&id)? {
            Some(rule) => print_json(&rule)?,
            None => bail!("Rule '{}' not found", id),
        },
        RulesCommand::Add { file } => {
            let rule = read_rule(&file)?;
            db.insert(&rule)?;
            println!("Added rule {}", rule.id);
        }
        RulesCommand::Update { id, file } => {
            let rule = read_rule(&file)?;
            db.replace(&id, &rule)?;
            println!("Updated rule {}", id);
        }
        RulesCommand::Delete { id } => {
            db.delete(&id)?;
            println!("Deleted rule {}", id);
        }
    }
    Ok(())
}

fn run_check(config: &Config, data_dir: Option<&PathBuf>) -> anyhow::Result<()> {
    println!("Configuration: OK");

    let db = open_database(config, data_dir)?;
    println!("Database: {}", db.path().display());

    let engine = InferenceEngine::new(db.list_all_ordered()?);
    let loaded = engine.agenda().len() as i64;
    let stored = db.count_rules()?;
    println!("Rules: {} loaded", loaded);
    if loaded < stored {
        println!("  {} stored rule(s) could not be decoded", stored - loaded);
    }

    let mut problems = 0;
    for rule in engine.agenda() {
        println!("  [{:>4}] {} {}", rule.priority, rule.id, rule.name);
        let terms = rule.unknown_terms();
        if !terms.is_empty() {
            problems += 1;
            println!("         unknown {}", terms.join(", "));
        }
    }
    if problems == 0 {
        println!("  All conditions use known facts and operators");
    }

    Ok(())
}
