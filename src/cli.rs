use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "nutriexpert",
    version,
    about = "Nutrition expert system with a rule-based inference engine"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config.yaml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override SQLite data directory
    #[arg(short, long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the inference engine over a patient's facts
    Infer {
        /// Facts JSON file (reads stdin when omitted)
        #[arg(short, long)]
        facts: Option<PathBuf>,
    },
    /// Manage the rule base
    Rules {
        #[command(subcommand)]
        action: RulesCommand,
    },
    /// Estimate daily energy expenditure (Mifflin-St Jeor)
    Tdee {
        #[arg(long)]
        sex: String,
        #[arg(long)]
        age: u32,
        /// Height in centimeters
        #[arg(long)]
        height: f64,
        /// Weight in kilograms
        #[arg(long)]
        weight: f64,
        #[arg(long, default_value = "sedentary")]
        activity: String,
    },
    /// Re-run interactive setup
    Init,
    /// Validate config and the stored rule base
    Check,
}

#[derive(Subcommand)]
pub enum RulesCommand {
    /// List all rules in agenda order
    List,
    /// Show a single rule
    Show { id: String },
    /// Add a rule from a JSON file
    Add { file: PathBuf },
    /// Replace an existing rule with the contents of a JSON file
    Update { id: String, file: PathBuf },
    /// Delete a rule
    Delete { id: String },
}
