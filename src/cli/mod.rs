use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[value(alias = "open-ai", alias = "openai")]
    OpenAI,
    #[value(alias = "anthropic")]
    Anthropic,
    #[value(alias = "ollama")]
    Ollama,
}

#[derive(Parser, Debug)]
#[command(name = "aithos", version, about = "AI workout generation and daily workout emails")]
pub struct Args {
    /// JSON data file holding profiles, accounts, equipment, history and the notification log.
    #[arg(long, global = true, default_value = "aithos-data.json")]
    pub data: String,

    #[arg(long, global = true, value_enum)]
    pub provider: Option<ProviderKind>,

    #[arg(long, global = true)]
    pub model: Option<String>,

    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Print machine-readable JSON instead of the formatted view.
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,

    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a workout for explicit parameters.
    Generate(GenerateArgs),
    /// Suggest a workout from a user's goal and recent feedback.
    Suggest {
        #[arg(long)]
        user: String,
    },
    /// Email today's suggested workout to every subscribed user.
    Daily(DailyArgs),
}

#[derive(ClapArgs, Debug)]
pub struct GenerateArgs {
    #[arg(long, value_delimiter = ',', required = true)]
    pub muscles: Vec<String>,

    #[arg(long = "type")]
    pub workout_type: String,

    /// Minutes.
    #[arg(long)]
    pub duration: u32,

    #[arg(long)]
    pub goal: Option<String>,

    #[arg(long, value_delimiter = ',')]
    pub equipment: Vec<String>,

    #[arg(long)]
    pub weight_kg: Option<f64>,

    #[arg(long)]
    pub height_cm: Option<f64>,

    #[arg(long)]
    pub birth_year: Option<i32>,

    #[arg(long)]
    pub gender: Option<String>,
}

#[derive(ClapArgs, Debug)]
pub struct DailyArgs {
    /// Run for this single user only; nothing is logged.
    #[arg(long, requires = "test_email")]
    pub test_user: Option<String>,

    #[arg(long, requires = "test_user")]
    pub test_email: Option<String>,

    /// Write rendered emails here instead of sending them.
    #[arg(long)]
    pub outbox: Option<String>,
}

impl GenerateArgs {
    pub fn has_metrics(&self) -> bool {
        self.weight_kg.is_some() || self.height_cm.is_some() || self.birth_year.is_some() || self.gender.is_some()
    }
}
