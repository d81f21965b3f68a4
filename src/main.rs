use anyhow::Context;
use clap::Parser;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod batch;
mod calories;
mod cli;
mod config;
mod errors;
mod generate;
mod mail;
mod prompt;
mod provider;
mod store;
mod ux;
mod validate;
mod wire;

use cli::{Command, DailyArgs, GenerateArgs};
use config::Config;
use generate::GenerationService;
use store::{FileStore, Store};
use wire::{BatchMode, BodyMetrics, OnDemandRequest};

fn init_tracing(debug: bool) {
    let default = if debug { "aithos=debug" } else { "aithos=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn apply_cli_overrides(cfg: &mut Config, args: &cli::Args) {
    if let Some(p) = args.provider {
        cfg.provider = p;
    }
    if let Some(m) = &args.model {
        cfg.model = m.clone();
    }
    if let Some(t) = args.timeout_secs {
        cfg.timeout_secs = t;
    }
}

fn on_demand_request(g: GenerateArgs) -> OnDemandRequest {
    let user_profile = g.has_metrics().then(|| BodyMetrics {
        weight_kg: g.weight_kg,
        height_cm: g.height_cm,
        birth_year: g.birth_year,
        gender: g.gender.clone(),
    });
    OnDemandRequest {
        target_muscles: g.muscles,
        workout_type: g.workout_type,
        duration_minutes: g.duration,
        user_goal: g.goal,
        equipment: g.equipment,
        user_profile,
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    init_tracing(args.debug);

    let mut cfg = Config::load(args.config.as_deref()).context("loading configuration")?;
    apply_cli_overrides(&mut cfg, &args);
    tracing::debug!(provider = ?cfg.provider, model = %cfg.model, "configuration loaded");

    let store = FileStore::open(Path::new(&args.data)).with_context(|| format!("opening data file {}", args.data))?;
    let provider = provider::make_provider(&cfg)?;
    let generator = GenerationService::new(provider, cfg.adaptive_history);

    match args.command {
        Command::Generate(g) => {
            let req = on_demand_request(g);
            let pb = ux::spinner("Generating workout", !args.json);
            let res = generator.generate_on_demand(&req).await;
            pb.finish_and_clear();
            let workout = res?;
            if args.json {
                print_json(&workout)?;
            } else {
                ux::show_workout(&workout);
            }
        }
        Command::Suggest { user } => {
            let pb = ux::spinner("Building your suggestion", !args.json);
            let res = generator.generate_adaptive(&store, &user).await;
            pb.finish_and_clear();
            let workout = res?;
            if args.json {
                print_json(&workout)?;
            } else {
                ux::show_workout(&workout);
            }
        }
        Command::Daily(d) => run_daily(d, &cfg, &store, &generator, args.json).await?,
    }

    Ok(())
}

async fn run_daily(
    d: DailyArgs,
    cfg: &Config,
    store: &dyn Store,
    generator: &GenerationService,
    json: bool,
) -> anyhow::Result<()> {
    let mode = match (d.test_user, d.test_email) {
        (Some(user_id), Some(test_email)) => BatchMode::Test { user_id, test_email },
        _ => BatchMode::Production,
    };

    let run = Uuid::new_v4();
    let mailer: mail::DynMailer = match &d.outbox {
        Some(dir) => {
            let outbox = mail::OutboxMailer::new(Path::new(dir), run);
            tracing::info!(dir = %outbox.dir().display(), "writing emails to outbox");
            Box::new(outbox)
        }
        None => Box::new(mail::ResendMailer::new(
            &cfg.mail,
            cfg.secrets.resend_api_key.clone(),
            Duration::from_secs(cfg.timeout_secs),
        )?),
    };

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    let signal = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling daily run");
            on_signal.cancel();
        }
    });

    let job = batch::DailyJob::new(store, generator, mailer.as_ref(), cfg);
    let report = job.run(&mode, cancel).await;
    signal.abort();
    let report = report?;

    if json {
        print_json(&report)?;
    } else {
        ux::print_batch_dashboard(&report);
    }
    Ok(())
}
