use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use cloudopt_core::agent::OptimizerAgent;
use cloudopt_core::config::{ConfigFile, Settings};
use cloudopt_core::domain::cost::DateRange;
use cloudopt_core::domain::result::OrgContext;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod render;

#[derive(Debug, Parser)]
#[command(name = "cloudopt_worker")]
struct Cli {
    /// Output format for results.
    #[arg(long, value_enum, default_value_t = Output::Table, global = true)]
    output: Output,

    /// JSON config file. Environment variables take precedence over it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Output {
    Table,
    Json,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch normalised cost data for one provider.
    Analyze {
        #[arg(long)]
        provider: String,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// Run one strategy against one provider.
    Optimize {
        #[arg(long)]
        provider: String,

        #[arg(long, default_value = cloudopt_core::strategy::STRATEGY_NAME)]
        strategy: String,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// Optimize every provider (or just one) with the first registered strategy.
    Recommendations {
        #[arg(long)]
        provider: Option<String>,
    },

    /// Run one proactive cycle: recommendations, summary, notifications.
    Cycle(CycleArgs),

    /// Run proactive cycles periodically until Ctrl-C.
    Schedule {
        #[arg(long, default_value_t = 1440)]
        interval_minutes: u64,

        #[command(flatten)]
        cycle: CycleArgs,
    },

    /// Manage the config file.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Write the default config template.
    Init {
        #[arg(long, default_value = "config.json")]
        output: PathBuf,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Args)]
struct RangeArgs {
    /// Inclusive start date (YYYY-MM-DD).
    #[arg(long, requires = "end_date")]
    start_date: Option<String>,

    /// Inclusive end date (YYYY-MM-DD).
    #[arg(long, requires = "start_date")]
    end_date: Option<String>,
}

impl RangeArgs {
    fn resolve(&self) -> anyhow::Result<Option<DateRange>> {
        match (self.start_date.as_deref(), self.end_date.as_deref()) {
            (Some(start), Some(end)) => Ok(Some(DateRange::parse(start, end)?)),
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Clone, Args)]
struct CycleArgs {
    #[arg(long)]
    provider: Option<String>,

    /// Notifier to deliver to; repeat for several. Defaults to all.
    #[arg(long = "channel")]
    channels: Vec<String>,

    /// Organisation name passed to the summarizer. Defaults to ORG_NAME.
    #[arg(long)]
    org: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::from_env()?,
    };
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    if let Command::Config {
        action: ConfigCommand::Init { output, force },
    } = &cli.command
    {
        return write_config_template(output, *force);
    }

    let agent = cloudopt_core::bootstrap::default_agent(&settings)?;

    let res = run(&agent, cli, settings.org_name()).await;
    if let Err(err) = &res {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %err, "worker run failed");
    }
    res
}

async fn run(agent: &OptimizerAgent, cli: Cli, default_org: &str) -> anyhow::Result<()> {
    let output = cli.output;
    match cli.command {
        Command::Analyze { provider, range } => {
            let snapshot = agent.analyze_costs(&provider, range.resolve()?).await?;
            emit(output, &snapshot, render::snapshot_table)
        }
        Command::Optimize {
            provider,
            strategy,
            range,
        } => {
            let result = agent.optimize(&provider, &strategy, range.resolve()?).await?;
            emit(output, &result, |r| render::results_table(std::slice::from_ref(r)))
        }
        Command::Recommendations { provider } => {
            let results = agent.get_recommendations(provider.as_deref()).await;
            emit(output, &results, |r| render::results_table(r))
        }
        Command::Cycle(args) => {
            let outcome = run_cycle(agent, &args, default_org).await;
            emit(output, &outcome, render::outcome_table)
        }
        Command::Schedule {
            interval_minutes,
            cycle,
        } => schedule(agent, interval_minutes, &cycle, default_org, output).await,
        Command::Config {
            action: ConfigCommand::Init { output, force },
        } => write_config_template(&output, force),
    }
}

async fn run_cycle(
    agent: &OptimizerAgent,
    args: &CycleArgs,
    default_org: &str,
) -> cloudopt_core::domain::result::ProactiveCycleOutcome {
    let org = OrgContext::named(args.org.as_deref().unwrap_or(default_org));
    agent
        .run_proactive_cycle(args.provider.as_deref(), Some(args.channels.as_slice()), Some(&org))
        .await
}

async fn schedule(
    agent: &OptimizerAgent,
    interval_minutes: u64,
    args: &CycleArgs,
    default_org: &str,
    output: Output,
) -> anyhow::Result<()> {
    let period = tick_period(interval_minutes)?;
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    tracing::info!(interval_minutes, "proactive scheduler started");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let outcome = run_cycle(agent, args, default_org).await;
                tracing::info!(count = outcome.count, "scheduled cycle complete");
                if let Err(err) = emit(output, &outcome, render::outcome_table) {
                    tracing::warn!(error = %err, "failed to print cycle outcome");
                }
            }
            res = tokio::signal::ctrl_c() => {
                res.context("failed to listen for ctrl-c")?;
                tracing::info!("proactive scheduler stopping");
                return Ok(());
            }
        }
    }
}

fn tick_period(interval_minutes: u64) -> anyhow::Result<Duration> {
    anyhow::ensure!(interval_minutes > 0, "--interval-minutes must be positive");
    let secs = interval_minutes
        .checked_mul(60)
        .with_context(|| format!("--interval-minutes {interval_minutes} is too large"))?;
    Ok(Duration::from_secs(secs))
}

fn write_config_template(path: &Path, force: bool) -> anyhow::Result<()> {
    anyhow::ensure!(
        force || !path.exists(),
        "{} already exists (use --force to overwrite)",
        path.display()
    );
    std::fs::write(path, ConfigFile::template_json()?)
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "config template written");
    println!("Wrote config template to {}", path.display());
    Ok(())
}

fn emit<T: serde::Serialize + ?Sized>(
    output: Output,
    value: &T,
    table: impl FnOnce(&T) -> String,
) -> anyhow::Result<()> {
    match output {
        Output::Json => {
            let json = serde_json::to_string_pretty(value).context("failed to encode output")?;
            println!("{json}");
        }
        Output::Table => println!("{}", table(value)),
    }
    Ok(())
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cycle_channels_and_global_output() {
        let cli = Cli::try_parse_from([
            "cloudopt_worker",
            "cycle",
            "--channel",
            "slack",
            "--channel",
            "log",
            "--output",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.output, Output::Json);
        let Command::Cycle(args) = cli.command else {
            panic!("expected cycle");
        };
        assert_eq!(args.channels, vec!["slack", "log"]);
        assert!(args.provider.is_none());
    }

    #[test]
    fn optimize_defaults_to_cost_strategy() {
        let cli =
            Cli::try_parse_from(["cloudopt_worker", "optimize", "--provider", "aws"]).unwrap();
        let Command::Optimize { strategy, range, .. } = cli.command else {
            panic!("expected optimize");
        };
        assert_eq!(strategy, "cost_optimization");
        assert!(range.resolve().unwrap().is_none());
    }

    #[test]
    fn date_range_needs_both_ends() {
        assert!(Cli::try_parse_from([
            "cloudopt_worker",
            "analyze",
            "--provider",
            "aws",
            "--start-date",
            "2026-01-01",
        ])
        .is_err());

        let cli = Cli::try_parse_from([
            "cloudopt_worker",
            "analyze",
            "--provider",
            "aws",
            "--start-date",
            "2026-02-01",
            "--end-date",
            "2026-01-01",
        ])
        .unwrap();
        let Command::Analyze { range, .. } = cli.command else {
            panic!("expected analyze");
        };
        assert!(range.resolve().is_err());
    }

    #[test]
    fn schedule_defaults_to_daily() {
        let cli = Cli::try_parse_from(["cloudopt_worker", "schedule"]).unwrap();
        let Command::Schedule { interval_minutes, cycle } = cli.command else {
            panic!("expected schedule");
        };
        assert_eq!(interval_minutes, 1440);
        assert!(cycle.channels.is_empty());
    }

    #[test]
    fn tick_period_rejects_zero_and_overflow() {
        assert_eq!(tick_period(90).unwrap(), Duration::from_secs(5400));
        assert!(tick_period(0).is_err());
        let err = tick_period(u64::MAX).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from([
            "cloudopt_worker",
            "recommendations",
            "--config",
            "prod.json",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("prod.json")));
    }

    #[test]
    fn config_init_defaults_to_config_json() {
        let cli = Cli::try_parse_from(["cloudopt_worker", "config", "init"]).unwrap();
        let Command::Config {
            action: ConfigCommand::Init { output, force },
        } = cli.command
        else {
            panic!("expected config init");
        };
        assert_eq!(output, PathBuf::from("config.json"));
        assert!(!force);
    }

    #[test]
    fn config_init_writes_a_loadable_template() {
        let dir = std::env::temp_dir()
            .join(format!("cloudopt-config-init-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        let _ = std::fs::remove_file(&path);

        write_config_template(&path, false).unwrap();
        assert_eq!(ConfigFile::load(&path).unwrap(), ConfigFile::template());

        let err = write_config_template(&path, false).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        write_config_template(&path, true).unwrap();

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn cycle_without_channels_reaches_every_notifier() {
        let agent = cloudopt_core::bootstrap::default_agent(&Default::default()).unwrap();
        let args = CycleArgs {
            provider: Some("aws".to_string()),
            channels: Vec::new(),
            org: None,
        };
        let outcome = run_cycle(&agent, &args, "Acme").await;
        assert_eq!(outcome.count, 1);
        assert_eq!(outcome.notify_status.get("log"), Some(&true));
    }
}
