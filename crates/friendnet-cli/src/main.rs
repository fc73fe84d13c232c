use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use friendnet_core::{
    ConfigManager, FriendNetConfig, IdentityFilter, LoggingConfig, MutualFriendSourceKind, ScanDataset, ScanEvent,
};
use friendnet_graph::{FriendNetwork, LabelPropagation, NodeScores, RenderOptions, SpringLayout};
use friendnet_scanner::{Credentials, FriendNetworkScanner};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "friendnet")]
#[command(about = "FriendNet - scan a social account's friend network and analyse its shape", long_about = None)]
#[command(version)]
struct Cli {
    /// Output format for command results (json, pretty)
    #[arg(short, long, global = true, default_value = "pretty")]
    output: OutputFormat,

    /// Explicit configuration file
    #[arg(long, global = true, env = "FRIENDNET_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in, read the friend list and every friend's mutual friends
    Scan {
        /// Account login
        #[arg(short, long, env = "FRIENDNET_USER")]
        user: String,

        /// Account password
        #[arg(short, long, env = "FRIENDNET_PASSWORD", hide_env_values = true)]
        password: String,

        /// Where the dataset is written
        #[arg(short = 'f', long, default_value = "network.json")]
        file: PathBuf,

        /// Override the configured mutual friend source
        #[arg(long, value_enum)]
        mutual_source: Option<SourceArg>,

        /// Show the browser window
        #[arg(long)]
        headed: bool,
    },

    /// Build the graph of a dataset and write a render payload
    Analyze {
        /// Dataset written by `scan`
        input: PathBuf,

        /// Where the render payload is written
        #[arg(short = 'f', long, default_value = "network_render.json")]
        file: PathBuf,

        /// Layout and community seed (defaults to the configured one)
        #[arg(long)]
        seed: Option<u64>,

        /// Keep every component instead of only the biggest
        #[arg(long)]
        keep_all: bool,

        /// Score used for labels and colours; communities colour the graph otherwise
        #[arg(long, value_enum, default_value = "none")]
        score: ScoreArg,

        /// Share of nodes that get a label, between 0 and 1
        #[arg(long, value_parser = parse_proportion)]
        label_proportion: Option<f64>,
    },

    /// List the friends one person is connected to
    FriendsOf {
        /// Dataset written by `scan`
        input: PathBuf,

        #[arg(long)]
        id: Option<String>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        link: Option<String>,
    },

    /// Replace every identifier of a dataset with its SHA-256 digest
    Anonymize {
        /// Dataset to anonymize
        input: PathBuf,

        /// Destination (the input is rewritten when omitted)
        #[arg(short = 'f', long)]
        file: Option<PathBuf>,
    },

    /// Print the effective configuration
    ShowConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    Api,
    Dom,
}

impl From<SourceArg> for MutualFriendSourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Api => MutualFriendSourceKind::Api,
            SourceArg::Dom => MutualFriendSourceKind::Dom,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ScoreArg {
    None,
    Degree,
    Pagerank,
}

#[derive(Serialize)]
struct ScanResult {
    file: String,
    friends: usize,
    mutual_lists: usize,
    mutual_source: String,
}

#[derive(Serialize)]
struct AnalyzeResult {
    file: String,
    nodes: usize,
    edges: usize,
    removed_nodes: usize,
    communities: usize,
    labelled_nodes: usize,
    seed: u64,
}

#[derive(Serialize)]
struct FriendsOfResult {
    count: usize,
    names: Vec<Option<String>>,
}

#[derive(Serialize)]
struct AnonymizeResult {
    file: String,
    friends: usize,
    mutual_lists: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let manager = match &cli.config {
        Some(path) => ConfigManager::from_path(path),
        None => ConfigManager::load(),
    }
    .context("Failed to load configuration")?;
    let config = manager.into_config();

    init_tracing(&config.logging, cli.verbose);

    match execute_command(&cli, config).await {
        Ok(output) => {
            print_output(&cli.output, &output)?;
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Logs go to stderr so that `--output json` stays machine readable.
fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    match logging.format.as_str() {
        "json" => registry.with(fmt::layer().json().with_writer(std::io::stderr)).init(),
        "compact" => registry.with(fmt::layer().compact().with_writer(std::io::stderr)).init(),
        _ => registry.with(fmt::layer().pretty().with_writer(std::io::stderr)).init(),
    }
}

async fn execute_command(cli: &Cli, config: FriendNetConfig) -> Result<serde_json::Value> {
    match &cli.command {
        Commands::Scan {
            user,
            password,
            file,
            mutual_source,
            headed,
        } => {
            let mut config = config;
            if let Some(source) = mutual_source {
                config.scan.mutual_friend_source = (*source).into();
            }
            if *headed {
                config.browser.headless = false;
            }
            let credentials = Credentials::new(user.clone(), password.clone());
            execute_scan(config, &credentials, file).await
        }
        Commands::Analyze {
            input,
            file,
            seed,
            keep_all,
            score,
            label_proportion,
        } => execute_analyze(&config, input, file, *seed, *keep_all, *score, *label_proportion),
        Commands::FriendsOf { input, id, name, link } => {
            let mut filter = IdentityFilter::new();
            if let Some(id) = id {
                filter = filter.id(id.clone());
            }
            if let Some(name) = name {
                filter = filter.name(name.clone());
            }
            if let Some(link) = link {
                filter = filter.link(link.clone());
            }
            execute_friends_of(input, &filter)
        }
        Commands::Anonymize { input, file } => execute_anonymize(input, file.as_deref().unwrap_or(input)),
        Commands::ShowConfig => Ok(serde_json::to_value(&config)?),
    }
}

async fn execute_scan(config: FriendNetConfig, credentials: &Credentials, file: &Path) -> Result<serde_json::Value> {
    let source = config.scan.mutual_friend_source;
    let scanner = FriendNetworkScanner::new(config);

    let mut report = |event: &ScanEvent| eprintln!("{} {}", "▸".cyan(), event);
    let dataset = scanner
        .scan(credentials, &mut report)
        .await
        .context("Scan failed")?;

    dataset
        .save(file)
        .with_context(|| format!("Failed to write dataset to {}", file.display()))?;

    let result = ScanResult {
        file: file.display().to_string(),
        friends: dataset.friends.len(),
        mutual_lists: dataset.mutual_friends.len(),
        mutual_source: source.to_string(),
    };
    Ok(serde_json::to_value(result)?)
}

fn execute_analyze(
    config: &FriendNetConfig,
    input: &Path,
    file: &Path,
    seed: Option<u64>,
    keep_all: bool,
    score: ScoreArg,
    label_proportion: Option<f64>,
) -> Result<serde_json::Value> {
    let analysis = &config.analysis;
    let seed = seed.unwrap_or(analysis.seed);

    let dataset =
        ScanDataset::load(input).with_context(|| format!("Failed to read dataset {}", input.display()))?;
    let mut network = FriendNetwork::with_layout(dataset, SpringLayout::new(analysis.layout_iterations), seed);

    let removed_nodes = if analysis.biggest_component_only && !keep_all {
        network.filter_biggest_component()
    } else {
        0
    };

    let communities = network.detect_communities(&LabelPropagation::new(seed, analysis.community_iterations));
    let scores: Option<NodeScores> = match score {
        ScoreArg::None => None,
        ScoreArg::Degree => Some(network.degree_centrality()),
        ScoreArg::Pagerank => Some(network.pagerank()),
    };

    let payload = network.render(&RenderOptions {
        scores: scores.as_ref(),
        communities: Some(&communities),
        label_proportion: label_proportion.unwrap_or(analysis.label_proportion),
        seed,
    });
    payload
        .save(file)
        .with_context(|| format!("Failed to write render payload to {}", file.display()))?;
    info!("Analysis of {} done", input.display());

    let result = AnalyzeResult {
        file: file.display().to_string(),
        nodes: payload.nodes.len(),
        edges: payload.edges.len(),
        removed_nodes,
        communities: communities.values().collect::<BTreeSet<_>>().len(),
        labelled_nodes: payload.nodes.iter().filter(|n| n.label.is_some()).count(),
        seed,
    };
    Ok(serde_json::to_value(result)?)
}

fn execute_friends_of(input: &Path, filter: &IdentityFilter) -> Result<serde_json::Value> {
    let network =
        FriendNetwork::load(input).with_context(|| format!("Failed to read dataset {}", input.display()))?;
    let names = network
        .person_friend_names(filter)
        .with_context(|| format!("No friend matches {}", filter))?;

    let result = FriendsOfResult {
        count: names.len(),
        names,
    };
    Ok(serde_json::to_value(result)?)
}

fn execute_anonymize(input: &Path, file: &Path) -> Result<serde_json::Value> {
    let mut dataset =
        ScanDataset::load(input).with_context(|| format!("Failed to read dataset {}", input.display()))?;
    dataset.anonymize();
    dataset
        .save(file)
        .with_context(|| format!("Failed to write dataset to {}", file.display()))?;

    let result = AnonymizeResult {
        file: file.display().to_string(),
        friends: dataset.friends.len(),
        mutual_lists: dataset.mutual_friends.len(),
    };
    Ok(serde_json::to_value(result)?)
}

fn print_output(format: &OutputFormat, value: &serde_json::Value) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        OutputFormat::Pretty => {
            print_pretty(value)?;
        }
    }
    Ok(())
}

fn print_pretty(value: &serde_json::Value) -> Result<()> {
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map {
                let key_colored = key.cyan().bold();
                match val {
                    serde_json::Value::String(s) => println!("{}: {}", key_colored, s.green()),
                    serde_json::Value::Number(n) => println!("{}: {}", key_colored, n.to_string().yellow()),
                    serde_json::Value::Bool(b) => {
                        let val_colored = if *b { "true".green() } else { "false".red() };
                        println!("{}: {}", key_colored, val_colored);
                    }
                    serde_json::Value::Null => println!("{}: {}", key_colored, "null".dimmed()),
                    other => println!("{}: {}", key_colored, serde_json::to_string_pretty(other)?),
                }
            }
        }
        other => println!("{}", serde_json::to_string_pretty(other)?),
    }
    Ok(())
}

fn parse_proportion(value: &str) -> std::result::Result<f64, String> {
    let proportion: f64 = value.parse().map_err(|e| format!("{e}"))?;
    if !proportion.is_finite() || !(0.0..=1.0).contains(&proportion) {
        return Err(format!("{value} is not a proportion between 0 and 1"));
    }
    Ok(proportion)
}
