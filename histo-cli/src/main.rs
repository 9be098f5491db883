mod logging;

use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use histo_common::Config;
use histo_core::{
    export_csv, export_json, parse_samples, read_samples_from_paths, render, resolve_inputs,
    Histogram, HistogramReport, Nanos, Sample, Template,
};
use tracing::{debug, warn};

fn parse_log_base(s: &str) -> Result<f64, String> { // validate log base at CLI parse time
    let v: f64 = s.parse().map_err(|_| format!("not a float: {s}"))?;
    if v.is_finite() && v > 1.0 { Ok(v) } else { Err(format!("base must be greater than 1, got {v}")) }
}

#[derive(Parser)]
#[command(name = "histo", version, about = "Bucket numeric samples and print a bar-chart histogram")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct Common {
    /// Sample files, directories or glob patterns; stdin when empty or `-`
    inputs: Vec<String>,
    /// Parse samples as integers instead of floats
    #[arg(long, conflicts_with = "durations")] integers: bool,
    /// Parse samples as durations such as "120ms" or "1.5s"
    #[arg(long)] durations: bool,
    /// Width of the fullest bucket's bar
    #[arg(long)] bar_width: Option<usize>,
    /// Row template, e.g. "{range}\t{pct}%\t{bar:40}\t{count:4}"
    #[arg(long)] template: Option<String>,
    /// Also write the histogram as JSON
    #[arg(long)] json: Option<PathBuf>,
    /// Also write the histogram as CSV
    #[arg(long)] csv: Option<PathBuf>,
    /// Only log errors
    #[arg(long, short)] quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fixed number of equally sized buckets over the sample range
    Linear {
        #[arg(long)] bins: Option<usize>,
        #[command(flatten)] common: Common,
    },
    /// Fixed-width buckets over an explicit range; samples outside it are dropped
    Ranged {
        #[arg(long, allow_hyphen_values = true)] min: String,
        #[arg(long, allow_hyphen_values = true)] max: String,
        #[arg(long)] interval: String,
        #[command(flatten)] common: Common,
    },
    /// Buckets bounded by successive powers of a base
    Log {
        #[arg(long, value_parser = parse_log_base)] base: Option<f64>,
        #[command(flatten)] common: Common,
    },
    /// Show the config path, or write the defaults there
    Config { #[arg(long)] init: bool },
    /// Print shell completions
    Completions { shell: Shell },
}

/// How to partition, with range bounds still unparsed until the sample type is known.
enum Strategy {
    Linear(usize),
    Ranged { min: String, max: String, interval: String },
    Log(f64),
}

impl Strategy {
    fn name(&self) -> &'static str {
        match self {
            Strategy::Linear(_) => "linear",
            Strategy::Ranged { .. } => "ranged",
            Strategy::Log(_) => "log",
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_default();
    match cli.command {
        Commands::Linear { bins, common } => {
            let bins = bins.unwrap_or(config.bucketing.bins);
            run(Strategy::Linear(bins), common, &config)?
        }
        Commands::Ranged { min, max, interval, common } => {
            run(Strategy::Ranged { min, max, interval }, common, &config)?
        }
        Commands::Log { base, common } => {
            let base = base.unwrap_or(config.bucketing.log_base);
            run(Strategy::Log(base), common, &config)?
        }
        Commands::Config { init } => run_config(init)?,
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "histo", &mut io::stdout());
        }
    }
    Ok(())
}

fn run(strategy: Strategy, common: Common, config: &Config) -> anyhow::Result<()> {
    logging::init_logging(common.quiet);
    if common.integers {
        run_typed::<i64>(strategy, &common, config)
    } else if common.durations {
        run_typed::<Nanos>(strategy, &common, config)
    } else {
        run_typed::<f64>(strategy, &common, config)
    }
}

fn parse_bound<T: FromStr>(flag: &str, raw: &str) -> anyhow::Result<T> {
    raw.trim().parse().map_err(|_| anyhow::anyhow!("--{flag}: cannot parse {raw:?}"))
}

fn run_typed<T>(strategy: Strategy, common: &Common, config: &Config) -> anyhow::Result<()>
where
    T: Sample + FromStr + serde::Serialize,
{
    let samples: Vec<T> = read_samples(&common.inputs)?;
    debug!(samples = samples.len(), strategy = strategy.name(), "building histogram");

    let hist = match &strategy {
        Strategy::Linear(bins) => Histogram::create(*bins, samples),
        Strategy::Ranged { min, max, interval } => Histogram::create_ranged(
            parse_bound("min", min)?,
            parse_bound("max", max)?,
            parse_bound("interval", interval)?,
            samples,
        ),
        Strategy::Log(base) => Histogram::create_log(*base, samples),
    };
    if hist.is_empty() {
        warn!("histogram has no buckets; check the samples and bucketing parameters");
    }

    let bar_width = common.bar_width.unwrap_or(config.render.bar_width);
    let template = match common.template.as_deref().or(config.render.template.as_deref()) {
        Some(t) => Template::parse(&t.replace("\\t", "\t"))?,
        None => Template::for_sample::<T>(bar_width),
    };
    render(&mut io::stdout().lock(), &hist, &template)?;

    if let Some(path) = &common.json {
        export_json(path, &HistogramReport::new(strategy.name(), &hist), config.export.pretty)?;
        eprintln!("Exported JSON to {}", path.display());
    }
    if let Some(path) = &common.csv {
        export_csv(path, &hist)?;
        eprintln!("Exported CSV to {}", path.display());
    }
    Ok(())
}

fn read_samples<T: FromStr>(inputs: &[String]) -> anyhow::Result<Vec<T>> {
    if inputs.is_empty() || inputs.iter().all(|i| i == "-") {
        return Ok(parse_samples(io::stdin().lock())?);
    }
    let mut paths = Vec::new();
    for input in inputs.iter().filter(|i| *i != "-") {
        paths.extend(resolve_inputs(input)?);
    }
    let mut samples: Vec<T> = read_samples_from_paths(&paths)?;
    if inputs.iter().any(|i| i == "-") {
        samples.extend(parse_samples::<T, _>(io::stdin().lock())?);
    }
    Ok(samples)
}

fn run_config(init: bool) -> anyhow::Result<()> {
    let path = Config::config_path();
    if init {
        if path.exists() {
            anyhow::bail!("{} already exists", path.display());
        }
        Config::default().save()?;
        println!("Wrote default config to {}", path.display());
        return Ok(());
    }
    println!("{}", path.display());
    let config = Config::load()?;
    println!("{:<16} {}", "bins:", config.bucketing.bins);
    println!("{:<16} {}", "log_base:", config.bucketing.log_base);
    println!("{:<16} {}", "bar_width:", config.render.bar_width);
    println!("{:<16} {}", "template:", config.render.template.as_deref().unwrap_or("-"));
    println!("{:<16} {}", "pretty_json:", config.export.pretty);
    Ok(())
}
