use std::fs;
use std::path::{Path, PathBuf};

use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand};
use paramspec_core::{
    Configuration, DocumentKind, DynamicCommand, FlatMap, ValueOptions, expand,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::Value;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

const CONFIG_AUTO: &str = "_config_auto.json";
const SPEC_AUTO: &str = "_spec_auto.json";

/// Argument ids owned by this CLI; generated parameter flags may not use them.
const RESERVED_IDS: [&str; 3] = ["spec", "config", "randomize-config"];

/// Output format for printed values.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "paramspec")]
#[command(about = "Typed parameter specs, layered config values and dynamic CLI flags")]
struct Cli {
    /// Enable debug logging (overrides RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Infer a spec from a config file and write both as JSON.
    Init(InitArgs),
    /// Print effective values for a spec and/or config.
    Values(ValuesArgs),
    /// Load a spec (and optional config) and report problems.
    Validate(ValidateArgs),
    /// Parse parameter flags given after `--` and print the resulting values.
    Run(RunArgs),
}

#[derive(Debug, Args)]
struct InitArgs {
    /// Config file (JSON or YAML) to infer the spec from.
    config: PathBuf,
    /// Directory receiving the generated files.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

#[derive(Debug, Args)]
struct SourceArgs {
    /// Spec file (JSON or YAML). Without it the spec is inferred from --config.
    #[arg(long)]
    spec: Option<PathBuf>,
    /// Config file (JSON or YAML) with values overriding spec defaults.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ValuesArgs {
    #[command(flatten)]
    source: SourceArgs,
    /// Replace every value with a random sample.
    #[arg(long)]
    random: bool,
    /// Print nested documents instead of flat dotted keys.
    #[arg(long)]
    expand: bool,
    /// Omit required parameters that have no explicit value.
    #[arg(long)]
    no_defaults: bool,
    /// Seed for --random, for reproducible samples.
    #[arg(long)]
    seed: Option<u64>,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Spec file (JSON or YAML).
    #[arg(long)]
    spec: PathBuf,
    /// Config file to check against the spec.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct RunArgs {
    #[command(flatten)]
    source: SourceArgs,
    /// Replace parsed values with random samples from the spec.
    #[arg(long)]
    randomize_config: bool,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
    /// Parameter flags, e.g. `-- --model.depth 4 --widths 8 16`.
    #[arg(last = true)]
    args: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Init(args) => run_init(args),
        Command::Values(args) => run_values(args),
        Command::Validate(args) => run_validate(args),
        Command::Run(args) => run_run(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_init(args: InitArgs) -> Result<(), String> {
    let mut store = Configuration::new();
    store
        .load_config_file(&args.config)
        .map_err(|err| format!("Failed to load '{}': {err}", args.config.display()))?;

    fs::create_dir_all(&args.output_dir).map_err(|err| {
        format!(
            "Failed to create output directory '{}': {err}",
            args.output_dir.display()
        )
    })?;
    let config_path = args.output_dir.join(CONFIG_AUTO);
    let spec_path = args.output_dir.join(SPEC_AUTO);
    store
        .save_config_file(&config_path)
        .map_err(|err| format!("Failed to write '{}': {err}", config_path.display()))?;
    store
        .save_spec_file(&spec_path)
        .map_err(|err| format!("Failed to write '{}': {err}", spec_path.display()))?;

    println!(
        "Wrote config to '{}' and spec to '{}'.",
        config_path.display(),
        spec_path.display()
    );
    Ok(())
}

fn run_values(args: ValuesArgs) -> Result<(), String> {
    let store = load_store(&args.source)?;
    let options = ValueOptions::default()
        .with_random(args.random)
        .with_fill_defaults(!args.no_defaults)
        .with_expand(args.expand);
    let values = match args.seed {
        Some(seed) => store.get_values_with_rng(options, &mut StdRng::seed_from_u64(seed)),
        None => store.get_values(options),
    }
    .map_err(|err| err.to_string())?;
    print_value(&values, args.format)
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let source = SourceArgs {
        spec: Some(args.spec),
        config: args.config,
    };
    let store = load_store(&source)?;
    store
        .get_flat_values(ValueOptions::default())
        .map_err(|err| err.to_string())?;
    println!(
        "Validated {} parameter(s), {} with explicit values.",
        store.schema().len(),
        store.explicit_values().len()
    );
    Ok(())
}

fn run_run(args: RunArgs) -> Result<(), String> {
    let store = load_store(&args.source)?;

    let mut command = DynamicCommand::new(
        clap::Command::new("paramspec run")
            .no_binary_name(true)
            .about("Dynamic parameters"),
    )
    .reserve(RESERVED_IDS);
    store
        .append_to(&mut command)
        .map_err(|err| err.to_string())?;

    let matches = match command.try_get_matches_from(&args.args) {
        Ok(matches) => matches,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{}", err.render());
            return Ok(());
        }
        Err(err) => return Err(err.render().to_string().trim_end().to_string()),
    };

    let mut parsed = FlatMap::new();
    store
        .apply_to(&mut parsed, false)
        .map_err(|err| err.to_string())?;
    let given = command.matches_to_flat(&matches);
    debug!(flags = given.len(), "parsed dynamic flags");
    parsed.extend(given);
    store
        .validate_args(&parsed)
        .map_err(|err| err.to_string())?;

    if args.randomize_config {
        if store.has_spec() {
            store
                .apply_to(&mut parsed, true)
                .map_err(|err| err.to_string())?;
        } else {
            warn!("--randomize-config needs a spec; keeping parsed values");
        }
    }

    let nested = expand(&parsed, DocumentKind::Config).map_err(|err| err.to_string())?;
    print_value(&nested, args.format)
}

fn load_store(source: &SourceArgs) -> Result<Configuration, String> {
    if source.spec.is_none() && source.config.is_none() {
        return Err("at least one of --spec or --config is required".to_string());
    }
    let mut store = Configuration::new();
    if let Some(path) = &source.spec {
        store
            .load_spec_file(path)
            .map_err(|err| load_error(path, err))?;
    }
    if let Some(path) = &source.config {
        store
            .load_config_file(path)
            .map_err(|err| load_error(path, err))?;
    }
    Ok(store)
}

fn load_error(path: &Path, err: paramspec_core::ConfigError) -> String {
    format!("Failed to load '{}': {err}", path.display())
}

fn print_value(value: &Value, format: CliOutputFormat) -> Result<(), String> {
    let rendered = match format {
        CliOutputFormat::Json => serde_json::to_string_pretty(value)
            .map_err(|err| format!("JSON serialization failed: {err}"))?,
        CliOutputFormat::Yaml => {
            serde_yaml::to_string(value).map_err(|err| format!("YAML serialization failed: {err}"))?
        }
    };
    println!("{}", rendered.trim_end());
    Ok(())
}
