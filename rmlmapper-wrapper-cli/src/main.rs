use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rmlmapper_wrapper::{
    ExecutionOptions, MetadataDetailLevel, Output, RmlMapperWrapper, Serialization, WrapperConfig,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fs, io::Write};
use tracing::{error, info, warn, Level};

/// RMLMapper wrapper
/// Executes RML mapping documents through the RMLMapper engine
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output, including the engine command line and log
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a mapping document against one or more sources
    Run {
        /// Path to the RML mapping document (Turtle)
        #[arg(short, long, value_name = "PATH TO MAPPING")]
        mapping: PathBuf,

        /// Source made available to the mapping, as <NAME>=<PATH>
        #[arg(long = "source", value_name = "NAME=PATH", value_parser = parse_key_value)]
        sources: Vec<(String, String)>,

        /// Wrapper configuration file (JSON, comments allowed)
        #[arg(short, long, value_name = "PATH TO CONFIG")]
        config: Option<PathBuf>,

        /// Path to the RMLMapper jar (overrides the configuration)
        #[arg(short, long, value_name = "PATH TO JAR")]
        engine: Option<PathBuf>,

        /// Directory for temporary workspaces (overrides the configuration, default ./tmp)
        #[arg(short, long, value_name = "TEMP DIRECTORY")]
        temp: Option<PathBuf>,

        /// Keep the temporary workspace after the run
        #[arg(long)]
        keep_temp: bool,

        /// Generate provenance metadata
        #[arg(long)]
        metadata: bool,

        /// Metadata detail level (dataset/triple/term)
        #[arg(long, default_value = "triple", value_parser = parse_detail_level)]
        metadata_level: MetadataDetailLevel,

        /// Output serialization (nquads, turtle, trig, trix, jsonld, hdt, ntriples)
        #[arg(short, long, value_parser = parse_serialization)]
        serialization: Option<Serialization>,

        /// Output file; the output is written to stdout when omitted
        #[arg(short, long, value_name = "OUTPUT PATH")]
        output: Option<PathBuf>,

        /// Java VM option, as <KEY>=<VALUE>
        #[arg(short = 'D', value_name = "KEY=VALUE", value_parser = parse_key_value)]
        vm_options: Vec<(String, String)>,

        /// Kill the engine when it runs longer than this many seconds
        #[arg(long, value_name = "SECONDS")]
        timeout_secs: Option<u64>,
    },
    /// Validate a wrapper configuration file
    ValidateConfig {
        /// Path to the configuration file to validate
        #[arg(
            short,
            long,
            default_value = "rmlmapper.jsonc",
            value_name = "PATH TO CONFIG"
        )]
        config: PathBuf,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected <KEY>=<VALUE>, got '{}'", s)),
    }
}

fn parse_serialization(s: &str) -> Result<Serialization, String> {
    s.parse().map_err(|e: rmlmapper_wrapper::ExecutionError| e.to_string())
}

fn parse_detail_level(s: &str) -> Result<MetadataDetailLevel, String> {
    s.parse()
        .map_err(|e: rmlmapper_wrapper::ExecutionError| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::ValidateConfig { config } => validate_config_command(&config),
        Commands::Run {
            mapping,
            sources,
            config,
            engine,
            temp,
            keep_temp,
            metadata,
            metadata_level,
            serialization,
            output,
            vm_options,
            timeout_secs,
        } => {
            let config = resolve_config(config, engine, temp, keep_temp, timeout_secs)?;
            let mut options = ExecutionOptions::new()
                .generate_metadata(metadata)
                .metadata_detail_level(metadata_level);
            options.serialization = serialization;
            options.vm_options = vm_options.into_iter().collect();
            for (name, path) in sources {
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read source '{}' from {}", name, path))?;
                options.sources.insert(name, content);
            }
            run_command(config, &mapping, options, output.as_deref()).await
        }
    }
}

fn resolve_config(
    config_path: Option<PathBuf>,
    engine: Option<PathBuf>,
    temp: Option<PathBuf>,
    keep_temp: bool,
    timeout_secs: Option<u64>,
) -> Result<WrapperConfig> {
    let mut config = match config_path {
        Some(path) => WrapperConfig::from_file(&path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => {
            let engine = engine
                .clone()
                .context("Either --config or --engine must be given")?;
            WrapperConfig::new(engine, "./tmp")
        }
    };

    if let Some(engine) = engine {
        config.engine_path = engine;
    }
    if let Some(temp) = temp {
        config.temp_root = temp;
    }
    if keep_temp {
        config.delete_temp_after_run = false;
    }
    if let Some(secs) = timeout_secs {
        config.timeout = Some(Duration::from_secs(secs));
    }
    Ok(config)
}

async fn run_command(
    config: WrapperConfig,
    mapping_path: &Path,
    options: ExecutionOptions,
    output: Option<&Path>,
) -> Result<()> {
    if !mapping_path.exists() {
        anyhow::bail!("Mapping file not found: {}", mapping_path.display());
    }
    let mapping = fs::read_to_string(mapping_path)
        .with_context(|| format!("Failed to read mapping {}", mapping_path.display()))?;

    let wrapper = RmlMapperWrapper::from_config(config).context("Invalid configuration")?;

    info!("Executing {}", mapping_path.display());
    let result = match wrapper.execute(mapping, options).await {
        Ok(result) => result,
        Err(e) => {
            if let Some(log) = e.log() {
                error!("Engine log:\n{}", log);
            }
            return Err(e).context("Failed to execute the mapping");
        }
    };
    tracing::debug!("Engine log:\n{}", result.log);
    if result.output.is_empty() {
        warn!("The engine produced no output");
    }

    let rendered = render(&result.output);
    match output {
        Some(path) => {
            fs::write(path, &rendered)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            info!("Wrote output to {}", path.display());
            if let Some(metadata) = &result.metadata {
                let metadata_path = metadata_path_for(path);
                fs::write(&metadata_path, render(metadata)).with_context(|| {
                    format!("Failed to write metadata to {}", metadata_path.display())
                })?;
                info!("Wrote metadata to {}", metadata_path.display());
            }
        }
        None => {
            std::io::stdout()
                .write_all(&rendered)
                .context("Failed to write output")?;
            if let Some(metadata) = &result.metadata {
                info!("Metadata:\n{}", String::from_utf8_lossy(&render(metadata)));
            }
        }
    }

    Ok(())
}

fn render(output: &Output) -> Vec<u8> {
    match output {
        Output::Text(text) => text.clone().into_bytes(),
        Output::Bytes(bytes) => bytes.clone(),
        Output::Quads(quads) => rmlmapper_wrapper::rdf::to_nquads(quads).into_bytes(),
    }
}

fn metadata_path_for(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".metadata");
    PathBuf::from(name)
}

fn validate_config_command(config_path: &Path) -> Result<()> {
    info!("Validating configuration...");

    if !config_path.exists() {
        anyhow::bail!(
            "Configuration file not found: {}. Try using --config <PATH TO CONFIG>",
            config_path.display()
        );
    }

    let config = WrapperConfig::from_file(config_path)
        .context("Failed to validate configuration. See errors for additional details:")?;

    info!("Configuration is valid");
    info!("Engine: {}", config.engine_path.display());
    info!("Temp root: {}", config.temp_root.display());
    info!("VM options: {:?}", config.vm_options);
    Ok(())
}
