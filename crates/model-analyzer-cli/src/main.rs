//! Model Analyzer CLI
//!
//! The `model-analyzer` command turns the DbContext models of a built
//! assembly into DGML diagrams.
//!
//! ## Commands
//!
//! - `generate`: run the analyzer against an assembly and write diagrams
//! - `parse`: split saved analyzer output into records (JSON)
//! - `render`: write diagrams from saved analyzer output
//! - `readme`: print or save the usage notes
//! - `config`: show the effective configuration

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use model_analyzer_core::{
    extract, init_tracing, telemetry, write_readme, AnalyzerConfig, DgmlPipeline, EmbeddedReadme,
    GenerationReport, LogFormat, ReadmeSource,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "model-analyzer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate DGML diagrams from DbContext models", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the analyzer against an assembly and write one diagram per DbContext
    Generate {
        /// Built assembly to analyze
        artifact: PathBuf,

        /// Analyzer executable (default: the analyzer next to the assembly)
        #[arg(long, env = "MODEL_ANALYZER_EXE")]
        analyzer: Option<PathBuf>,

        /// Directory holding the analyzer files to copy next to the assembly
        #[arg(long, env = "MODEL_ANALYZER_PAYLOAD_DIR")]
        payload_dir: Option<PathBuf>,

        /// Kill the analyzer after this many seconds (0 = never)
        #[arg(long, env = "MODEL_ANALYZER_TIMEOUT_SECS")]
        timeout_secs: Option<u64>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Split saved analyzer output into records and print them as JSON
    Parse {
        /// File with analyzer output ("-" reads stdin)
        input: PathBuf,
    },

    /// Write diagrams from saved analyzer output without running the analyzer
    Render {
        /// File with analyzer output ("-" reads stdin)
        input: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print the usage notes, or save them to a file
    Readme {
        /// Destination file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the effective configuration as JSON
    Config,
}

#[derive(Args)]
struct OutputArgs {
    /// Directory for the generated .dgml files (default: system temp dir)
    #[arg(short, long, env = "MODEL_ANALYZER_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Handlebars template to render with (default: built-in template)
    #[arg(long, env = "MODEL_ANALYZER_TEMPLATE")]
    template: Option<PathBuf>,

    /// Prefix each file with a UTF-8 byte-order mark
    #[arg(long)]
    bom: bool,
}

impl OutputArgs {
    fn apply(&self, mut config: AnalyzerConfig) -> AnalyzerConfig {
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(template) = &self.template {
            config = config.with_template(template);
        }
        if self.bom {
            config = config.with_bom(true);
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(
        LogFormat::from_json_flag(cli.json),
        telemetry::level_for(cli.verbose),
    );

    match cli.command {
        Commands::Generate {
            artifact,
            analyzer,
            payload_dir,
            timeout_secs,
            output,
        } => {
            let mut config = output.apply(AnalyzerConfig::from_env());
            if let Some(path) = analyzer {
                config = config.with_analyzer(path);
            }
            if let Some(dir) = payload_dir {
                config = config.with_payload_dir(dir);
            }
            if let Some(secs) = timeout_secs {
                config = config.with_timeout_secs(secs);
            }
            cmd_generate(config, &artifact).await
        }
        Commands::Parse { input } => cmd_parse(&input),
        Commands::Render { input, output } => {
            cmd_render(output.apply(AnalyzerConfig::from_env()), &input)
        }
        Commands::Readme { output } => cmd_readme(output.as_deref()),
        Commands::Config => cmd_config(),
    }
}

async fn cmd_generate(config: AnalyzerConfig, artifact: &Path) -> Result<()> {
    if !artifact.exists() {
        anyhow::bail!("Assembly not found: {}", artifact.display());
    }

    let report = DgmlPipeline::new(config)
        .generate(artifact)
        .await
        .with_context(|| format!("Failed to generate diagrams for {}", artifact.display()))?;

    print_report(&report);
    Ok(())
}

fn cmd_parse(input: &Path) -> Result<()> {
    let text = read_input(input)?;
    let records = extract(&text).context("Analyzer output is malformed")?;
    info!(contexts = records.len(), "Parsed analyzer output");

    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

fn cmd_render(config: AnalyzerConfig, input: &Path) -> Result<()> {
    let text = read_input(input)?;
    let report = DgmlPipeline::new(config)
        .generate_from_output(&text)
        .context("Failed to render diagrams")?;

    print_report(&report);
    Ok(())
}

fn cmd_readme(output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let written = write_readme(&EmbeddedReadme, path)
                .with_context(|| format!("Failed to write readme to {}", path.display()))?;
            println!("{}", written.display());
        }
        None => print!("{}", EmbeddedReadme.readme()?),
    }
    Ok(())
}

fn cmd_config() -> Result<()> {
    let config = AnalyzerConfig::from_env();
    config.validate()?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn read_input(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read analyzer output from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read {}", input.display()))
    }
}

fn print_report(report: &GenerationReport) {
    if report.artifacts.is_empty() {
        println!("No DbContext found, nothing generated");
        return;
    }
    for artifact in &report.artifacts {
        println!("{}", artifact.path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate_args() {
        let cli = Cli::try_parse_from([
            "model-analyzer",
            "generate",
            "bin/App.dll",
            "--analyzer",
            "/tools/efpt",
            "--timeout-secs",
            "30",
            "-o",
            "out",
            "--bom",
        ])
        .unwrap();

        match cli.command {
            Commands::Generate {
                artifact,
                analyzer,
                timeout_secs,
                output,
                ..
            } => {
                assert_eq!(artifact, PathBuf::from("bin/App.dll"));
                assert_eq!(analyzer, Some(PathBuf::from("/tools/efpt")));
                assert_eq!(timeout_secs, Some(30));
                assert_eq!(output.output_dir, Some(PathBuf::from("out")));
                assert!(output.bom);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_output_args_override_config() {
        let args = OutputArgs {
            output_dir: Some(PathBuf::from("/out")),
            template: Some(PathBuf::from("/tpl.hbs")),
            bom: true,
        };
        let config = args.apply(AnalyzerConfig::new("/tmp"));
        assert_eq!(config.output_dir, PathBuf::from("/out"));
        assert_eq!(config.template_path, Some(PathBuf::from("/tpl.hbs")));
        assert!(config.write_bom);
    }

    #[test]
    fn test_render_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("output.txt");
        std::fs::write(&input, "DbContext:\nCtx\nDebugView:\nModel:\n  EntityType: Blog\n").unwrap();

        let config = AnalyzerConfig::new(dir.path().join("diagrams"));
        cmd_render(config, &input).unwrap();
        assert!(dir.path().join("diagrams").join("Ctx.dgml").exists());
    }

    #[test]
    fn test_read_input_missing_file() {
        let err = read_input(Path::new("/no/such/output.txt")).unwrap_err();
        assert!(err.to_string().contains("/no/such/output.txt"));
    }
}
