use std::fs;
use std::io::Read;
use std::path::PathBuf;

use auth_session_core::RequiredFields;
use auth_session_parser::batch::{BatchJob, collect_inputs, run_batch};
use auth_session_parser::config::ParseConfig;
use auth_session_parser::output::{
    OutputFormat, format_batch_report, format_report, format_sessions,
};
use auth_session_parser::report::ParseReport;
use auth_session_parser::source::{
    CommandSource, FileSource, ProcessSource, SourceRequest, StaticSource,
};
use auth_session_parser::{ParsedSessions, parse_request};
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Which output layout a batch parses.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliForm {
    Summary,
    Details,
}

#[derive(Debug, Parser)]
#[command(name = "authsess", version)]
#[command(about = "Parse show authentication sessions output into structured data")]
struct Cli {
    /// YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Enable debug logging on stderr (overrides RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse summary table output.
    Summary(SummaryArgs),
    /// Parse detail output for one interface.
    Details(DetailsArgs),
    /// Parse many captures in parallel and write one output per capture.
    Batch(BatchArgs),
}

#[derive(Debug, Args)]
struct InputArgs {
    /// Capture file to parse; `-` or omitted reads stdin.
    #[arg(long)]
    input: Option<PathBuf>,
    /// Program that prints the command output; the device command line is
    /// passed as its last argument.
    #[arg(long, conflicts_with = "input")]
    exec: Option<String>,
    /// Argument for --exec, placed before the command line. Repeatable.
    #[arg(long = "exec-arg", requires = "exec", allow_hyphen_values = true)]
    exec_args: Vec<String>,
}

#[derive(Debug, Args)]
struct OutputArgs {
    /// Output format (default: from config, else json).
    #[arg(long)]
    format: Option<OutputFormat>,
    /// Output the parse report alongside the sessions.
    #[arg(long)]
    with_report: bool,
}

#[derive(Debug, Args)]
struct SummaryArgs {
    /// Only keep rows for this interface.
    #[arg(long)]
    interface: Option<String>,
    #[command(flatten)]
    input: InputArgs,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Debug, Args)]
struct DetailsArgs {
    /// Interface whose clients are parsed (any device spelling).
    #[arg(long)]
    interface: String,
    /// Comma-separated attributes every record must carry (default: from
    /// config).
    #[arg(long, value_delimiter = ',')]
    require: Option<Vec<String>>,
    #[command(flatten)]
    input: InputArgs,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Debug, Args)]
struct BatchArgs {
    /// Layout of the captures.
    #[arg(long, value_enum)]
    form: CliForm,
    /// Capture files and/or directories containing capture files.
    #[arg(long, required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,
    /// Output directory for rendered captures and the batch report.
    #[arg(long)]
    output: PathBuf,
    /// Interface filter (required for details).
    #[arg(long)]
    interface: Option<String>,
    /// Comma-separated attributes every record must carry.
    #[arg(long, value_delimiter = ',')]
    require: Option<Vec<String>>,
    /// Number of parallel jobs (default: from config, else number of CPUs).
    #[arg(long)]
    jobs: Option<usize>,
    /// Output format (default: from config, else json).
    #[arg(long)]
    format: Option<OutputFormat>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = load_config(cli.config.as_ref()).and_then(|config| match cli.command {
        Command::Summary(args) => run_summary(args, &config),
        Command::Details(args) => run_details(args, &config),
        Command::Batch(args) => run_batch_command(args, &config),
    });

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
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

fn load_config(path: Option<&PathBuf>) -> Result<ParseConfig, String> {
    match path {
        Some(path) => ParseConfig::load(path)
            .map_err(|e| format!("Failed to load config '{}': {e}", path.display())),
        None => Ok(ParseConfig::default()),
    }
}

fn required_fields(
    require: Option<Vec<String>>,
    config: &ParseConfig,
) -> Result<RequiredFields, String> {
    match require {
        Some(keys) => RequiredFields::new(keys).map_err(|e| format!("Invalid --require: {e}")),
        None => Ok(config.validation.required_fields.clone()),
    }
}

fn run_summary(args: SummaryArgs, config: &ParseConfig) -> Result<(), String> {
    let request = SourceRequest::summary(args.interface.as_deref());
    let text = read_input(&args.input, &request, config)?;
    emit(&request, &text, &RequiredFields::none(), &args.output, config)
}

fn run_details(args: DetailsArgs, config: &ParseConfig) -> Result<(), String> {
    let required = required_fields(args.require, config)?;
    let request = SourceRequest::details(&args.interface);
    let text = read_input(&args.input, &request, config)?;
    emit(&request, &text, &required, &args.output, config)
}

fn read_input(
    input: &InputArgs,
    request: &SourceRequest,
    config: &ParseConfig,
) -> Result<String, String> {
    let source: Box<dyn CommandSource> = match (&input.exec, &input.input) {
        (Some(program), _) => Box::new(
            ProcessSource::new(program.clone())
                .with_args(input.exec_args.clone())
                .with_timeout(config.source.timeout()),
        ),
        (None, Some(path)) if path.as_os_str() != "-" => Box::new(FileSource::new(path)),
        (None, _) => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|err| format!("Failed to read stdin: {err}"))?;
            Box::new(StaticSource::new(text))
        }
    };
    debug!(command = %request.command_line(), "Fetching command output");
    source.fetch(request).map_err(|e| e.to_string())
}

fn emit(
    request: &SourceRequest,
    text: &str,
    required: &RequiredFields,
    output: &OutputArgs,
    config: &ParseConfig,
) -> Result<(), String> {
    let format = output.format.unwrap_or(config.output.format);
    let run = parse_request(request, text, required);

    if output.with_report {
        #[derive(serde::Serialize)]
        struct ParseOutput<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            sessions: Option<&'a ParsedSessions>,
            report: &'a ParseReport,
        }

        let combined = ParseOutput {
            sessions: run.result.as_ref().ok(),
            report: &run.report,
        };

        match format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&combined)
                    .map_err(|e| format!("Failed to serialize output: {e}"))?;
                println!("{json}");
            }
            OutputFormat::Yaml => {
                let yaml = serde_yaml::to_string(&combined)
                    .map_err(|e| format!("Failed to serialize output: {e}"))?;
                print!("{yaml}");
            }
            OutputFormat::Markdown | OutputFormat::Table => {
                if let Ok(sessions) = &run.result {
                    println!("{}", format_sessions(sessions, format)?);
                }
                print!("{}", format_report(&run.report, format)?);
            }
        }
    }

    let sessions = run.result.map_err(|e| e.to_string())?;
    if !output.with_report {
        let rendered = format_sessions(&sessions, format)?;
        println!("{}", rendered.trim_end());
    }
    Ok(())
}

fn run_batch_command(args: BatchArgs, config: &ParseConfig) -> Result<(), String> {
    let request = match (args.form, args.interface) {
        (CliForm::Summary, interface) => SourceRequest::Summary { interface },
        (CliForm::Details, Some(interface)) => SourceRequest::Details { interface },
        (CliForm::Details, None) => {
            return Err("--interface is required for --form details".to_string());
        }
    };
    let format = args.format.unwrap_or(config.output.format);

    let inputs = collect_inputs(&args.inputs).map_err(|e| e.to_string())?;
    if inputs.is_empty() {
        return Err("No capture files found in --inputs".to_string());
    }

    let job = BatchJob {
        request,
        required: required_fields(args.require, config)?,
        format,
        output_dir: args.output.clone(),
        jobs: args.jobs.or(config.batch.jobs),
    };
    let report = run_batch(&inputs, &job).map_err(|e| e.to_string())?;

    let rendered = format_batch_report(&report, format)?;
    let report_path = args
        .output
        .join(format!("batch-report.{}", format.extension()));
    fs::write(&report_path, &rendered)
        .map_err(|e| format!("Failed to write '{}': {e}", report_path.display()))?;

    eprintln!(
        "Parsed {} of {} captures into {}",
        report.succeeded,
        report.total,
        args.output.display()
    );
    if report.failed > 0 {
        return Err(format!(
            "{} of {} captures failed; see {}",
            report.failed,
            report.total,
            report_path.display()
        ));
    }
    Ok(())
}
