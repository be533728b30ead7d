use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use scrubber::config::AppConfig;
use scrubber::detect::ColumnDetector;
use scrubber::driver::Driver;
use scrubber::io::load_df;
use scrubber::mailer::SmtpMailer;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "scrubber",
    about = "Clean tabular files and email the results",
    version
)]
pub struct Cli {
    /// Directory for rotating log files
    #[arg(long, global = true, env = "SCRUBBER_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clean every file in the input directory and email the results (default)
    Run(RunArgs),
    /// Show which columns would be detected in a file
    Detect {
        /// File to inspect (.csv, .tsv or .xlsx)
        file: PathBuf,

        /// Path to a JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

impl Default for Commands {
    fn default() -> Self {
        Self::Run(RunArgs::default())
    }
}

#[derive(Args, Default)]
pub struct RunArgs {
    /// Directory scanned for input files
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Directory for cleaned CSV files
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Directory for per-file summary logs
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Path to a JSON configuration file (defaults to ./scrubber.json if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Do not write or attach summary logs
    #[arg(long)]
    pub no_logs: bool,

    /// Recipient address (defaults to the sending account)
    #[arg(long)]
    pub to: Option<String>,

    /// SMTP relay host
    #[arg(long)]
    pub smtp_host: Option<String>,

    /// SMTP relay port
    #[arg(long)]
    pub smtp_port: Option<u16>,
}

impl RunArgs {
    fn apply(self, config: &mut AppConfig) {
        if let Some(input) = self.input {
            config.paths.input = input;
        }
        if let Some(output) = self.output {
            config.paths.output = output;
        }
        if let Some(summary) = self.summary {
            config.paths.summary = summary;
        }
        if self.no_logs {
            config.include_logs = false;
        }
        if let Some(to) = self.to {
            config.email.recipient = Some(to);
        }
        if let Some(host) = self.smtp_host {
            config.email.smtp_host = host;
        }
        if let Some(port) = self.smtp_port {
            config.email.smtp_port = port;
        }
    }
}

pub fn run_command(command: Commands) -> Result<()> {
    match command {
        Commands::Run(args) => handle_run(args),
        Commands::Detect { file, config } => handle_detect(&file, config.as_deref()),
    }
}

#[expect(clippy::print_stdout)]
fn handle_run(args: RunArgs) -> Result<()> {
    let mut config =
        AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply(&mut config);

    // Credentials are checked before any input is touched.
    let mailer = SmtpMailer::from_env(config.email.clone())?;

    let driver = Driver::from_config(&config);
    let report = driver.run(&mailer)?;

    for file in &report.files {
        println!(
            "{} -> {} ({} -> {} rows)",
            file.input.display(),
            file.output.display(),
            file.summary.rows_before,
            file.summary.rows_after
        );
    }
    println!(
        "Sent {} attachment(s) to {}",
        report.sent,
        mailer.recipient()
    );
    Ok(())
}

#[expect(clippy::print_stdout)]
fn handle_detect(file: &Path, config: Option<&Path>) -> Result<()> {
    let config = AppConfig::load(config).context("Failed to load configuration")?;
    let df = load_df(file).with_context(|| format!("Failed to load {}", file.display()))?;

    let headers: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    let columns = ColumnDetector::new(config.keywords).detect(&headers);

    println!("{} ({} rows)", file.display(), df.height());
    for (field, column) in columns.iter() {
        println!("   {field}: {}", column.unwrap_or("None"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory as _;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_means_run() {
        let cli = Cli::try_parse_from(["scrubber"]).expect("parse");
        assert!(matches!(
            cli.command.unwrap_or_default(),
            Commands::Run(_)
        ));
    }

    #[test]
    fn test_run_flags_override_config() {
        let cli = Cli::try_parse_from([
            "scrubber",
            "run",
            "--input",
            "incoming",
            "--no-logs",
            "--to",
            "ops@example.com",
            "--smtp-port",
            "2525",
        ])
        .expect("parse");
        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run command");
        };

        let mut config = AppConfig::default();
        args.apply(&mut config);

        assert_eq!(config.paths.input, PathBuf::from("incoming"));
        assert_eq!(config.paths.output, PathBuf::from("output"));
        assert!(!config.include_logs);
        assert_eq!(config.email.recipient.as_deref(), Some("ops@example.com"));
        assert_eq!(config.email.smtp_port, 2525);
    }
}
