use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use structopt::StructOpt;

use lure::analysis::AttackStats;
use lure::config::Config;
use lure::input::{AttackLogReader, InputError};
use lure::output::{export_csv, ReportFormat, ReportWriter};

/// Attack-log analysis command line interface
#[derive(StructOpt, Debug)]
#[structopt(name = "lure", about = "Honeypot attack-log analyzer")]
pub enum Cli {
    /// Print attack statistics and optionally export records to CSV
    Analyze {
        /// Path to configuration file
        #[structopt(short, long, default_value = "lure.toml")]
        config: PathBuf,
        /// Attack log to analyze (overrides the configuration)
        #[structopt(short, long)]
        file: Option<PathBuf>,
        /// Report format: console or json
        #[structopt(long, default_value = "console")]
        format: ReportFormat,
        /// Export to this CSV file without prompting
        #[structopt(long)]
        export: Option<PathBuf>,
        /// Never prompt for CSV export
        #[structopt(long)]
        no_prompt: bool,
    },
    /// Parse and display records from an attack log
    Parse {
        /// Path to attack log
        #[structopt(short, long)]
        file: PathBuf,
        /// Number of records to show
        #[structopt(short, long, default_value = "10")]
        lines: usize,
    },
    /// Generate a default configuration file
    Config {
        /// Output path for the configuration file
        #[structopt(short, long, default_value = "lure.toml")]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let cli = Cli::from_args();

    match cli {
        Cli::Analyze {
            config,
            file,
            format,
            export,
            no_prompt,
        } => {
            let config = Config::load_or_default(&config)?.analysis;
            let log_path = file.unwrap_or(config.log_path);

            let parsed = match AttackLogReader::new(&log_path)?.read_all() {
                Ok(parsed) => parsed,
                Err(InputError::LogNotFound(path)) => {
                    eprintln!("Major Error: {} not found :^(", path.display());
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            };

            let mut report = ReportWriter::stdout(format);
            let stats = match AttackStats::compute(&parsed.records, config.top_n) {
                Some(stats) => stats,
                None => {
                    report.write_empty()?;
                    return Ok(());
                }
            };
            report.write_stats(&stats)?;

            let destination = match export {
                Some(path) => Some(path),
                None if no_prompt => None,
                None => {
                    let stdin = io::stdin();
                    let wants_export = confirm_export(&mut stdin.lock(), &mut io::stdout())?;
                    wants_export.then_some(config.csv_path)
                }
            };

            if let Some(path) = destination {
                export_csv(&parsed.records, &path)?;
                println!("Data exported to {}", path.display());
            }
        }
        Cli::Parse { file, lines } => {
            let reader = AttackLogReader::new(&file)?;
            let parsed = match reader.read_all() {
                Ok(parsed) => parsed,
                Err(InputError::LogNotFound(path)) => {
                    eprintln!("File not found: {:?}", path);
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            };

            let display_count = std::cmp::min(lines, parsed.records.len());
            println!(
                "Parsed {} record(s), dropped {} line(s) (showing {}):\n",
                parsed.records.len(),
                parsed.dropped,
                display_count
            );
            for record in parsed.records.iter().take(display_count) {
                println!(
                    "  [{}] IP: {}, User: {}, Bot: {}",
                    record.timestamp_text(),
                    record.source_ip,
                    record.username,
                    record.is_bot
                );
            }
        }
        Cli::Config { output } => {
            Config::default().to_file(&output)?;
            println!("Default configuration written to: {:?}", output);
        }
    }

    Ok(())
}

/// Ask whether to export; only an answer of `y` (any case) agrees
fn confirm_export<R: BufRead, W: Write>(input: &mut R, prompt: &mut W) -> io::Result<bool> {
    write!(prompt, "Export data to CSV? (y/n): ")?;
    prompt.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().to_lowercase() == "y")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn answer(text: &str) -> bool {
        let mut prompt = Vec::new();
        let result = confirm_export(&mut Cursor::new(text), &mut prompt).unwrap();
        assert_eq!(prompt, b"Export data to CSV? (y/n): ");
        result
    }

    #[test]
    fn test_export_prompt() {
        assert!(answer("y\n"));
        assert!(answer("  Y \n"));
        assert!(!answer("yes\n"));
        assert!(!answer("n\n"));
        assert!(!answer(""));
    }

    #[test]
    fn test_cli_arguments() {
        let cli = Cli::from_iter([
            "lure", "analyze", "-f", "x.log", "--format", "json", "--no-prompt",
        ]);
        match cli {
            Cli::Analyze { file, format, no_prompt, export, .. } => {
                assert_eq!(file, Some(PathBuf::from("x.log")));
                assert_eq!(format, ReportFormat::Json);
                assert!(no_prompt);
                assert!(export.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
