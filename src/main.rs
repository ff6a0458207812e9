//! pdfformfiller: fill a PDF form from a field list.
//!
//! Usage:
//!   pdfformfiller form.pdf -f fields.txt filled.pdf
//!   pdfformfiller form.pdf --list
//!   cat fields.txt | pdfformfiller form.pdf --flatten > filled.pdf

use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use pdf_form_fill::fields::DEFAULT_ENCODING;
use pdf_form_fill::{FillerConfig, Operation};

const FIELD_FORMAT_HELP: &str = "\
FIELD LIST FORMAT:
  One field per line: the name, whitespace, then the value.
    surname Doe
  Names containing whitespace go in brackets:
    [given name] Jane
  Escapes in values: \\n newline, \\p paragraph separator, \\\\ backslash.
  Lines matching neither form are ignored.
  Checkboxes take their state name, usually Yes or Off.";

/// Fill the interactive form of a PDF document.
#[derive(Debug, Parser)]
#[command(name = "pdfformfiller", version, about, after_help = FIELD_FORMAT_HELP)]
struct Cli {
    /// PDF document with a form
    document: PathBuf,

    /// Output PDF (standard output when omitted)
    output: Option<PathBuf>,

    /// Only list the document's field names
    #[arg(short, long)]
    list: bool,

    /// Log every field assignment
    #[arg(short, long)]
    verbose: bool,

    /// Field list file (standard input when omitted)
    #[arg(short, long, value_name = "FILE")]
    fields: Option<PathBuf>,

    /// Encoding of the field list
    #[arg(short, long, value_name = "LABEL", default_value = DEFAULT_ENCODING)]
    encoding: String,

    /// TrueType font used to draw values outside Latin-1
    #[arg(long, value_name = "FILE")]
    font: Option<PathBuf>,

    /// Flatten the form so the values can no longer be edited
    #[arg(long)]
    flatten: bool,
}

impl Cli {
    fn into_config(self) -> FillerConfig {
        let operation = if self.list {
            Operation::List
        } else {
            Operation::Fill
        };
        FillerConfig::new(self.document)
            .with_operation(operation)
            .with_fields(self.fields)
            .with_encoding(self.encoding)
            .with_font(self.font)
            .with_flatten(self.flatten)
            .with_verbose(self.verbose)
            .with_output(self.output)
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "warn,pdf_form_fill=debug"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(1),
            };
        },
    };

    init_logging(cli.verbose);
    let config = cli.into_config();

    match pdf_form_fill::run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}: {}", err.report_prefix(), err);
            ExitCode::from(err.exit_code() as u8)
        },
    }
}
