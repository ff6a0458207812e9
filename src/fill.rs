//! Applying a field list to a form and writing the result.

use std::io::{self, BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::config::{FillerConfig, Operation};
use crate::document::{FormDocument, PdfForm, SetOutcome, SubstitutionFont};
use crate::error::{Error, Result};
use crate::fields::{FieldSource, FieldTable};

/// Options for a fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FillOptions {
    /// Flatten the form when finalizing
    pub flatten: bool,
    /// Log every assignment at info level
    pub verbose: bool,
}

/// Result of applying a field table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillReport {
    /// Names that received their value
    pub filled: Vec<String>,
    /// Names that were not applied, with the reason
    pub skipped: Vec<(String, SetOutcome)>,
}

impl FillReport {
    /// Whether every entry was applied.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Apply every entry of `fields` to `doc`, in table order.
///
/// Entries the document cannot take are logged and reported, never fatal.
pub fn fill_form<D: FormDocument + ?Sized>(
    doc: &mut D,
    fields: &FieldTable,
    options: &FillOptions,
) -> Result<FillReport> {
    let mut report = FillReport::default();

    for (name, value) in fields {
        if options.verbose {
            log::info!("Field name = '{}', New field value: '{}'", name, value);
        }
        match doc.set_field(name, value)? {
            SetOutcome::Filled => report.filled.push(name.clone()),
            outcome => {
                log::warn!("skipping field '{}': {}", name, outcome.describe());
                report.skipped.push((name.clone(), outcome));
            },
        }
    }

    log::debug!(
        "filled {} fields, skipped {}",
        report.filled.len(),
        report.skipped.len()
    );
    Ok(report)
}

/// Print the document's field names inside the `Field names:` frame.
pub fn write_field_list<D: FormDocument + ?Sized, W: Write>(doc: &D, out: &mut W) -> Result<()> {
    writeln!(out, "Field names:")?;
    for name in doc.field_names() {
        writeln!(out, "{}", name)?;
    }
    writeln!(out, "END: Field names")?;
    Ok(())
}

/// Finalize `doc` into `output`, or stdout when no path is given.
///
/// A file is first written next to its destination and renamed into place
/// once complete; on failure the temporary file is removed.
pub fn write_output<D: FormDocument>(doc: D, flatten: bool, output: Option<&Path>) -> Result<()> {
    let Some(path) = output else {
        let stdout = io::stdout();
        return doc.finalize(flatten, BufWriter::new(stdout.lock()));
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir).map_err(|e| Error::from_open(e, dir))?;
    doc.finalize(flatten, BufWriter::new(temp.as_file_mut()))?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    log::debug!("wrote {}", path.display());
    Ok(())
}

/// Run one command: list the fields of a document, or fill it.
pub fn run(config: &FillerConfig) -> Result<()> {
    let mut form = PdfForm::open(&config.document)?;

    match config.operation {
        Operation::List => {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            write_field_list(&form, &mut out)?;
            out.flush()?;
            Ok(())
        },
        Operation::Fill => {
            if let Some(font) = &config.font {
                form.substitute_font(SubstitutionFont::load(font)?)?;
            }
            let source = FieldSource::from_option(config.fields.as_deref());
            let fields = source.read_fields(&config.encoding)?;
            let options = config.fill_options();

            let report = fill_form(&mut form, &fields, &options)?;
            if !report.is_complete() {
                log::info!("{} of {} fields were not filled", report.skipped.len(), fields.len());
            }
            write_output(form, options.flatten, config.output.as_deref())
        },
    }
}
