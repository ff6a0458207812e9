//! Configuration for a form filler run.

use std::path::PathBuf;

use crate::fields::DEFAULT_ENCODING;
use crate::fill::FillOptions;

/// What to do with the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operation {
    /// Apply a field list and write the result
    #[default]
    Fill,
    /// Print the names of the document's fields
    List,
}

/// Form filler configuration.
#[derive(Debug, Clone)]
pub struct FillerConfig {
    /// Document to fill or list.
    pub document: PathBuf,

    /// Fill or list.
    pub operation: Operation,

    /// Field list file; standard input when absent.
    pub fields: Option<PathBuf>,

    /// Encoding label of the field list.
    pub encoding: String,

    /// TrueType font for values outside Latin-1.
    pub font: Option<PathBuf>,

    /// Flatten the form after filling.
    pub flatten: bool,

    /// Log every assignment.
    pub verbose: bool,

    /// Output document; standard output when absent.
    pub output: Option<PathBuf>,
}

impl Default for FillerConfig {
    fn default() -> Self {
        Self::new(PathBuf::new())
    }
}

impl FillerConfig {
    /// Create new configuration with defaults for `document`.
    pub fn new(document: impl Into<PathBuf>) -> Self {
        Self {
            document: document.into(),
            operation: Operation::Fill,
            fields: None,
            encoding: DEFAULT_ENCODING.to_string(),
            font: None,
            flatten: false,
            verbose: false,
            output: None,
        }
    }

    /// Select the operation.
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = operation;
        self
    }

    /// Read the field list from a file instead of stdin.
    pub fn with_fields(mut self, fields: Option<PathBuf>) -> Self {
        self.fields = fields;
        self
    }

    /// Set the field list encoding label.
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    /// Embed a substitution font.
    pub fn with_font(mut self, font: Option<PathBuf>) -> Self {
        self.font = font;
        self
    }

    /// Flatten the filled form.
    pub fn with_flatten(mut self, enable: bool) -> Self {
        self.flatten = enable;
        self
    }

    /// Log every assignment.
    pub fn with_verbose(mut self, enable: bool) -> Self {
        self.verbose = enable;
        self
    }

    /// Write the result to a file instead of stdout.
    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        self.output = output;
        self
    }

    /// Options for the fill step.
    pub fn fill_options(&self) -> FillOptions {
        FillOptions {
            flatten: self.flatten,
            verbose: self.verbose,
        }
    }
}
