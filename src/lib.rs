//! # PDF Form Fill
//!
//! Fill the interactive form of a PDF from a plain text field list.
//!
//! ## Core Features
//!
//! - **Field lists**: one `name value` per line, `[name with spaces] value`
//!   for awkward names, `\n`, `\p` and `\\` escapes in values
//! - **Any encoding**: field lists are decoded with any WHATWG label
//!   (`utf-8`, `windows-1251`, `koi8-r`, ...)
//! - **Appearances**: text and choice fields get regenerated appearance
//!   streams; checkboxes and radio buttons switch appearance state
//! - **Font substitution**: embed a TrueType font so Cyrillic, Greek or CJK
//!   values render
//! - **Flattening**: stamp the filled fields into the page content
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdf_form_fill::document::{FormDocument, PdfForm};
//! use pdf_form_fill::fields::parse_fields;
//! use pdf_form_fill::fill::{fill_form, FillOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut form = PdfForm::open("application.pdf")?;
//! let fields = parse_fields("surname Doe\n[given name] Jane\nagree Yes");
//!
//! let report = fill_form(&mut form, &fields, &FillOptions::default())?;
//! println!("filled {} fields", report.filled.len());
//!
//! let out = std::fs::File::create("filled.pdf")?;
//! form.finalize(false, out)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod fields;
pub mod fill;

pub use config::{FillerConfig, Operation};
pub use error::{Error, Result};
pub use fill::run;
