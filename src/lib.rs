//! txwrangle bundles two small batch jobs used when preparing Ensembl annotation data:
//!
//! * the **GTF extractor** ([`extract::run_extractor`]) loads a GTF file into a
//!   [Polars](https://pola.rs/) data frame ([`Annotation`]) and keeps the records whose
//!   attribute matches a value, typically all records of one `gene_id`;
//! * the **ortholog resolver** ([`resolver::run_resolver`]) reads an ortholog table
//!   exported from BioMart and writes the de-duplicated list of representative
//!   transcript IDs as a JSON array.

pub mod annotation;
pub mod extract;
pub mod options;
pub mod reader;
pub mod resolver;
pub mod utils;
pub use annotation::Annotation;
pub use options::{DuplicatePolicy, ExtractOptions, ResolveOptions};
pub use resolver::{RepresentativeTranscriptSet, ResolveSummary};
