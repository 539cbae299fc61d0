use std::path::PathBuf;

/// The ortholog table read by the resolver when no input is given.
pub const DEFAULT_ORTHOLOG_TABLE: &str = "representative_protein_ids_ensembl.txt";
/// The JSON array written by the resolver when no output is given.
pub const DEFAULT_REPRESENTATIVE_TRANSCRIPTS: &str = "representative_transcripts.txt";
/// The GTF attribute the extractor filters on when no column is given.
pub const DEFAULT_FILTER_COLUMN: &str = "gene_id";

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
/// Which transcript a protein ID keeps when it occurs on several rows of an
/// ortholog table with different transcript IDs.
///
/// * `LastWins` - the transcript of the last such row. This is the default.
/// * `FirstWins` - the transcript of the first such row.
pub enum DuplicatePolicy {
    #[default]
    LastWins,
    FirstWins,
}

impl std::fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DuplicatePolicy::LastWins => write!(f, "last"),
            DuplicatePolicy::FirstWins => write!(f, "first"),
        }
    }
}

impl std::str::FromStr for DuplicatePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<DuplicatePolicy> {
        let p = match s.to_lowercase().as_str() {
            "last" | "last-wins" => DuplicatePolicy::LastWins,
            "first" | "first-wins" => DuplicatePolicy::FirstWins,
            _ => anyhow::bail!("Cannot parse the duplicate policy {:?}.", s),
        };
        Ok(p)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Configuration of one run of the ortholog resolver.
///
/// # Fields
///
/// * `input`: the tab-separated ortholog table (plain or gzipped).
/// * `output`: where the JSON array of transcript IDs is written.
/// * `duplicate_policy`: how repeated protein IDs are indexed.
/// * `pretty`: write indented JSON instead of a single line.
///
/// # Examples
///
/// ```rust
/// use txwrangle::options::{DuplicatePolicy, ResolveOptions};
///
/// let opts = ResolveOptions::default();
/// assert_eq!(opts.input.to_str(), Some("representative_protein_ids_ensembl.txt"));
/// assert_eq!(opts.duplicate_policy, DuplicatePolicy::LastWins);
///
/// let opts = ResolveOptions::new("orthologs.tsv.gz", "out.json");
/// assert!(!opts.pretty);
/// ```
pub struct ResolveOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub duplicate_policy: DuplicatePolicy,
    pub pretty: bool,
}

impl Default for ResolveOptions {
    fn default() -> ResolveOptions {
        ResolveOptions {
            input: PathBuf::from(DEFAULT_ORTHOLOG_TABLE),
            output: PathBuf::from(DEFAULT_REPRESENTATIVE_TRANSCRIPTS),
            duplicate_policy: DuplicatePolicy::default(),
            pretty: false,
        }
    }
}

impl ResolveOptions {
    pub fn new<I: Into<PathBuf>, O: Into<PathBuf>>(input: I, output: O) -> ResolveOptions {
        ResolveOptions {
            input: input.into(),
            output: output.into(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Configuration of one run of the GTF extractor.
///
/// # Fields
///
/// * `gtf_file`: the annotation to read (plain or gzipped).
/// * `transcript_bed`: accepted for compatibility with existing pipeline calls; not read.
/// * `column`: the column the filter applies to, `gene_id` by default.
/// * `values`: the accepted values of `column`. A row is kept if it equals any of them.
/// * `contains`: match rows whose `column` contains any of `values` instead of equalling it.
/// * `feature_type`: if set, only rows of this feature type (gene, exon, CDS, ...) are kept.
/// * `only_essential`: only materialize gene_id, gene_name, transcript_id and exon_number
///   instead of every attribute of the file.
pub struct ExtractOptions {
    pub gtf_file: PathBuf,
    pub transcript_bed: Option<PathBuf>,
    pub column: String,
    pub values: Vec<String>,
    pub contains: bool,
    pub feature_type: Option<String>,
    pub only_essential: bool,
}

impl ExtractOptions {
    /// Options for the plain equality filter `gene_id == gene_id`.
    ///
    /// ```rust
    /// use txwrangle::options::ExtractOptions;
    ///
    /// let opts = ExtractOptions::new("genes.gtf", "ENSG00000287777.1");
    /// assert_eq!(opts.column, "gene_id");
    /// assert_eq!(opts.values, vec![String::from("ENSG00000287777.1")]);
    /// ```
    pub fn new<P: Into<PathBuf>, T: AsRef<str>>(gtf_file: P, gene_id: T) -> ExtractOptions {
        ExtractOptions {
            gtf_file: gtf_file.into(),
            transcript_bed: None,
            column: String::from(DEFAULT_FILTER_COLUMN),
            values: vec![gene_id.as_ref().to_string()],
            contains: false,
            feature_type: None,
            only_essential: false,
        }
    }
}
