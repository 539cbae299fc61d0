//! Resolution of ortholog query identifiers to representative transcripts.
//!
//! Every row of an ortholog table names, per species, the human protein or
//! transcript that was used as the query for that ortholog. The first non-empty
//! query identifier of a row (in [`Species`] order) is taken as the row's
//! representative. Transcript identifiers are kept as they are, protein
//! identifiers are mapped back to their transcript through the table itself.

use crate::options::{DuplicatePolicy, ResolveOptions};
use crate::reader::ortholog::{read_ortholog_table, OrthologRow, Species};
use crate::utils::{PROTEIN_MARKER, TRANSCRIPT_MARKER};
use anyhow::{bail, Context};
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// The de-duplicated representative transcript identifiers.
pub type RepresentativeTranscriptSet = BTreeSet<String>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// What an Ensembl stable identifier refers to, judged by the markers it contains.
pub enum IdentifierKind {
    Transcript,
    Protein,
    Unrecognized,
}

/// The transcript marker wins if an identifier contains both.
pub fn classify(id: &str) -> IdentifierKind {
    if id.contains(TRANSCRIPT_MARKER) {
        IdentifierKind::Transcript
    } else if id.contains(PROTEIN_MARKER) {
        IdentifierKind::Protein
    } else {
        IdentifierKind::Unrecognized
    }
}

/// Returns the first non-empty query identifier of `row` in species priority order
/// (mouse, dog, elephant, chicken, zebrafish, macaque), or [`None`] if all six are empty.
pub fn select_query_id(row: &OrthologRow) -> Option<(Species, &str)> {
    row.query_ids().find(|(_, q)| !q.is_empty())
}

#[derive(Clone, Debug, Default)]
/// Maps protein stable IDs to the transcript stable ID they are translated from.
pub struct ProteinToTranscriptIndex {
    map: HashMap<String, String>,
    conflicts: usize,
}

impl ProteinToTranscriptIndex {
    /// Indexes every row with a non-empty protein ID.
    ///
    /// When a protein ID appears more than once, `policy` decides which transcript is
    /// kept. Repeats that point at a different transcript are counted as conflicts.
    pub fn build<'a, I>(rows: I, policy: DuplicatePolicy) -> ProteinToTranscriptIndex
    where
        I: IntoIterator<Item = &'a OrthologRow>,
    {
        let mut idx = ProteinToTranscriptIndex::default();
        for row in rows {
            if row.protein_id.is_empty() {
                continue;
            }
            idx.insert(&row.protein_id, &row.transcript_id, policy);
        }
        if idx.conflicts > 0 {
            warn!(
                "{} protein IDs map to more than one transcript ID; kept the {} one.",
                idx.conflicts, policy
            );
        }
        debug!("Indexed {} protein IDs.", idx.len());
        idx
    }

    fn insert(&mut self, protein_id: &str, transcript_id: &str, policy: DuplicatePolicy) {
        match self.map.entry(protein_id.to_string()) {
            Entry::Occupied(mut e) => {
                if e.get().as_str() != transcript_id {
                    self.conflicts += 1;
                    if policy == DuplicatePolicy::LastWins {
                        e.insert(transcript_id.to_string());
                    }
                }
            }
            Entry::Vacant(e) => {
                e.insert(transcript_id.to_string());
            }
        }
    }

    /// Looks up the transcript a protein ID belongs to.
    ///
    /// # Arguments
    ///
    /// * `protein_id` - an Ensembl protein stable ID, matched exactly.
    ///
    /// # Returns
    ///
    /// The transcript ID kept for `protein_id`, or `None` if no row carries it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use txwrangle::options::DuplicatePolicy;
    /// use txwrangle::reader::OrthologRow;
    /// use txwrangle::resolver::ProteinToTranscriptIndex;
    ///
    /// let mut fields = vec![""; 15];
    /// fields[..3].copy_from_slice(&["ENSG1", "ENST1", "ENSP1"]);
    /// let rows = vec![OrthologRow::from_fields(&fields)?];
    /// let idx = ProteinToTranscriptIndex::build(&rows, DuplicatePolicy::LastWins);
    /// assert_eq!(idx.get("ENSP1"), Some("ENST1"));
    /// assert_eq!(idx.get("ENSP2"), None);
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn get(&self, protein_id: &str) -> Option<&str> {
        self.map.get(protein_id).map(|s| s.as_str())
    }

    /// The number of distinct protein IDs indexed.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The number of repeated protein IDs that disagreed on their transcript.
    pub fn conflicts(&self) -> usize {
        self.conflicts
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// Per-run counters of how the rows of a table were resolved.
pub struct ResolveSummary {
    pub rows: usize,
    /// Rows whose six query identifiers were all empty.
    pub skipped_empty: usize,
    /// Rows whose selected query identifier was a transcript ID.
    pub from_transcript: usize,
    /// Rows whose selected query identifier was a protein ID found in the index.
    pub from_protein: usize,
    /// Rows whose selected query identifier was neither a transcript nor a protein ID.
    pub dropped_unrecognized: usize,
    /// The size of the resulting set.
    pub unique_transcripts: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// The outcome of resolving a single row.
pub enum RowResolution {
    /// The selected query identifier is itself a transcript ID.
    Transcript(String),
    /// The selected query identifier is a protein ID, translated from `transcript_id`.
    Protein {
        protein_id: String,
        transcript_id: String,
    },
    /// No query identifier was present.
    NoQuery,
    /// The selected identifier was of neither form and is ignored.
    Unrecognized(String),
}

impl RowResolution {
    /// The transcript ID this row contributes, if any.
    pub fn transcript_id(&self) -> Option<&str> {
        match self {
            RowResolution::Transcript(tx) => Some(tx.as_str()),
            RowResolution::Protein { transcript_id, .. } => Some(transcript_id.as_str()),
            RowResolution::NoQuery | RowResolution::Unrecognized(_) => None,
        }
    }
}

/// Resolves one row against `index`.
///
/// # Errors
///
/// Fails if the selected identifier is a protein ID that `index` does not know.
pub fn resolve_row(
    row: &OrthologRow,
    index: &ProteinToTranscriptIndex,
) -> anyhow::Result<RowResolution> {
    let Some((species, query_id)) = select_query_id(row) else {
        return Ok(RowResolution::NoQuery);
    };
    match classify(query_id) {
        IdentifierKind::Transcript => Ok(RowResolution::Transcript(query_id.to_string())),
        IdentifierKind::Protein => match index.get(query_id) {
            Some(tx) => Ok(RowResolution::Protein {
                protein_id: query_id.to_string(),
                transcript_id: tx.to_string(),
            }),
            None => bail!(
                "protein ID {:?} ({} query of gene {:?}) is not present in the protein to transcript index",
                query_id,
                species,
                row.gene_id
            ),
        },
        IdentifierKind::Unrecognized => Ok(RowResolution::Unrecognized(query_id.to_string())),
    }
}

/// Resolves every row to its representative transcript and de-duplicates the result.
///
/// The protein index is built from the same rows. The first row whose protein ID is
/// missing from the index aborts the whole computation.
pub fn resolve_representative_transcripts(
    rows: &[OrthologRow],
    policy: DuplicatePolicy,
) -> anyhow::Result<(RepresentativeTranscriptSet, ResolveSummary)> {
    let index = ProteinToTranscriptIndex::build(rows, policy);

    let mut set = RepresentativeTranscriptSet::new();
    let mut summary = ResolveSummary {
        rows: rows.len(),
        ..Default::default()
    };

    for (i, row) in rows.iter().enumerate() {
        let resolution = resolve_row(row, &index)
            .with_context(|| format!("failed to resolve ortholog data row {}", i + 1))?;
        match resolution {
            RowResolution::Transcript(tx) => {
                summary.from_transcript += 1;
                set.insert(tx);
            }
            RowResolution::Protein { transcript_id, .. } => {
                summary.from_protein += 1;
                set.insert(transcript_id);
            }
            RowResolution::NoQuery => summary.skipped_empty += 1,
            RowResolution::Unrecognized(id) => {
                debug!("Ignoring unrecognized query ID {:?} of gene {:?}", id, row.gene_id);
                summary.dropped_unrecognized += 1;
            }
        }
    }
    summary.unique_transcripts = set.len();

    if summary.dropped_unrecognized > 0 {
        warn!(
            "Dropped {} rows whose query ID is neither a transcript ({}) nor a protein ({}) ID.",
            summary.dropped_unrecognized, TRANSCRIPT_MARKER, PROTEIN_MARKER
        );
    }
    info!(
        "Resolved {} rows: {} via transcript IDs, {} via protein IDs, {} without a query ID. {} unique transcripts.",
        summary.rows,
        summary.from_transcript,
        summary.from_protein,
        summary.skipped_empty,
        summary.unique_transcripts
    );
    Ok((set, summary))
}

/// Writes `set` to `file_path` as a JSON array of strings, replacing any existing file.
pub fn write_transcript_set<T: AsRef<Path>>(
    set: &RepresentativeTranscriptSet,
    file_path: T,
    pretty: bool,
) -> anyhow::Result<()> {
    let path = file_path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("failed to create output file {:?}", path.display()))?;
    let mut writer = BufWriter::new(file);
    if pretty {
        serde_json::to_writer_pretty(&mut writer, set)?;
    } else {
        serde_json::to_writer(&mut writer, set)?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to write output file {:?}", path.display()))?;
    Ok(())
}

/// Runs the whole resolver: read the table, resolve, write the JSON array.
///
/// The output file is only created once resolution has succeeded, so a failed run
/// leaves any previous output untouched.
pub fn run_resolver(opts: &ResolveOptions) -> anyhow::Result<ResolveSummary> {
    let rows = read_ortholog_table(&opts.input)?;
    let (set, summary) = resolve_representative_transcripts(&rows, opts.duplicate_policy)?;
    write_transcript_set(&set, &opts.output, opts.pretty)?;
    info!(
        "Wrote {} representative transcripts to {:?}",
        set.len(),
        opts.output.display()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::ortholog::SpeciesOrtholog;

    fn row(transcript_id: &str, protein_id: &str, queries: [&str; 6]) -> OrthologRow {
        OrthologRow {
            gene_id: String::from("ENSG00000000001"),
            transcript_id: transcript_id.to_string(),
            protein_id: protein_id.to_string(),
            orthologs: queries.map(|q| SpeciesOrtholog {
                gene_id: if q.is_empty() {
                    String::new()
                } else {
                    String::from("ENSMUSG00000000001")
                },
                query_id: q.to_string(),
            }),
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("ENST00000001"), IdentifierKind::Transcript);
        assert_eq!(classify("ENSP00000001"), IdentifierKind::Protein);
        // substring, not prefix
        assert_eq!(classify("xENST1"), IdentifierKind::Transcript);
        assert_eq!(classify("ENSG00000001"), IdentifierKind::Unrecognized);
        assert_eq!(classify(""), IdentifierKind::Unrecognized);
    }

    #[test]
    fn test_select_query_id_priority() {
        let r = row("ENST1", "", ["", "ENST00000001", "", "", "", ""]);
        assert_eq!(select_query_id(&r), Some((Species::Dog, "ENST00000001")));

        let r = row("ENST1", "", ["", "", "", "ENSP2", "", "ENST3"]);
        assert_eq!(select_query_id(&r), Some((Species::Chicken, "ENSP2")));

        let r = row("ENST1", "", ["ENST9", "ENSP8", "", "", "", ""]);
        assert_eq!(select_query_id(&r), Some((Species::Mouse, "ENST9")));

        let r = row("ENST1", "", [""; 6]);
        assert_eq!(select_query_id(&r), None);
    }

    #[test]
    fn test_index_duplicate_policy() {
        let rows = vec![
            row("ENST_A", "ENSP1", [""; 6]),
            row("ENST_B", "ENSP1", [""; 6]),
            row("ENST_C", "ENSP2", [""; 6]),
            row("ENST_C", "ENSP2", [""; 6]),
            row("ENST_D", "", [""; 6]),
        ];

        let last = ProteinToTranscriptIndex::build(&rows, DuplicatePolicy::LastWins);
        assert_eq!(last.len(), 2);
        assert_eq!(last.get("ENSP1"), Some("ENST_B"));
        assert_eq!(last.get("ENSP2"), Some("ENST_C"));
        assert_eq!(last.conflicts(), 1);
        assert_eq!(last.get(""), None);

        let first = ProteinToTranscriptIndex::build(&rows, DuplicatePolicy::FirstWins);
        assert_eq!(first.get("ENSP1"), Some("ENST_A"));
        assert_eq!(first.conflicts(), 1);
    }

    #[test]
    fn test_resolve_row() {
        let rows = vec![row("ENST00000555", "ENSP00000999", [""; 6])];
        let index = ProteinToTranscriptIndex::build(&rows, DuplicatePolicy::default());

        let r = row("ENST1", "", ["ENSP00000999", "", "", "", "", ""]);
        let res = resolve_row(&r, &index).unwrap();
        assert_eq!(res.transcript_id(), Some("ENST00000555"));
        assert_eq!(
            res,
            RowResolution::Protein {
                protein_id: String::from("ENSP00000999"),
                transcript_id: String::from("ENST00000555"),
            }
        );

        let r = row("ENST1", "", ["", "ENST00000001", "", "", "", ""]);
        assert_eq!(
            resolve_row(&r, &index).unwrap(),
            RowResolution::Transcript(String::from("ENST00000001"))
        );

        let r = row("ENST1", "", [""; 6]);
        assert_eq!(resolve_row(&r, &index).unwrap(), RowResolution::NoQuery);

        let r = row("ENST1", "", ["", "", "ENSLAFG00000001", "ENST2", "", ""]);
        let res = resolve_row(&r, &index).unwrap();
        assert_eq!(res, RowResolution::Unrecognized(String::from("ENSLAFG00000001")));
        assert_eq!(res.transcript_id(), None);

        let r = row("ENST1", "", ["ENSP00000404", "", "", "", "", ""]);
        let err = resolve_row(&r, &index).unwrap_err();
        assert!(err.to_string().contains("ENSP00000404"));
    }

    #[test]
    fn test_resolve_representative_transcripts() {
        let rows = vec![
            row("ENST00000555", "ENSP00000999", ["ENSP00000999", "", "", "", "", ""]),
            row("ENST00000555", "", ["", "", "ENST00000555", "", "", ""]),
            row("ENST00000777", "ENSP00000777", ["", "ENST00000001", "", "", "", ""]),
            row("ENST00000888", "", [""; 6]),
            row("ENST00000889", "", ["", "", "", "", "MGP_001", ""]),
        ];
        let (set, summary) =
            resolve_representative_transcripts(&rows, DuplicatePolicy::LastWins).unwrap();

        assert_eq!(
            set.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            vec!["ENST00000001", "ENST00000555"]
        );
        assert_eq!(
            summary,
            ResolveSummary {
                rows: 5,
                skipped_empty: 1,
                from_transcript: 2,
                from_protein: 1,
                dropped_unrecognized: 1,
                unique_transcripts: 2,
            }
        );
    }

    #[test]
    fn test_missing_protein_aborts() {
        let rows = vec![
            row("ENST00000555", "ENSP00000999", ["ENST00000555", "", "", "", "", ""]),
            row("ENST00000556", "", ["ENSP00000123", "", "", "", "", ""]),
        ];
        let err = resolve_representative_transcripts(&rows, DuplicatePolicy::LastWins).unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("data row 2"), "{}", msg);
        assert!(msg.contains("ENSP00000123"), "{}", msg);
    }
}
