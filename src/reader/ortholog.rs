use crate::utils::get_reader_from_path;
use anyhow::{bail, Context};
use std::io::BufRead;
use std::path::Path;
use tracing::info;

/// The number of tab-separated columns of an ortholog table exported from
/// BioMart: gene, transcript and protein stable IDs of the reference species,
/// followed by a (gene stable ID, query protein or transcript ID) pair for each
/// of the six [`Species`].
pub const ORTHOLOG_COLUMNS: usize = 15;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// The species of the ortholog columns, in column order.
///
/// The declaration order is also the priority order used when picking the
/// query identifier of a row.
pub enum Species {
    Mouse,
    Dog,
    Elephant,
    Chicken,
    Zebrafish,
    Macaque,
}

impl Species {
    pub const ALL: [Species; 6] = [
        Species::Mouse,
        Species::Dog,
        Species::Elephant,
        Species::Chicken,
        Species::Zebrafish,
        Species::Macaque,
    ];

    fn index(&self) -> usize {
        *self as usize
    }

    /// The 0-based column holding this species' ortholog gene stable ID.
    pub fn gene_column(&self) -> usize {
        3 + 2 * self.index()
    }

    /// The 0-based column holding this species' query protein or transcript ID.
    pub fn query_column(&self) -> usize {
        4 + 2 * self.index()
    }
}

impl std::fmt::Display for Species {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Species::Mouse => write!(f, "mouse"),
            Species::Dog => write!(f, "dog"),
            Species::Elephant => write!(f, "elephant"),
            Species::Chicken => write!(f, "chicken"),
            Species::Zebrafish => write!(f, "zebrafish"),
            Species::Macaque => write!(f, "macaque"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// The ortholog columns of one species. Either field may be empty.
pub struct SpeciesOrtholog {
    pub gene_id: String,
    pub query_id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// One data line of an ortholog table.
pub struct OrthologRow {
    pub gene_id: String,
    pub transcript_id: String,
    pub protein_id: String,
    /// Indexed by [`Species`] declaration order.
    pub orthologs: [SpeciesOrtholog; 6],
}

impl OrthologRow {
    /// Builds a row from its fields. Fields past [`ORTHOLOG_COLUMNS`] are ignored.
    ///
    /// # Errors
    ///
    /// Fails if fewer than [`ORTHOLOG_COLUMNS`] fields are given.
    pub fn from_fields<T: AsRef<str>>(fields: &[T]) -> anyhow::Result<OrthologRow> {
        if fields.len() < ORTHOLOG_COLUMNS {
            bail!(
                "expected {} tab-separated columns but found {}",
                ORTHOLOG_COLUMNS,
                fields.len()
            );
        }
        let field = |i: usize| fields[i].as_ref().to_string();
        let orthologs = Species::ALL.map(|sp| SpeciesOrtholog {
            gene_id: field(sp.gene_column()),
            query_id: field(sp.query_column()),
        });
        Ok(OrthologRow {
            gene_id: field(0),
            transcript_id: field(1),
            protein_id: field(2),
            orthologs,
        })
    }

    /// The ortholog columns of `species` in this row.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use txwrangle::reader::{OrthologRow, Species};
    ///
    /// let mut fields = vec![""; 15];
    /// fields[..5].copy_from_slice(&["ENSG1", "ENST1", "ENSP1", "ENSMUSG1", "ENSMUSP1"]);
    /// let row = OrthologRow::from_fields(&fields)?;
    /// assert_eq!(row.ortholog(Species::Mouse).query_id, "ENSMUSP1");
    /// assert!(row.ortholog(Species::Dog).gene_id.is_empty());
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn ortholog(&self, species: Species) -> &SpeciesOrtholog {
        &self.orthologs[species.index()]
    }

    /// The six query identifiers in species priority order, empty ones included.
    pub fn query_ids(&self) -> impl Iterator<Item = (Species, &str)> + '_ {
        Species::ALL
            .into_iter()
            .map(move |sp| (sp, self.ortholog(sp).query_id.as_str()))
    }
}

/// Reads every data row of a tab-separated ortholog table, skipping the header line.
///
/// # Arguments
///
/// * `rdr` - a buffered reader over the table, header line first.
///
/// # Returns
///
/// The data rows in file order. Fields are split on tabs and taken verbatim: no
/// quoting, no trimming. A blank line is a row with no fields, so like any other
/// line with fewer than [`ORTHOLOG_COLUMNS`] fields it aborts the read with an
/// error naming the line. Input without a header line is an error too.
pub fn read_ortholog_rows<R: BufRead>(rdr: R) -> anyhow::Result<Vec<OrthologRow>> {
    let mut lines = rdr.lines();
    match lines.next() {
        Some(header) => {
            header.context("failed to read the ortholog table header")?;
        }
        None => bail!("the ortholog table is empty; expected a header line"),
    }

    let mut rows = Vec::new();
    for (i, line) in lines.enumerate() {
        // the header is line 1
        let line_no = i + 2;
        let line = line.with_context(|| format!("failed to read ortholog table line {}", line_no))?;
        let line = line.strip_suffix('\r').unwrap_or(line.as_str());
        let fields: Vec<&str> = if line.is_empty() {
            Vec::new()
        } else {
            line.split('\t').collect()
        };
        let row = OrthologRow::from_fields(&fields)
            .with_context(|| format!("malformed ortholog table line {}", line_no))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Reads a plain or gzipped ortholog table from `file_path`.
pub fn read_ortholog_table<T: AsRef<Path>>(file_path: T) -> anyhow::Result<Vec<OrthologRow>> {
    let path = file_path.as_ref();
    let rdr = get_reader_from_path(path)?;
    let rows = read_ortholog_rows(rdr)
        .with_context(|| format!("failed to read ortholog table {:?}", path.display()))?;
    info!("Read {} ortholog rows from {:?}", rows.len(), path.display());
    Ok(rows)
}
