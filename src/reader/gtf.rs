use crate::utils::{get_reader_from_path, GTF_ESSENTIAL_ATTRIBUTES};
use anyhow::Context;
use noodles::gtf;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;
use tracing::info;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// Controls which GTF attributes become columns.
///
/// * `Essential` - only the attributes listed in [`GTF_ESSENTIAL_ATTRIBUTES`].
/// * `Full` - every attribute key found anywhere in the file gets its own column,
///   records lacking the key hold a null.
pub enum AttributeMode {
    Essential,
    Full,
}

impl AttributeMode {
    /// `true` maps to [`AttributeMode::Full`], `false` to [`AttributeMode::Essential`].
    pub fn from(is_full: bool) -> AttributeMode {
        if is_full {
            AttributeMode::Full
        } else {
            AttributeMode::Essential
        }
    }

    /// Whether every attribute key becomes a column.
    pub fn is_full(&self) -> bool {
        matches!(self, AttributeMode::Full)
    }
}

#[derive(Clone, Debug)]
/// Column-oriented storage of the attribute (9th) column of a GTF file.
///
/// # Fields
///
/// * `essential`: the attributes in [`GTF_ESSENTIAL_ATTRIBUTES`], always present.
/// * `extra`: every other attribute, only collected in [`AttributeMode::Full`].
/// * `tally`: the number of records pushed so far. Every vector in `essential` and
///   `extra` has exactly `tally` entries.
pub struct Attributes {
    pub essential: HashMap<String, Vec<Option<String>>>,
    pub extra: Option<HashMap<String, Vec<Option<String>>>>,
    pub tally: usize,
}

impl Attributes {
    /// Creates empty attribute storage. The essential columns always exist; the map
    /// of extra columns only exists in [`AttributeMode::Full`].
    pub fn new(mode: AttributeMode) -> Attributes {
        let essential = HashMap::from_iter(
            GTF_ESSENTIAL_ATTRIBUTES
                .iter()
                .map(|s| (s.to_string(), Vec::with_capacity(1_0000))),
        );

        let extra = if mode.is_full() {
            Some(HashMap::with_capacity(100))
        } else {
            None
        };
        Attributes {
            essential,
            extra,
            tally: 0,
        }
    }

    /// Adds the attributes of one record. `hm` is drained of every key that was stored.
    ///
    /// A key seen for the first time is back-filled with `tally` nulls so that all
    /// columns stay aligned with the records.
    fn push(&mut self, hm: &mut HashMap<String, String>) {
        for &ea in GTF_ESSENTIAL_ATTRIBUTES.iter() {
            if let Some(vec) = self.essential.get_mut(ea) {
                vec.push(hm.remove(ea))
            };
        }

        if let Some(extra) = &mut self.extra {
            extra.iter_mut().for_each(|(k, v)| {
                v.push(hm.remove(k));
            });

            for (attr_name, attr_value) in hm.drain() {
                extra.insert(attr_name, {
                    let mut vec = vec![None; self.tally];
                    vec.push(Some(attr_value));
                    vec
                });
            }
        }

        self.tally += 1;
    }

    /// The extra attribute names sorted alphabetically, an empty vector in
    /// [`AttributeMode::Essential`].
    pub fn extra_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = match &self.extra {
            Some(extra) => extra.keys().map(|k| k.as_str()).collect(),
            None => Vec::new(),
        };
        names.sort_unstable();
        names
    }
}

#[derive(Clone, Debug)]
/// All information in a GTF file, stored column by column so that it can be
/// turned into a polars data frame without another pass.
///
/// # Fields
///
/// * `seqid`: the reference sequence (chromosome/contig) names.
/// * `source`: annotation sources such as HAVANA or ENSEMBL.
/// * `feature_type`: gene, transcript, exon, CDS, start_codon, ...
/// * `start`, `end`: 1-based closed coordinates.
/// * `score`: optional scores, `.` is read as null.
/// * `strand`: optional strands.
/// * `frame`: optional reading frames of CDS-like features.
/// * `attributes`: the parsed attribute column.
/// * `comments`: the comment lines, without the leading `#`.
pub struct GStruct {
    pub seqid: Vec<String>,
    pub source: Vec<String>,
    pub feature_type: Vec<String>,
    pub start: Vec<i64>,
    pub end: Vec<i64>,
    pub score: Vec<Option<f32>>,
    pub strand: Vec<Option<String>>,
    pub frame: Vec<Option<String>>,
    pub attributes: Attributes,
    pub comments: Vec<String>,
}

impl GStruct {
    /// Creates an empty [`GStruct`] whose attributes are collected as `attribute_mode` says.
    pub fn new(attribute_mode: AttributeMode) -> GStruct {
        GStruct {
            seqid: Vec::with_capacity(1_0000),
            source: Vec::with_capacity(1_0000),
            feature_type: Vec::with_capacity(1_0000),
            start: Vec::with_capacity(1_0000),
            end: Vec::with_capacity(1_0000),
            score: Vec::with_capacity(1_0000),
            strand: Vec::with_capacity(1_0000),
            frame: Vec::with_capacity(1_0000),
            attributes: Attributes::new(attribute_mode),
            comments: Vec::new(),
        }
    }

    /// Reads a plain or gzipped GTF file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened or if any line is not a valid GTF record
    /// or comment; the error names the file.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use txwrangle::reader::gtf::{AttributeMode, GStruct};
    ///
    /// let gs = GStruct::from_gtf("genes.gtf.gz", AttributeMode::Full)?;
    /// println!("{} records", gs.len());
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn from_gtf<T: AsRef<Path>>(file_path: T, am: AttributeMode) -> anyhow::Result<GStruct> {
        let path = file_path.as_ref();
        let rdr = get_reader_from_path(path)?;
        GStruct::from_reader(rdr, am)
            .with_context(|| format!("failed to parse GTF file {:?}", path.display()))
    }

    /// Reads GTF content from an already opened (and decompressed) reader.
    ///
    /// # Arguments
    ///
    /// * `rdr` - the GTF text, comments included.
    /// * `am` - which attributes to keep as columns.
    ///
    /// # Returns
    ///
    /// The records column by column, in file order, plus the comment lines.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use txwrangle::reader::gtf::{AttributeMode, GStruct};
    ///
    /// let gtf = b"chr1\tHAVANA\texon\t11\t20\t.\t+\t.\tgene_id \"g1\"; exon_number 1;\n";
    /// let gs = GStruct::from_reader(&gtf[..], AttributeMode::Essential)?;
    /// assert_eq!(gs.len(), 1);
    /// assert_eq!(gs.feature_type, vec!["exon"]);
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn from_reader<R: BufRead>(rdr: R, am: AttributeMode) -> anyhow::Result<GStruct> {
        let mut gs = GStruct::new(am);
        let mut rdr = gtf::Reader::new(rdr);
        gs.parse_lines(&mut rdr)?;
        Ok(gs)
    }

    fn parse_lines<T: BufRead>(&mut self, rdr: &mut gtf::Reader<T>) -> anyhow::Result<()> {
        // reused for the attributes of each record
        let mut rec_attr_hm: HashMap<String, String> = HashMap::with_capacity(100);
        let mut n_records = 0usize;

        for l in rdr.lines() {
            let line = l.with_context(|| format!("invalid GTF line after record {}", n_records))?;
            match line {
                gtf::Line::Record(r) => {
                    n_records += 1;

                    self.seqid.push(r.reference_sequence_name().to_string());
                    self.source.push(r.source().to_string());
                    self.feature_type.push(r.ty().to_string());
                    self.start.push(r.start().get() as i64);
                    self.end.push(r.end().get() as i64);
                    self.score.push(r.score());
                    self.strand.push(r.strand().map(|st| st.as_ref().to_owned()));
                    self.frame.push(r.frame().map(|ph| ph.to_string()));

                    rec_attr_hm.clear();
                    for attr in r.attributes().iter() {
                        rec_attr_hm.insert(attr.key().to_string(), attr.value().to_string());
                    }
                    self.attributes.push(&mut rec_attr_hm);
                }
                gtf::Line::Comment(c) => {
                    self.comments.push(c);
                }
            }
        }
        info!(
            "Finished parsing the GTF input. Found {} comments and {} records.",
            self.comments.len(),
            n_records
        );
        Ok(())
    }

    /// The number of records read.
    pub fn len(&self) -> usize {
        self.seqid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seqid.is_empty()
    }
}
