use crate::reader;
use crate::utils::{GTF_ESSENTIAL_ATTRIBUTES, GTF_FIELDS};
use anyhow::{bail, Context};
use polars::prelude::*;
use std::path::Path;
use tracing::{info, warn};

/// The fields every [`Annotation`] frame must carry.
const REQUIRED_FIELDS: [&str; 3] = ["seqname", "start", "end"];

/// Other names accepted by [`Annotation::column`], paired with the column they stand for.
const COLUMN_ALIASES: [(&str, &str); 2] = [("feature", "feature_type"), ("seqid", "seqname")];

/// A GTF annotation held in a polars [`DataFrame`], one row per record.
///
/// Columns built from a GTF file come in a fixed order: the eight record fields
/// (`seqname`, `source`, `feature_type`, `start`, `end`, `score`, `strand`, `frame`),
/// then `gene_id`, `gene_name`, `transcript_id` and `exon_number`, then every other
/// attribute sorted by name. Coordinates are 1-based and closed, as in the file.
#[derive(Clone, Debug)]
pub struct Annotation {
    /// The underlying Polars dataframe recording all annotations
    pub df: DataFrame,
    /// The comment lines of the source file
    pub comments: Vec<String>,
}

impl Annotation {
    /// Wraps `df`, which must at least have `seqname`, `start` and `end` columns.
    pub fn new(df: DataFrame, comments: Vec<String>) -> anyhow::Result<Annotation> {
        let names = df.get_column_names();
        for field in REQUIRED_FIELDS {
            if !names.contains(&field) {
                bail!(
                    "The dataframe has no {:?} column. Found columns: {:?}",
                    field,
                    names
                );
            }
        }
        Ok(Annotation { df, comments })
    }

    /// Turns a column-oriented [`reader::GStruct`] into an [`Annotation`].
    ///
    /// Essential attributes that never occur in the file are left out rather than
    /// stored as all-null columns.
    pub fn from_gstruct(gstruct: reader::GStruct) -> anyhow::Result<Annotation> {
        let reader::GStruct {
            seqid,
            source,
            feature_type,
            start,
            end,
            score,
            strand,
            frame,
            mut attributes,
            comments,
        } = gstruct;

        let mut df_vec = vec![
            Series::new(GTF_FIELDS[0], seqid),
            Series::new(GTF_FIELDS[1], source),
            Series::new(GTF_FIELDS[2], feature_type),
            Series::new(GTF_FIELDS[3], start),
            Series::new(GTF_FIELDS[4], end),
            Series::new(GTF_FIELDS[5], score),
            Series::new(GTF_FIELDS[6], strand),
            Series::new(GTF_FIELDS[7], frame),
        ];

        for name in GTF_ESSENTIAL_ATTRIBUTES {
            if let Some(v) = attributes.essential.remove(name) {
                if v.iter().any(|x| x.is_some()) {
                    df_vec.push(Series::new(name, v));
                }
            }
        }

        let extra_names: Vec<String> = attributes
            .extra_names()
            .into_iter()
            .map(String::from)
            .collect();
        if let Some(extra) = attributes.extra.as_mut() {
            for name in extra_names {
                if let Some(v) = extra.remove(&name) {
                    df_vec.push(Series::new(name.as_str(), v));
                }
            }
        }

        let df = DataFrame::new(df_vec)?;
        Annotation::new(df, comments)
    }

    /// Reads a plain or gzipped GTF file into an [`Annotation`].
    ///
    /// With `only_essential` set, the only attribute columns are `gene_id`, `gene_name`,
    /// `transcript_id` and `exon_number`; otherwise every attribute key in the file
    /// becomes a column.
    pub fn from_gtf<P: AsRef<Path>>(file_path: P, only_essential: bool) -> anyhow::Result<Annotation> {
        let am = reader::AttributeMode::from(!only_essential);
        let gstruct = reader::GStruct::from_gtf(file_path.as_ref(), am)?;
        let ann = Annotation::from_gstruct(gstruct)?;
        info!(
            "Built an annotation frame with {} rows and {} columns.",
            ann.height(),
            ann.df.width()
        );
        Ok(ann)
    }

    /// Borrows the underlying dataframe.
    pub fn df(&self) -> &DataFrame {
        &self.df
    }

    /// The number of records.
    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// The column names of the dataframe, in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.df.get_column_names()
    }

    /// Whether the dataframe has a column called exactly `name`. Aliases are not
    /// considered.
    pub fn is_column<T: AsRef<str>>(&self, name: T) -> bool {
        self.df.get_column_names().contains(&name.as_ref())
    }

    /// Gets a column by name.
    ///
    /// # Arguments
    ///
    /// * `name` - a column name. If the frame has no column of that name, `feature` is
    /// taken to mean `feature_type` and `seqid` to mean `seqname`.
    ///
    /// # Returns
    ///
    /// The column, or an error listing the available columns.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use polars::prelude::*;
    /// use txwrangle::annotation::Annotation;
    ///
    /// let df = df!(
    ///     "seqname" => ["chr1"],
    ///     "feature_type" => ["exon"],
    ///     "start" => [1i64],
    ///     "end" => [10i64],
    /// )?;
    /// let ann = Annotation::new(df, Vec::new())?;
    /// assert_eq!(ann.column("feature")?.name(), "feature_type");
    /// assert!(ann.column("gene_id").is_err());
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn column<T: AsRef<str>>(&self, name: T) -> anyhow::Result<&Series> {
        let name = self.resolve_column_name(name.as_ref());
        if !self.is_column(name) {
            bail!(
                "{} is not a column of the annotation. Available columns: {:?}",
                name,
                self.column_names()
            )
        }
        Ok(self.df.column(name)?)
    }

    fn resolve_column_name<'a>(&self, name: &'a str) -> &'a str {
        if self.is_column(name) {
            return name;
        }
        COLUMN_ALIASES
            .iter()
            .find(|(alias, target)| *alias == name && self.is_column(target))
            .map_or(name, |(_, target)| *target)
    }

    /// Keeps the rows whose `by` column equals any of `values`.
    ///
    /// # Arguments
    ///
    /// * `by` - the column to compare. Aliases are resolved as in [`Annotation::column`].
    /// * `values` - the accepted values. Non-string columns are compared through their
    /// string representation, so `filter("start", &["29554"])` works as expected.
    ///
    /// # Returns
    ///
    /// A new [`Annotation`] with the matching rows and the same comments. Nulls never
    /// match. An empty result is not an error but is logged as a warning.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use polars::prelude::*;
    /// use txwrangle::annotation::Annotation;
    ///
    /// let df = df!(
    ///     "seqname" => ["chr1", "chr1"],
    ///     "start" => [1i64, 20],
    ///     "end" => [10i64, 30],
    ///     "gene_id" => ["g1", "g2"],
    /// )?;
    /// let ann = Annotation::new(df, Vec::new())?;
    /// let g2 = ann.filter("gene_id", &["g2"])?;
    /// assert_eq!(g2.height(), 1);
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn filter<T: AsRef<str>>(&self, by: T, values: &[T]) -> anyhow::Result<Annotation> {
        let column = self.string_column(by.as_ref())?;
        let mask = is_in(
            &column,
            &Series::new(
                "values",
                values.iter().map(|s| s.as_ref()).collect::<Vec<&str>>(),
            ),
        )?;
        self.filter_mask(&mask)
    }

    /// Keeps the rows whose `by` column contains any of `patterns` as a substring.
    ///
    /// # Arguments
    ///
    /// * `by` - the column to search, compared as text like in [`Annotation::filter`].
    /// * `patterns` - the substrings to look for; a row matching any of them is kept.
    pub fn filter_contains<T: AsRef<str>>(
        &self,
        by: T,
        patterns: &[T],
    ) -> anyhow::Result<Annotation> {
        let column = self.string_column(by.as_ref())?;
        let mask: BooleanChunked = column
            .str()?
            .into_iter()
            .map(|v| v.is_some_and(|s| patterns.iter().any(|p| s.contains(p.as_ref()))))
            .collect();
        self.filter_mask(&mask)
    }

    fn string_column(&self, name: &str) -> anyhow::Result<Series> {
        let s = self.column(name)?;
        s.cast(&DataType::String)
            .with_context(|| format!("cannot compare column {} as text", name))
    }

    fn filter_mask(&self, mask: &BooleanChunked) -> anyhow::Result<Annotation> {
        let df = self.df.filter(mask)?;
        if df.height() == 0 {
            warn!("The filtered dataframe is empty.")
        }
        Ok(Annotation {
            df,
            comments: self.comments.clone(),
        })
    }
}

impl std::fmt::Display for Annotation {
    /// Renders the frame with the polars table formatter. How many rows and columns are
    /// shown is governed by the `POLARS_FMT_*` environment variables.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.df)
    }
}
