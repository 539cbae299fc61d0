use crate::annotation::Annotation;
use crate::options::ExtractOptions;
use anyhow::bail;
use tracing::{debug, info};

/// Loads the GTF file of `opts` and returns the records that pass its filters.
///
/// The feature type restriction (if any) is applied first, then the column filter:
/// an equality match against `values`, or a substring match if `contains` is set.
pub fn run_extractor(opts: &ExtractOptions) -> anyhow::Result<Annotation> {
    if opts.values.is_empty() {
        bail!("No value given to filter the {} column by.", opts.column);
    }
    if let Some(bed) = &opts.transcript_bed {
        debug!(
            "Ignoring the transcript BED file {:?}; it is not used when extracting records.",
            bed.display()
        );
    }

    let ann = Annotation::from_gtf(&opts.gtf_file, opts.only_essential)?;
    let ann = match &opts.feature_type {
        Some(ft) => ann.filter("feature_type", &[ft.as_str()])?,
        None => ann,
    };

    let values: Vec<&str> = opts.values.iter().map(|v| v.as_str()).collect();
    let filtered = if opts.contains {
        ann.filter_contains(opts.column.as_str(), &values)?
    } else {
        ann.filter(opts.column.as_str(), &values)?
    };
    info!(
        "{} of {} records match {} {} {:?}.",
        filtered.height(),
        ann.height(),
        opts.column,
        if opts.contains { "containing" } else { "in" },
        opts.values
    );
    Ok(filtered)
}
