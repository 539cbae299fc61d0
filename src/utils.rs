use anyhow::Context;
use flate2::bufread::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

/// A buffered reader over either a plain or a gzip compressed file.
pub type InputReader = Box<dyn BufRead>;

/// The eight fixed fields of a GTF record, in file order, as they are named
/// in an [`Annotation`](crate::annotation::Annotation) frame.
pub const GTF_FIELDS: [&str; 8] = [
    "seqname",
    "source",
    "feature_type",
    "start",
    "end",
    "score",
    "strand",
    "frame",
];

/// Attributes that are always materialized as columns, even in
/// [`AttributeMode::Essential`](crate::reader::gtf::AttributeMode::Essential).
pub const GTF_ESSENTIAL_ATTRIBUTES: [&str; 4] =
    ["gene_id", "gene_name", "transcript_id", "exon_number"];

/// Ensembl stable identifier prefix of transcripts.
pub const TRANSCRIPT_MARKER: &str = "ENST";
/// Ensembl stable identifier prefix of proteins (translations).
pub const PROTEIN_MARKER: &str = "ENSP";

/// Tests if the stream underlying the [BufReader] `reader` is gzipped or not by examining the
/// first 2 bytes for the magic header. This function *requires*, but does not check, that
/// none of the stream has yet been consumed. It will fill the buffer to examine the first
/// two bytes, but will not consume them.
///
/// Returns [Ok]`(true)` for a gzipped stream, [Ok]`(false)` otherwise, and the relevant
/// [std::io::Error] if the first bytes could not be read.
pub fn is_gzipped<T: BufRead>(reader: &mut T) -> std::io::Result<bool> {
    const GZIP_MAGIC_NUMBER: [u8; 2] = [0x1f, 0x8b];

    let src = reader.fill_buf()?;
    Ok(src.get(..2) == Some(&GZIP_MAGIC_NUMBER))
}

/// Opens `p` for buffered reading, transparently decompressing it if it is gzipped.
///
/// The error carries the offending path, so a missing input file reads as
/// `failed to open input file "..."` followed by the OS error.
pub fn get_reader_from_path<T: AsRef<Path>>(p: T) -> anyhow::Result<InputReader> {
    let path = p.as_ref();
    let file = File::open(path)
        .with_context(|| format!("failed to open input file {:?}", path.display()))?;
    let mut inner_rdr = BufReader::new(file);
    if is_gzipped(&mut inner_rdr)? {
        info!("auto-detected gzipped file - reading via decompression");
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(inner_rdr))))
    } else {
        Ok(Box::new(inner_rdr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Read, Write};

    #[test]
    fn test_is_gzipped() {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(b"hello").unwrap();
        let gz = enc.finish().unwrap();

        let mut rdr = BufReader::new(gz.as_slice());
        assert!(is_gzipped(&mut rdr).unwrap());
        // nothing was consumed
        assert_eq!(rdr.fill_buf().unwrap().len(), gz.len());

        let mut plain = BufReader::new(&b"chr1\tHAVANA"[..]);
        assert!(!is_gzipped(&mut plain).unwrap());

        let mut empty = BufReader::new(&b""[..]);
        assert!(!is_gzipped(&mut empty).unwrap());
    }

    #[test]
    fn test_get_reader_from_path() {
        let dir = tempfile::tempdir().unwrap();

        let plain = dir.path().join("plain.txt");
        std::fs::write(&plain, b"line one\n").unwrap();
        let mut s = String::new();
        get_reader_from_path(&plain)
            .unwrap()
            .read_to_string(&mut s)
            .unwrap();
        assert_eq!(s, "line one\n");

        let gz = dir.path().join("packed.txt.gz");
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(b"line two\n").unwrap();
        std::fs::write(&gz, enc.finish().unwrap()).unwrap();
        let mut s = String::new();
        get_reader_from_path(&gz)
            .unwrap()
            .read_to_string(&mut s)
            .unwrap();
        assert_eq!(s, "line two\n");

        let missing = dir.path().join("nope.txt");
        let err = get_reader_from_path(&missing).err().unwrap();
        assert!(format!("{:#}", err).contains("nope.txt"));
    }
}
