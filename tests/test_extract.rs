use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use txwrangle::extract::run_extractor;
use txwrangle::options::ExtractOptions;

const GTF: &str = "#!genome-build GRCh38.p14
chr1\tHAVANA\tgene\t11121\t24894\t.\t+\t.\tgene_id \"ENSG00000290825.1\"; gene_type \"lncRNA\"; gene_name \"DDX11L2\";
chr1\tHAVANA\ttranscript\t11121\t14413\t.\t+\t.\tgene_id \"ENSG00000290825.1\"; transcript_id \"ENST00000832824.1\"; gene_name \"DDX11L2\";
chrY\tHAVANA\tgene\t57212184\t57214397\t.\t-\t.\tgene_id \"ENSG00000287777.1\"; gene_type \"lncRNA\"; gene_name \"ENSG00000287777\";
chrY\tHAVANA\ttranscript\t57212184\t57214397\t.\t-\t.\tgene_id \"ENSG00000287777.1\"; transcript_id \"ENST00000445297.1\"; gene_name \"ENSG00000287777\";
chrY\tHAVANA\texon\t57212184\t57213000\t.\t-\t.\tgene_id \"ENSG00000287777.1\"; transcript_id \"ENST00000445297.1\"; exon_number 1;
chrY\tHAVANA\texon\t57213500\t57214397\t.\t-\t.\tgene_id \"ENSG00000287777.1\"; transcript_id \"ENST00000445297.1\"; exon_number 2;
";

#[test]
fn test_extract_by_gene_id() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let gtf = dir.path().join("genes.gtf");
    std::fs::write(&gtf, GTF)?;

    let filtered = run_extractor(&ExtractOptions::new(&gtf, "ENSG00000287777.1"))?;
    assert_eq!(filtered.height(), 4);
    assert_eq!(filtered.comments.len(), 1);
    assert!(filtered.is_column("gene_type"));

    let mut opts = ExtractOptions::new(&gtf, "ENSG00000287777.1");
    opts.feature_type = Some(String::from("exon"));
    opts.only_essential = true;
    let exons = run_extractor(&opts)?;
    assert_eq!(exons.height(), 2);
    assert!(!exons.is_column("gene_type"));
    Ok(())
}

#[test]
fn test_extract_gzipped_contains() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let gtf = dir.path().join("genes.gtf.gz");
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(GTF.as_bytes())?;
    std::fs::write(&gtf, enc.finish()?)?;

    let mut opts = ExtractOptions::new(&gtf, "ENST00000445297");
    opts.column = String::from("transcript_id");
    opts.contains = true;
    opts.transcript_bed = Some(dir.path().join("unused.bed"));
    let filtered = run_extractor(&opts)?;
    assert_eq!(filtered.height(), 3);
    Ok(())
}

#[test]
fn test_extract_errors() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let gtf = dir.path().join("genes.gtf");
    std::fs::write(&gtf, GTF)?;

    let mut opts = ExtractOptions::new(&gtf, "x");
    opts.column = String::from("protein_id");
    assert!(run_extractor(&opts).is_err());

    let mut opts = ExtractOptions::new(&gtf, "x");
    opts.values.clear();
    assert!(run_extractor(&opts).is_err());

    let opts = ExtractOptions::new(dir.path().join("missing.gtf"), "x");
    assert!(run_extractor(&opts).is_err());

    let none = run_extractor(&ExtractOptions::new(&gtf, "ENSG_NOT_THERE"))?;
    assert_eq!(none.height(), 0);
    Ok(())
}
