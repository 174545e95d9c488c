use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Result;
use flate2::write::GzEncoder;
use flate2::Compression;
use similar_asserts::assert_eq;
use tempfile::TempDir;

use shardstream::{source_path, DirLister, ErrorPolicy, FileOpener, StreamError, TarExtractor};

/// Lay out a small sample corpus: three files directly under a fresh
/// temporary directory.
fn sample_corpus() -> Result<(TempDir, Vec<PathBuf>)> {
    let dir = tempfile::tempdir()?;
    let mut files = Vec::new();
    for (name, content) in [
        ("sample-a", &b"0123456789abcdef"[..]),
        ("sample-b", &b"0123456789abcdef"[..]),
        ("sample-c", &b""[..]),
    ] {
        let path = dir.path().join(name);
        fs::write(&path, content)?;
        files.push(path);
    }
    Ok((dir, files))
}

/// Append the corpus files to a tar builder, each member named by its
/// absolute path minus the leading slash (the way tar stores absolute
/// paths).
fn append_corpus<W: std::io::Write>(builder: &mut tar::Builder<W>, files: &[PathBuf]) -> Result<()> {
    for file in files {
        let stored = file.strip_prefix("/").unwrap_or(file);
        builder.append_path_with_name(file, stored)?;
    }
    Ok(())
}

/// Store the corpus in a gzip-compressed tar archive inside `dir`.
fn build_gzipped_archive(dir: &Path, files: &[PathBuf]) -> Result<PathBuf> {
    let archive_path = dir.join("shard-000.tar");
    let encoder = GzEncoder::new(fs::File::create(&archive_path)?, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    append_corpus(&mut builder, files)?;
    builder.into_inner()?.finish()?;
    Ok(archive_path)
}

#[test]
fn test_listing_yields_exactly_the_corpus() -> Result<()> {
    let (dir, files) = sample_corpus()?;

    let listed = DirLister::new(dir.path(), "")?.collect::<shardstream::Result<BTreeSet<_>>>()?;
    assert_eq!(listed, files.iter().cloned().collect::<BTreeSet<_>>());
    Ok(())
}

#[test]
fn test_loaded_streams_match_disk_content() -> Result<()> {
    let (dir, files) = sample_corpus()?;

    let mut seen = 0;
    for record in FileOpener::new(DirLister::new(dir.path(), "")?) {
        let (path, mut stream) = record?;
        assert!(files.contains(&path), "unexpected path {}", path.display());
        let mut streamed = Vec::new();
        stream.read_to_end(&mut streamed)?;
        assert_eq!(streamed, fs::read(&path)?);
        seen += 1;
    }
    assert_eq!(seen, files.len());
    Ok(())
}

#[test]
fn test_extracted_members_round_trip_to_their_sources() -> Result<()> {
    let (dir, files) = sample_corpus()?;
    build_gzipped_archive(dir.path(), &files)?;

    let shards = DirLister::new(dir.path(), "*.tar")?;
    let archives = FileOpener::new(shards);

    let mut by_source = BTreeMap::new();
    for record in TarExtractor::new(archives) {
        let (name, payload) = record?;
        let source = source_path(&name)
            .expect("member name carries a .tar marker")
            .to_owned();
        by_source.insert(source, payload.into_inner());
    }

    // one record per corpus file, matched by recovered path, not position
    assert_eq!(by_source.len(), files.len());
    for file in &files {
        assert_eq!(&by_source[file], &fs::read(file)?);
    }
    Ok(())
}

#[test]
fn test_uncompressed_archives_extract_the_same() -> Result<()> {
    let (dir, files) = sample_corpus()?;
    let archive_path = dir.path().join("shard-raw.tar");
    let mut builder = tar::Builder::new(fs::File::create(&archive_path)?);
    append_corpus(&mut builder, &files)?;
    builder.into_inner()?;

    let shards = DirLister::new(dir.path(), "shard-raw.tar")?;
    let members = TarExtractor::new(FileOpener::new(shards))
        .collect::<shardstream::Result<Vec<_>>>()?;
    assert_eq!(members.len(), files.len());
    Ok(())
}

#[test]
fn test_non_archive_bytes_surface_as_malformed() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let bogus = dir.path().join("not-really.tar");
    fs::write(&bogus, vec![0x42u8; 1024])?;

    let shards = DirLister::new(dir.path(), "*.tar")?;
    let mut members = TarExtractor::new(FileOpener::new(shards));
    match members.next() {
        Some(Err(StreamError::MalformedArchive { archive, .. })) => assert_eq!(archive, bogus),
        other => panic!("expected MalformedArchive, got {other:?}"),
    }
    assert!(members.next().is_none());
    Ok(())
}

#[test]
fn test_skip_policy_survives_files_vanishing_after_listing() -> Result<()> {
    let (dir, files) = sample_corpus()?;
    let paths = DirLister::new(dir.path(), "")?.collect::<shardstream::Result<Vec<_>>>()?;
    fs::remove_file(&files[0])?;

    let opened = FileOpener::with_policy(paths.into_iter().map(Ok), ErrorPolicy::Skip)
        .collect::<shardstream::Result<Vec<_>>>()?;
    assert_eq!(opened.len(), files.len() - 1);
    Ok(())
}
