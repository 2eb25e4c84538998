use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, Read};

use camino::{Utf8Path, Utf8PathBuf};
use flate2::read::MultiGzDecoder;
use md5::{Digest, Md5};
use tracing::debug;

use crate::error::EnaError;
use crate::fs_util;

/// Separator between the sample alias and the mate part of a read file name
/// (`<alias>.pair.1.fq.gz`).
pub const PAIR_TOKEN: &str = ".pair.";

const HASH_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mate {
    R1,
    R2,
}

impl Mate {
    pub fn index(&self) -> u8 {
        match self {
            Mate::R1 => 1,
            Mate::R2 => 2,
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            Mate::R1 => "1.fq.gz",
            Mate::R2 => "2.fq.gz",
        }
    }
}

/// Both mates of one sample's reads, as paths relative to the scanned
/// directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadPair {
    pub r1: Utf8PathBuf,
    pub r2: Utf8PathBuf,
}

/// Compressed read files found under a directory, partitioned by the alias
/// encoded in each file name. The alias is the file-name substring before
/// the first `.pair.`; the directory part never participates in matching.
#[derive(Debug)]
pub struct ReadSet {
    root: Utf8PathBuf,
    by_alias: BTreeMap<String, Vec<Utf8PathBuf>>,
}

impl ReadSet {
    pub fn scan(root: &Utf8Path) -> Result<Self, EnaError> {
        let mut by_alias: BTreeMap<String, Vec<Utf8PathBuf>> = BTreeMap::new();
        let mut total = 0usize;
        for path in fs_util::walk_files(root)? {
            let Some(name) = path.file_name() else {
                continue;
            };
            if !name.ends_with(".gz") {
                continue;
            }
            let Some((alias, _)) = name.split_once(PAIR_TOKEN) else {
                continue;
            };
            let alias = alias.to_string();
            let relative = path
                .strip_prefix(root)
                .map(Utf8Path::to_path_buf)
                .unwrap_or(path);
            by_alias.entry(alias).or_default().push(relative);
            total += 1;
        }
        debug!(root = %root, files = total, aliases = by_alias.len(), "scanned reads directory");
        Ok(Self {
            root: root.to_path_buf(),
            by_alias,
        })
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Exactly one read-1 and one read-2 file for the alias; anything else
    /// is a resolution failure naming the mate and the count found.
    pub fn resolve(&self, alias: &str) -> Result<ReadPair, EnaError> {
        let files = self
            .by_alias
            .get(alias)
            .map(Vec::as_slice)
            .unwrap_or_default();
        Ok(ReadPair {
            r1: Self::single_mate(alias, files, Mate::R1)?,
            r2: Self::single_mate(alias, files, Mate::R2)?,
        })
    }

    pub fn absolute(&self, relative: &Utf8Path) -> Utf8PathBuf {
        self.root.join(relative)
    }

    fn single_mate(alias: &str, files: &[Utf8PathBuf], mate: Mate) -> Result<Utf8PathBuf, EnaError> {
        let matches = files
            .iter()
            .filter(|path| path.as_str().ends_with(mate.suffix()))
            .collect::<Vec<_>>();
        match matches.as_slice() {
            [single] => Ok((*single).clone()),
            _ => Err(EnaError::FileResolution {
                alias: alias.to_string(),
                mate: mate.index(),
                found: matches.len(),
            }),
        }
    }
}

/// Per-file digest cache so no file is ever hashed twice within one run.
#[derive(Debug, Default)]
pub struct Checksums {
    cache: BTreeMap<Utf8PathBuf, String>,
}

impl Checksums {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn digest(&mut self, path: &Utf8Path) -> Result<String, EnaError> {
        if let Some(hit) = self.cache.get(path) {
            return Ok(hit.clone());
        }
        let digest = md5_file(path)?;
        self.cache.insert(path.to_path_buf(), digest.clone());
        Ok(digest)
    }
}

/// MD5 hex digest of a file, streamed in bounded-size chunks.
pub fn md5_file(path: &Utf8Path) -> Result<String, EnaError> {
    let file = File::open(path.as_std_path()).map_err(|err| EnaError::Checksum {
        path: path.to_string(),
        message: err.to_string(),
    })?;
    let mut reader = BufReader::new(file);
    let mut hasher = Md5::new();
    let mut chunk = [0u8; HASH_CHUNK_SIZE];
    loop {
        let read = reader.read(&mut chunk).map_err(|err| EnaError::Checksum {
            path: path.to_string(),
            message: err.to_string(),
        })?;
        if read == 0 {
            break;
        }
        hasher.update(&chunk[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Stream the file through a gzip decoder to confirm it decompresses
/// cleanly, without keeping any of the content.
pub fn validate_gzip(path: &Utf8Path) -> Result<(), EnaError> {
    let file = File::open(path.as_std_path()).map_err(|err| EnaError::Checksum {
        path: path.to_string(),
        message: err.to_string(),
    })?;
    let mut decoder = MultiGzDecoder::new(BufReader::new(file));
    io::copy(&mut decoder, &mut io::sink()).map_err(|err| EnaError::Checksum {
        path: path.to_string(),
        message: format!("gzip validation failed: {err}"),
    })?;
    Ok(())
}
