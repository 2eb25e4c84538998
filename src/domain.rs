use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::EnaError;

pub const EXPERIMENT_ALIAS_PREFIX: &str = "exp_";
pub const RUN_ALIAS_PREFIX: &str = "run_";

pub fn experiment_alias(alias: &str) -> String {
    format!("{EXPERIMENT_ALIAS_PREFIX}{alias}")
}

pub fn run_alias(alias: &str) -> String {
    format!("{RUN_ALIAS_PREFIX}{alias}")
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StudyAccession(String);

impl StudyAccession {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudyAccession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StudyAccession {
    type Err = EnaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_uppercase();
        let re = Regex::new(r"^((ERP|SRP|DRP)\d+|PRJ(EB|NA|DB)\d+)$").unwrap();
        if !re.is_match(&normalized) {
            return Err(EnaError::InvalidStudyAccession(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SampleAccession(String);

impl SampleAccession {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SampleAccession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SampleAccession {
    type Err = EnaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_uppercase();
        let re = Regex::new(r"^((ERS|SRS|DRS)\d+|SAM(EA|N|D)\d+)$").unwrap();
        if !re.is_match(&normalized) {
            return Err(EnaError::InvalidSampleAccession(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaxonId(u64);

impl TaxonId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaxonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaxonId {
    type Err = EnaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let parsed = trimmed
            .parse::<u64>()
            .map_err(|_| EnaError::InvalidTaxonId(value.to_string()))?;
        if parsed == 0 {
            return Err(EnaError::InvalidTaxonId(value.to_string()));
        }
        Ok(Self(parsed))
    }
}

/// Closed set of platform identifiers accepted by the archive. Table values
/// are matched case-insensitively with spaces and hyphens treated as
/// underscores; anything outside the set is rejected instead of being
/// upper-cased into an invalid tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Illumina,
    Ls454,
    AbiSolid,
    Bgiseq,
    Capillary,
    CompleteGenomics,
    Dnbseq,
    Element,
    Helicos,
    IonTorrent,
    OxfordNanopore,
    PacbioSmrt,
    Ultima,
}

impl Platform {
    pub fn tag_name(&self) -> &'static str {
        match self {
            Platform::Illumina => "ILLUMINA",
            Platform::Ls454 => "LS454",
            Platform::AbiSolid => "ABI_SOLID",
            Platform::Bgiseq => "BGISEQ",
            Platform::Capillary => "CAPILLARY",
            Platform::CompleteGenomics => "COMPLETE_GENOMICS",
            Platform::Dnbseq => "DNBSEQ",
            Platform::Element => "ELEMENT",
            Platform::Helicos => "HELICOS",
            Platform::IonTorrent => "ION_TORRENT",
            Platform::OxfordNanopore => "OXFORD_NANOPORE",
            Platform::PacbioSmrt => "PACBIO_SMRT",
            Platform::Ultima => "ULTIMA",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag_name())
    }
}

impl FromStr for Platform {
    type Err = EnaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_uppercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "ILLUMINA" => Ok(Platform::Illumina),
            "LS454" => Ok(Platform::Ls454),
            "ABI_SOLID" => Ok(Platform::AbiSolid),
            "BGISEQ" => Ok(Platform::Bgiseq),
            "CAPILLARY" => Ok(Platform::Capillary),
            "COMPLETE_GENOMICS" => Ok(Platform::CompleteGenomics),
            "DNBSEQ" => Ok(Platform::Dnbseq),
            "ELEMENT" => Ok(Platform::Element),
            "HELICOS" => Ok(Platform::Helicos),
            "ION_TORRENT" => Ok(Platform::IonTorrent),
            "OXFORD_NANOPORE" => Ok(Platform::OxfordNanopore),
            "PACBIO_SMRT" => Ok(Platform::PacbioSmrt),
            "ULTIMA" => Ok(Platform::Ultima),
            _ => Err(EnaError::UnknownPlatform(value.to_string())),
        }
    }
}

pub fn parse_hold_date(value: &str) -> Result<NaiveDate, EnaError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| EnaError::InvalidHoldDate(value.to_string()))
}
