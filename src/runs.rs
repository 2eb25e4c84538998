use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDate;
use tracing::info;

use crate::domain::{Platform, SampleAccession, StudyAccession, experiment_alias, run_alias};
use crate::error::EnaError;
use crate::reads::{Checksums, ReadSet, validate_gzip};
use crate::table::Table;
use crate::xml::{self, XmlNode};

pub const REQUIRED_COLUMNS: &[&str] = &[
    "alias",
    "center_name",
    "title",
    "ENA_accession",
    "library_strategy",
    "library_source",
    "library_selection",
    "platform",
    "instrument_model",
];

/// Optional column: when present and non-empty, its value becomes the
/// NOMINAL_LENGTH attribute of the PAIRED layout element.
pub const NOMINAL_LENGTH_COLUMN: &str = "nominal_length";

pub const CHECKSUM_METHOD: &str = "MD5";
pub const FILE_TYPE: &str = "fastq";

#[derive(Debug, Clone)]
pub struct RunOutputs {
    pub experiments: Utf8PathBuf,
    pub runs: Utf8PathBuf,
    pub submission: Utf8PathBuf,
}

/// Pass A: one EXPERIMENT per table row, in table order. Returns the
/// document together with the raw-alias to experiment-alias mapping that
/// pass B threads into every EXPERIMENT_REF.
pub fn build_experiment_set(
    table: &Table,
    study: &StudyAccession,
) -> Result<(XmlNode, BTreeMap<String, String>), EnaError> {
    table.require_columns(REQUIRED_COLUMNS)?;
    table.require_unique("alias")?;

    let mut aliases = BTreeMap::new();
    let mut set = XmlNode::new("EXPERIMENT_SET");
    for row in 0..table.len() {
        let alias = table.required_value(row, "alias")?;
        let center_name = table.required_value(row, "center_name")?;
        let title = table.required_value(row, "title")?;
        let sample: SampleAccession = table.required_value(row, "ENA_accession")?.parse()?;
        let strategy = table.required_value(row, "library_strategy")?;
        let source = table.required_value(row, "library_source")?;
        let selection = table.required_value(row, "library_selection")?;
        let platform: Platform = table.required_value(row, "platform")?.parse()?;
        let instrument_model = table.required_value(row, "instrument_model")?;

        let exp_alias = experiment_alias(alias);
        aliases.insert(alias.to_string(), exp_alias.clone());

        let mut paired = XmlNode::new("PAIRED");
        if let Some(length) = table.value(row, NOMINAL_LENGTH_COLUMN) {
            let length = length.trim();
            if !length.is_empty() {
                paired = paired.attr("NOMINAL_LENGTH", length);
            }
        }

        let design = XmlNode::new("DESIGN")
            .child(XmlNode::new("DESIGN_DESCRIPTION"))
            .child(XmlNode::new("SAMPLE_DESCRIPTOR").attr("accession", sample.as_str()))
            .child(
                XmlNode::new("LIBRARY_DESCRIPTOR")
                    .child(XmlNode::new("LIBRARY_NAME"))
                    .child(XmlNode::new("LIBRARY_STRATEGY").text(strategy))
                    .child(XmlNode::new("LIBRARY_SOURCE").text(source))
                    .child(XmlNode::new("LIBRARY_SELECTION").text(selection))
                    .child(XmlNode::new("LIBRARY_LAYOUT").child(paired)),
            );

        set = set.child(
            XmlNode::new("EXPERIMENT")
                .attr("alias", exp_alias)
                .attr("center_name", center_name)
                .child(XmlNode::new("TITLE").text(title))
                .child(XmlNode::new("STUDY_REF").attr("accession", study.as_str()))
                .child(design)
                .child(
                    XmlNode::new("PLATFORM").child(
                        XmlNode::new(platform.tag_name())
                            .child(XmlNode::new("INSTRUMENT_MODEL").text(instrument_model)),
                    ),
                )
                .child(XmlNode::new("EXPERIMENT_ATTRIBUTES")),
        );
    }
    Ok((set, aliases))
}

/// Pass B: one RUN per table row, same order as pass A, each pointing at the
/// pass-A experiment alias and carrying both mates of the row's reads with
/// their checksums.
pub fn build_run_set(
    table: &Table,
    reads: &ReadSet,
    experiment_aliases: &BTreeMap<String, String>,
    validate_reads: bool,
) -> Result<XmlNode, EnaError> {
    let mut checksums = Checksums::new();
    let mut set = XmlNode::new("RUN_SET");
    for row in 0..table.len() {
        let alias = table.required_value(row, "alias")?;
        let center_name = table.required_value(row, "center_name")?;
        let exp_alias = experiment_aliases.get(alias).ok_or_else(|| {
            EnaError::MalformedTable(format!("no experiment was built for alias {alias}"))
        })?;

        let pair = reads.resolve(alias)?;
        let files = XmlNode::new("FILES")
            .child(file_entry(reads, &pair.r1, &mut checksums, validate_reads)?)
            .child(file_entry(reads, &pair.r2, &mut checksums, validate_reads)?);

        set = set.child(
            XmlNode::new("RUN")
                .attr("alias", run_alias(alias))
                .attr("center_name", center_name)
                .child(XmlNode::new("EXPERIMENT_REF").attr("refname", exp_alias))
                .child(XmlNode::new("DATA_BLOCK").child(files)),
        );
    }
    Ok(set)
}

fn file_entry(
    reads: &ReadSet,
    relative: &Utf8Path,
    checksums: &mut Checksums,
    validate_reads: bool,
) -> Result<XmlNode, EnaError> {
    let absolute = reads.absolute(relative);
    if validate_reads {
        validate_gzip(&absolute)?;
    }
    let checksum = checksums.digest(&absolute)?;
    Ok(XmlNode::new("FILE")
        .attr("checksum", checksum)
        .attr("checksum_method", CHECKSUM_METHOD)
        .attr("filetype", FILE_TYPE)
        .attr("filename", relative.as_str()))
}

/// Load the table, run both passes, and write `<prefix>_experiments.xml`,
/// `<prefix>_runs.xml` and `submission.xml` (next to the runs document).
/// Both documents are fully built in memory before the first write.
pub fn write_run_submission(
    input: &Utf8Path,
    study: &StudyAccession,
    reads_dir: &Utf8Path,
    output_prefix: &str,
    validate_reads: bool,
    hold_until: Option<NaiveDate>,
) -> Result<RunOutputs, EnaError> {
    let table = Table::load(input)?;
    let (experiments, aliases) = build_experiment_set(&table, study)?;
    let reads = ReadSet::scan(reads_dir)?;
    let runs = build_run_set(&table, &reads, &aliases, validate_reads)?;

    let experiments_path = Utf8PathBuf::from(format!("{output_prefix}_experiments.xml"));
    let runs_path = Utf8PathBuf::from(format!("{output_prefix}_runs.xml"));
    experiments.write(&experiments_path)?;
    runs.write(&runs_path)?;

    let directory = runs_path.parent().unwrap_or(Utf8Path::new(""));
    let submission = xml::write_submission(directory, hold_until)?;

    info!(
        experiments = table.len(),
        study = %study,
        output = %runs_path,
        "built run submission"
    );
    Ok(RunOutputs {
        experiments: experiments_path,
        runs: runs_path,
        submission,
    })
}
