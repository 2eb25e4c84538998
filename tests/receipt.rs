use std::fs;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;
use tempfile::tempdir;

use ena_submission_tools::error::EnaError;
use ena_submission_tools::receipt::{
    extract_run_ids, extract_sample_ids, write_run_ids, write_sample_ids,
};

fn write_receipt(dir: &tempfile::TempDir, content: &str) -> Utf8PathBuf {
    let path = Utf8PathBuf::from_path_buf(dir.path().join("receipt.xml")).unwrap();
    fs::write(path.as_std_path(), content).unwrap();
    path
}

const SAMPLE_RECEIPT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<RECEIPT receiptDate="2026-05-02T10:13:31.815+01:00" submissionFile="submission.xml" success="true">
  <SAMPLE accession="ERS4466864" alias="s1" status="PRIVATE">
    <EXT_ID accession="SAMEA6853078" type="biosample"/>
  </SAMPLE>
  <SAMPLE accession="ERS4466865" alias="s2" status="PRIVATE">
    <EXT_ID accession="SAMEA6853079" type="biosample"/>
  </SAMPLE>
  <SUBMISSION accession="ERA2556004" alias="submission-02-05-2026"/>
  <MESSAGES>
    <INFO>Submission has been committed.</INFO>
  </MESSAGES>
  <ACTIONS>ADD</ACTIONS>
</RECEIPT>
"#;

const RUN_RECEIPT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<RECEIPT receiptDate="2026-05-03T09:00:00.000+01:00" success="true">
  <EXPERIMENT accession="ERX4000001" alias="exp_s1" status="PRIVATE"/>
  <EXPERIMENT accession="ERX4000002" alias="exp_s2" status="PRIVATE"/>
  <RUN accession="ERR4000001" alias="run_s1" status="PRIVATE"/>
  <RUN accession="ERR4000002" alias="run_s2" status="PRIVATE"/>
  <SUBMISSION accession="ERA2556005" alias="submission-03-05-2026"/>
</RECEIPT>
"#;

#[test]
fn sample_receipt_extracts_alias_biosample_and_accession() {
    let dir = tempdir().unwrap();
    let path = write_receipt(&dir, SAMPLE_RECEIPT);

    let registrations = extract_sample_ids(&path).unwrap();
    assert_eq!(registrations.len(), 2);
    assert_eq!(registrations[0].alias, "s1");
    assert_eq!(registrations[0].biosample, "SAMEA6853078");
    assert_eq!(registrations[0].accession, "ERS4466864");
    assert_eq!(registrations[1].alias, "s2");
}

#[test]
fn sample_ids_are_written_as_headerless_tsv() {
    let dir = tempdir().unwrap();
    let path = write_receipt(&dir, SAMPLE_RECEIPT);
    let output = Utf8PathBuf::from_path_buf(dir.path().join("ids.tsv")).unwrap();

    let count = write_sample_ids(&path, &output).unwrap();
    assert_eq!(count, 2);

    let content = fs::read_to_string(output.as_std_path()).unwrap();
    assert_eq!(
        content,
        "s1\tSAMEA6853078\tERS4466864\ns2\tSAMEA6853079\tERS4466865\n"
    );
}

#[test]
fn run_receipt_pairs_experiments_and_runs_by_stripped_alias() {
    let dir = tempdir().unwrap();
    let path = write_receipt(&dir, RUN_RECEIPT);

    let registrations = extract_run_ids(&path).unwrap();
    assert_eq!(registrations.len(), 2);
    assert_eq!(registrations[0].alias, "s1");
    assert_eq!(registrations[0].experiment, "ERX4000001");
    assert_eq!(registrations[0].run, "ERR4000001");
    assert_eq!(registrations[1].alias, "s2");
    assert_eq!(registrations[1].experiment, "ERX4000002");
    assert_eq!(registrations[1].run, "ERR4000002");
}

#[test]
fn run_ids_are_written_as_headerless_tsv() {
    let dir = tempdir().unwrap();
    let path = write_receipt(&dir, RUN_RECEIPT);
    let output = Utf8PathBuf::from_path_buf(dir.path().join("ids.tsv")).unwrap();

    let count = write_run_ids(&path, &output).unwrap();
    assert_eq!(count, 2);

    let content = fs::read_to_string(output.as_std_path()).unwrap();
    assert_eq!(
        content,
        "s1\tERX4000001\tERR4000001\ns2\tERX4000002\tERR4000002\n"
    );
}

#[test]
fn rejected_receipt_surfaces_the_archive_errors() {
    let dir = tempdir().unwrap();
    let path = write_receipt(
        &dir,
        r#"<?xml version="1.0" encoding="UTF-8"?>
<RECEIPT receiptDate="2026-05-02T10:13:31.815+01:00" success="false">
  <MESSAGES>
    <ERROR>In sample, alias: "s1". Sample already exists.</ERROR>
  </MESSAGES>
</RECEIPT>
"#,
    );

    let err = extract_sample_ids(&path).unwrap_err();
    assert_matches!(&err, EnaError::Receipt(message) => {
        assert!(message.contains("Sample already exists"));
    });
}

#[test]
fn alias_without_builder_prefix_is_rejected() {
    let dir = tempdir().unwrap();
    let path = write_receipt(
        &dir,
        r#"<?xml version="1.0" encoding="UTF-8"?>
<RECEIPT success="true">
  <EXPERIMENT accession="ERX4000001" alias="s1"/>
  <RUN accession="ERR4000001" alias="run_s1"/>
</RECEIPT>
"#,
    );

    let err = extract_run_ids(&path).unwrap_err();
    assert_matches!(&err, EnaError::Receipt(message) => {
        assert!(message.contains("exp_"));
    });
}

#[test]
fn run_without_matching_experiment_is_rejected() {
    let dir = tempdir().unwrap();
    let path = write_receipt(
        &dir,
        r#"<?xml version="1.0" encoding="UTF-8"?>
<RECEIPT success="true">
  <RUN accession="ERR4000001" alias="run_s1"/>
</RECEIPT>
"#,
    );

    let err = extract_run_ids(&path).unwrap_err();
    assert_matches!(&err, EnaError::Receipt(message) => {
        assert!(message.contains("s1"));
    });
}

#[test]
fn sample_without_ext_id_is_rejected() {
    let dir = tempdir().unwrap();
    let path = write_receipt(
        &dir,
        r#"<?xml version="1.0" encoding="UTF-8"?>
<RECEIPT success="true">
  <SAMPLE accession="ERS4466864" alias="s1" status="PRIVATE"/>
</RECEIPT>
"#,
    );

    let err = extract_sample_ids(&path).unwrap_err();
    assert_matches!(&err, EnaError::Receipt(message) => {
        assert!(message.contains("EXT_ID"));
    });
}
