use std::fs;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;
use tempfile::tempdir;

use ena_submission_tools::error::EnaError;
use ena_submission_tools::samples::{build_sample_set, write_sample_submission};
use ena_submission_tools::table::Table;

fn load_table(dir: &tempfile::TempDir, content: &str) -> Table {
    let path = Utf8PathBuf::from_path_buf(dir.path().join("samples.tsv")).unwrap();
    fs::write(path.as_std_path(), content).unwrap();
    Table::load(&path).unwrap()
}

#[test]
fn minimal_row_produces_taxon_and_empty_attributes() {
    let dir = tempdir().unwrap();
    let table = load_table(
        &dir,
        "alias\ttitle\ttaxon_id\tcenter_name\nS1\tT1\t9606\tX\n",
    );

    let set = build_sample_set(&table, None).unwrap();
    assert_eq!(set.tag, "SAMPLE_SET");
    assert_eq!(set.children.len(), 1);

    let sample = &set.children[0];
    assert_eq!(sample.attribute("alias"), Some("S1"));
    assert_eq!(sample.attribute("center_name"), Some("X"));
    assert_eq!(sample.find("TITLE").unwrap().text.as_deref(), Some("T1"));

    let taxon = sample.find("SAMPLE_NAME").unwrap().find("TAXON_ID").unwrap();
    assert_eq!(taxon.text.as_deref(), Some("9606"));

    let attributes = sample.find("SAMPLE_ATTRIBUTES").unwrap();
    assert!(attributes.children.is_empty());
}

#[test]
fn one_sample_per_row_in_table_order() {
    let dir = tempdir().unwrap();
    let table = load_table(
        &dir,
        "alias\ttitle\ttaxon_id\tcenter_name\n\
         s1\tfirst\t9606\tX\n\
         s2\tsecond\t562\tX\n\
         s3\tthird\t10090\tX\n",
    );

    let set = build_sample_set(&table, None).unwrap();
    assert_eq!(set.children.len(), 3);
    let aliases = set
        .children
        .iter()
        .map(|sample| sample.attribute("alias").unwrap())
        .collect::<Vec<_>>();
    assert_eq!(aliases, ["s1", "s2", "s3"]);
}

#[test]
fn extra_columns_become_lowercased_attributes_in_declared_order() {
    let dir = tempdir().unwrap();
    let table = load_table(
        &dir,
        "alias\tGeographic_Location\ttitle\ttaxon_id\tcenter_name\tisolation_source\n\
         s1\tPortugal\tfirst\t9606\tX\tblood\n",
    );

    let set = build_sample_set(&table, Some("ERC000028")).unwrap();
    let attributes = &set.children[0].find("SAMPLE_ATTRIBUTES").unwrap().children;
    assert_eq!(attributes.len(), 3);

    let tags = attributes
        .iter()
        .map(|attr| attr.find("TAG").unwrap().text.as_deref().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(tags, ["geographic_location", "isolation_source", "ENA-CHECKLIST"]);

    let values = attributes
        .iter()
        .map(|attr| attr.find("VALUE").unwrap().text.as_deref().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(values, ["Portugal", "blood", "ERC000028"]);
}

#[test]
fn empty_required_cell_fails_the_whole_run() {
    let dir = tempdir().unwrap();
    let table = load_table(
        &dir,
        "alias\ttitle\ttaxon_id\tcenter_name\ns1\tfirst\t9606\tX\ns2\t\t562\tX\n",
    );

    let err = build_sample_set(&table, None).unwrap_err();
    assert_matches!(&err, EnaError::MalformedTable(message) => {
        assert!(message.contains("title"));
    });
}

#[test]
fn non_integer_taxon_id_is_rejected() {
    let dir = tempdir().unwrap();
    let table = load_table(
        &dir,
        "alias\ttitle\ttaxon_id\tcenter_name\ns1\tfirst\thuman\tX\n",
    );

    let err = build_sample_set(&table, None).unwrap_err();
    assert_matches!(err, EnaError::InvalidTaxonId(_));
}

#[test]
fn missing_reserved_column_is_rejected() {
    let dir = tempdir().unwrap();
    let table = load_table(&dir, "alias\ttitle\tcenter_name\ns1\tfirst\tX\n");

    let err = build_sample_set(&table, None).unwrap_err();
    assert_matches!(&err, EnaError::MalformedTable(message) => {
        assert!(message.contains("taxon_id"));
    });
}

#[test]
fn submission_envelope_lands_next_to_the_samples_document() {
    let dir = tempdir().unwrap();
    let input = Utf8PathBuf::from_path_buf(dir.path().join("samples.tsv")).unwrap();
    fs::write(
        input.as_std_path(),
        "alias\ttitle\ttaxon_id\tcenter_name\ns1\tfirst\t9606\tX\n",
    )
    .unwrap();
    let output = Utf8PathBuf::from_path_buf(dir.path().join("out/samples.xml")).unwrap();

    let outputs = write_sample_submission(&input, &output, None, None).unwrap();
    assert_eq!(outputs.samples, output);
    assert_eq!(outputs.submission.parent(), output.parent());

    let samples_xml = fs::read_to_string(output.as_std_path()).unwrap();
    assert!(samples_xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(samples_xml.contains("<TAXON_ID>9606</TAXON_ID>"));

    let submission_xml = fs::read_to_string(outputs.submission.as_std_path()).unwrap();
    assert!(submission_xml.contains("<ACTIONS><ACTION><ADD/></ACTION></ACTIONS>"));
}
