use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDate;
use tracing::info;

use crate::domain::TaxonId;
use crate::error::EnaError;
use crate::table::Table;
use crate::xml::{self, XmlNode};

/// Columns consumed by the SAMPLE node itself; every other column becomes a
/// generic TAG/VALUE sample attribute.
pub const RESERVED_COLUMNS: &[&str] = &["alias", "title", "taxon_id", "center_name"];

pub const CHECKLIST_TAG: &str = "ENA-CHECKLIST";

#[derive(Debug, Clone)]
pub struct SampleOutputs {
    pub samples: Utf8PathBuf,
    pub submission: Utf8PathBuf,
}

/// Build the SAMPLE_SET document: one SAMPLE per table row, in table order.
pub fn build_sample_set(table: &Table, checklist: Option<&str>) -> Result<XmlNode, EnaError> {
    table.require_columns(RESERVED_COLUMNS)?;
    table.require_unique("alias")?;

    let attribute_columns = table
        .columns()
        .iter()
        .filter(|column| !RESERVED_COLUMNS.contains(&column.as_str()))
        .cloned()
        .collect::<Vec<_>>();

    let mut set = XmlNode::new("SAMPLE_SET");
    for row in 0..table.len() {
        let alias = table.required_value(row, "alias")?;
        let title = table.required_value(row, "title")?;
        let taxon: TaxonId = table.required_value(row, "taxon_id")?.parse()?;
        let center_name = table.required_value(row, "center_name")?;

        let mut attributes = XmlNode::new("SAMPLE_ATTRIBUTES");
        for column in &attribute_columns {
            let value = table.value(row, column).unwrap_or_default();
            attributes = attributes.child(sample_attribute(column.to_lowercase(), value));
        }
        if let Some(checklist) = checklist {
            attributes = attributes.child(sample_attribute(CHECKLIST_TAG, checklist));
        }

        set = set.child(
            XmlNode::new("SAMPLE")
                .attr("alias", alias)
                .attr("center_name", center_name)
                .child(XmlNode::new("TITLE").text(title))
                .child(
                    XmlNode::new("SAMPLE_NAME")
                        .child(XmlNode::new("TAXON_ID").text(taxon.to_string())),
                )
                .child(attributes),
        );
    }
    Ok(set)
}

fn sample_attribute(tag: impl Into<String>, value: impl Into<String>) -> XmlNode {
    XmlNode::new("SAMPLE_ATTRIBUTE")
        .child(XmlNode::new("TAG").text(tag))
        .child(XmlNode::new("VALUE").text(value))
}

/// Load the table, build the SAMPLE_SET, and write it together with the
/// submission envelope (the envelope lands next to the samples document).
pub fn write_sample_submission(
    input: &Utf8Path,
    output: &Utf8Path,
    checklist: Option<&str>,
    hold_until: Option<NaiveDate>,
) -> Result<SampleOutputs, EnaError> {
    let table = Table::load(input)?;
    let document = build_sample_set(&table, checklist)?;
    document.write(output)?;

    let directory = output.parent().unwrap_or(Utf8Path::new(""));
    let submission = xml::write_submission(directory, hold_until)?;

    info!(samples = table.len(), output = %output, "built sample submission");
    Ok(SampleOutputs {
        samples: output.to_path_buf(),
        submission,
    })
}
