use std::collections::HashMap;

use camino::Utf8Path;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::info;

use crate::domain::{EXPERIMENT_ALIAS_PREFIX, RUN_ALIAS_PREFIX};
use crate::error::EnaError;
use crate::fs_util;

/// One registered sample from a receipt: table alias, BioSample accession,
/// ENA accession.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRegistration {
    pub alias: String,
    pub biosample: String,
    pub accession: String,
}

/// One registered experiment/run pair, keyed by the table alias recovered by
/// stripping the builder's `exp_`/`run_` prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRegistration {
    pub alias: String,
    pub experiment: String,
    pub run: String,
}

/// RECEIPT envelope bookkeeping shared by both extractors: the `success`
/// flag, the receipt date, and any ERROR messages the archive returned.
#[derive(Debug, Default)]
struct Envelope {
    success: Option<bool>,
    receipt_date: Option<String>,
    errors: Vec<String>,
    in_error: bool,
}

impl Envelope {
    fn observe_element(&mut self, element: &BytesStart) -> Result<(), EnaError> {
        match element.name().as_ref() {
            b"RECEIPT" => {
                if let Some(success) = attribute(element, "success")? {
                    self.success = Some(success == "true");
                }
                self.receipt_date = attribute(element, "receiptDate")?;
            }
            b"ERROR" => self.in_error = true,
            _ => {}
        }
        Ok(())
    }

    fn observe_text(&mut self, text: &str) {
        if self.in_error && !text.trim().is_empty() {
            self.errors.push(text.trim().to_string());
        }
    }

    fn observe_end(&mut self, name: &[u8]) {
        if name == b"ERROR" {
            self.in_error = false;
        }
    }

    fn finish(self) -> Result<(), EnaError> {
        if let Some(date) = &self.receipt_date {
            info!(receipt_date = %date, "parsed receipt");
        }
        if self.success == Some(false) {
            let detail = if self.errors.is_empty() {
                "archive rejected the submission".to_string()
            } else {
                self.errors.join("; ")
            };
            return Err(EnaError::Receipt(detail));
        }
        Ok(())
    }
}

/// Extract `(alias, biosample, accession)` for every SAMPLE in a sample
/// registration receipt, in document order.
pub fn extract_sample_ids(input: &Utf8Path) -> Result<Vec<SampleRegistration>, EnaError> {
    let mut reader = open_reader(input)?;
    let mut envelope = Envelope::default();
    let mut registrations = Vec::new();
    // alias/accession of the open SAMPLE element, until its first EXT_ID
    let mut current: Option<(String, String, Option<String>)> = None;

    let mut buf = Vec::new();
    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|err| EnaError::Receipt(format!("{input}: {err}")))?;
        match event {
            Event::Start(element) => {
                envelope.observe_element(&element)?;
                match element.name().as_ref() {
                    b"SAMPLE" => {
                        let alias = required_attribute(&element, "alias")?;
                        let accession = required_attribute(&element, "accession")?;
                        current = Some((alias, accession, None));
                    }
                    b"EXT_ID" => {
                        if let Some((_, _, biosample @ None)) = current.as_mut() {
                            *biosample = Some(required_attribute(&element, "accession")?);
                        }
                    }
                    _ => {}
                }
            }
            Event::Empty(element) => {
                envelope.observe_element(&element)?;
                match element.name().as_ref() {
                    b"SAMPLE" => {
                        let alias = required_attribute(&element, "alias")?;
                        return Err(EnaError::Receipt(format!(
                            "sample {alias} has no EXT_ID accession"
                        )));
                    }
                    b"EXT_ID" => {
                        if let Some((_, _, biosample @ None)) = current.as_mut() {
                            *biosample = Some(required_attribute(&element, "accession")?);
                        }
                    }
                    _ => {}
                }
            }
            Event::End(element) => {
                envelope.observe_end(element.name().as_ref());
                if element.name().as_ref() == b"SAMPLE" {
                    if let Some((alias, accession, biosample)) = current.take() {
                        let biosample = biosample.ok_or_else(|| {
                            EnaError::Receipt(format!("sample {alias} has no EXT_ID accession"))
                        })?;
                        registrations.push(SampleRegistration {
                            alias,
                            biosample,
                            accession,
                        });
                    }
                }
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|err| EnaError::Receipt(err.to_string()))?;
                envelope.observe_text(&text);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    envelope.finish()?;
    Ok(registrations)
}

/// Extract `(alias, experiment-accession, run-accession)` from a run
/// registration receipt, pairing EXPERIMENT and RUN elements by stripped
/// alias in first-seen document order.
pub fn extract_run_ids(input: &Utf8Path) -> Result<Vec<RunRegistration>, EnaError> {
    let mut reader = open_reader(input)?;
    let mut envelope = Envelope::default();
    let mut order: Vec<String> = Vec::new();
    let mut pairs: HashMap<String, (Option<String>, Option<String>)> = HashMap::new();

    let mut buf = Vec::new();
    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|err| EnaError::Receipt(format!("{input}: {err}")))?;
        match event {
            Event::Start(element) | Event::Empty(element) => {
                envelope.observe_element(&element)?;
                match element.name().as_ref() {
                    b"EXPERIMENT" => {
                        let alias = required_attribute(&element, "alias")?;
                        let alias = strip_prefix(&alias, EXPERIMENT_ALIAS_PREFIX)?;
                        let accession = required_attribute(&element, "accession")?;
                        let entry = entry(&mut order, &mut pairs, alias);
                        entry.0 = Some(accession);
                    }
                    b"RUN" => {
                        let alias = required_attribute(&element, "alias")?;
                        let alias = strip_prefix(&alias, RUN_ALIAS_PREFIX)?;
                        let accession = required_attribute(&element, "accession")?;
                        let entry = entry(&mut order, &mut pairs, alias);
                        entry.1 = Some(accession);
                    }
                    _ => {}
                }
            }
            Event::End(element) => envelope.observe_end(element.name().as_ref()),
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|err| EnaError::Receipt(err.to_string()))?;
                envelope.observe_text(&text);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    envelope.finish()?;

    let mut registrations = Vec::with_capacity(order.len());
    for alias in order {
        let (experiment, run) = pairs.remove(&alias).unwrap_or((None, None));
        let experiment = experiment.ok_or_else(|| {
            EnaError::Receipt(format!("alias {alias} has a run but no experiment accession"))
        })?;
        let run = run.ok_or_else(|| {
            EnaError::Receipt(format!("alias {alias} has an experiment but no run accession"))
        })?;
        registrations.push(RunRegistration {
            alias,
            experiment,
            run,
        });
    }
    Ok(registrations)
}

/// Parse a sample receipt and write its registrations as header-less TSV.
pub fn write_sample_ids(input: &Utf8Path, output: &Utf8Path) -> Result<usize, EnaError> {
    let registrations = extract_sample_ids(input)?;
    let lines = registrations
        .iter()
        .map(|reg| format!("{}\t{}\t{}", reg.alias, reg.biosample, reg.accession))
        .collect::<Vec<_>>();
    write_lines(output, &lines)?;
    Ok(registrations.len())
}

/// Parse a run receipt and write its registrations as header-less TSV.
pub fn write_run_ids(input: &Utf8Path, output: &Utf8Path) -> Result<usize, EnaError> {
    let registrations = extract_run_ids(input)?;
    let lines = registrations
        .iter()
        .map(|reg| format!("{}\t{}\t{}", reg.alias, reg.experiment, reg.run))
        .collect::<Vec<_>>();
    write_lines(output, &lines)?;
    Ok(registrations.len())
}

fn open_reader(input: &Utf8Path) -> Result<Reader<std::io::BufReader<std::fs::File>>, EnaError> {
    let mut reader = Reader::from_file(input.as_std_path())
        .map_err(|err| EnaError::Receipt(format!("{input}: {err}")))?;
    reader.config_mut().trim_text(true);
    Ok(reader)
}

fn attribute(element: &BytesStart, name: &str) -> Result<Option<String>, EnaError> {
    element
        .try_get_attribute(name)
        .map_err(|err| EnaError::Receipt(err.to_string()))?
        .map(|attr| {
            attr.unescape_value()
                .map(|value| value.into_owned())
                .map_err(|err| EnaError::Receipt(err.to_string()))
        })
        .transpose()
}

fn required_attribute(element: &BytesStart, name: &str) -> Result<String, EnaError> {
    attribute(element, name)?.ok_or_else(|| {
        EnaError::Receipt(format!(
            "{} element is missing the {name} attribute",
            String::from_utf8_lossy(element.name().as_ref())
        ))
    })
}

fn strip_prefix(alias: &str, prefix: &str) -> Result<String, EnaError> {
    alias
        .strip_prefix(prefix)
        .map(str::to_string)
        .ok_or_else(|| EnaError::Receipt(format!("alias {alias} does not start with {prefix}")))
}

fn entry<'a>(
    order: &mut Vec<String>,
    pairs: &'a mut HashMap<String, (Option<String>, Option<String>)>,
    alias: String,
) -> &'a mut (Option<String>, Option<String>) {
    if !pairs.contains_key(&alias) {
        order.push(alias.clone());
    }
    pairs.entry(alias).or_default()
}

fn write_lines(output: &Utf8Path, lines: &[String]) -> Result<(), EnaError> {
    let mut content = lines.join("\n");
    content.push('\n');
    fs_util::write_bytes_atomic(output, content.as_bytes())
}
