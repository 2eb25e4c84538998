use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDate;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tracing::info;

use crate::error::EnaError;
use crate::fs_util;

pub const SUBMISSION_FILE_NAME: &str = "submission.xml";

/// One node of a submission document: tag name, ordered attributes, ordered
/// children, optional text. Trees are built functionally with the `attr`/
/// `child`/`text` builders and handed to the serializer as a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlNode {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
    pub text: Option<String>,
}

impl XmlNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            text: None,
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn child(mut self, node: XmlNode) -> Self {
        self.children.push(node);
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// First child with the given tag name.
    pub fn find(&self, tag: &str) -> Option<&XmlNode> {
        self.children.iter().find(|child| child.tag == tag)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(attr, _)| attr == name)
            .map(|(_, value)| value.as_str())
    }

    /// Serialize the tree to a single-line XML document with an encoding
    /// declaration.
    pub fn to_xml(&self) -> Result<String, EnaError> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|err| EnaError::Serialization(err.to_string()))?;
        self.write_events(&mut writer)?;
        let buffer = writer.into_inner();
        String::from_utf8(buffer).map_err(|err| EnaError::Serialization(err.to_string()))
    }

    fn write_events(&self, writer: &mut Writer<Vec<u8>>) -> Result<(), EnaError> {
        let mut start = BytesStart::new(self.tag.as_str());
        for (name, value) in &self.attributes {
            start.push_attribute((name.as_str(), value.as_str()));
        }

        if self.children.is_empty() && self.text.is_none() {
            return writer
                .write_event(Event::Empty(start))
                .map_err(|err| EnaError::Serialization(err.to_string()));
        }

        writer
            .write_event(Event::Start(start))
            .map_err(|err| EnaError::Serialization(err.to_string()))?;
        if let Some(text) = &self.text {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(|err| EnaError::Serialization(err.to_string()))?;
        }
        for child in &self.children {
            child.write_events(writer)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.tag.as_str())))
            .map_err(|err| EnaError::Serialization(err.to_string()))
    }

    /// Serialize and write atomically.
    pub fn write(&self, path: &Utf8Path) -> Result<(), EnaError> {
        let document = self.to_xml()?;
        fs_util::write_bytes_atomic(path, document.as_bytes())?;
        info!(path = %path, "wrote document");
        Ok(())
    }
}

/// The submission envelope shared by both builders: ACTIONS with one ADD
/// ("register everything in the accompanying documents") and, when a hold
/// date is given, a second ACTION deferring the public release.
pub fn submission_envelope(hold_until: Option<NaiveDate>) -> XmlNode {
    let mut actions = XmlNode::new("ACTIONS").child(XmlNode::new("ACTION").child(XmlNode::new("ADD")));
    if let Some(date) = hold_until {
        actions = actions.child(
            XmlNode::new("ACTION").child(
                XmlNode::new("HOLD").attr("HoldUntilDate", date.format("%Y-%m-%d").to_string()),
            ),
        );
    }
    XmlNode::new("SUBMISSION").child(actions)
}

/// Write `submission.xml` into `directory` and return its path.
pub fn write_submission(
    directory: &Utf8Path,
    hold_until: Option<NaiveDate>,
) -> Result<Utf8PathBuf, EnaError> {
    let path = directory.join(SUBMISSION_FILE_NAME);
    submission_envelope(hold_until).write(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_nested_document() {
        let node = XmlNode::new("SAMPLE_SET").child(
            XmlNode::new("SAMPLE")
                .attr("alias", "S1")
                .attr("center_name", "X")
                .child(XmlNode::new("TITLE").text("T1"))
                .child(XmlNode::new("SAMPLE_ATTRIBUTES")),
        );

        let xml = node.to_xml().unwrap();
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <SAMPLE_SET><SAMPLE alias=\"S1\" center_name=\"X\">\
             <TITLE>T1</TITLE><SAMPLE_ATTRIBUTES/></SAMPLE></SAMPLE_SET>"
        );
    }

    #[test]
    fn serialize_escapes_special_characters() {
        let node = XmlNode::new("TITLE")
            .attr("note", "a<b")
            .text("salt & pepper");
        let xml = node.to_xml().unwrap();
        assert!(xml.contains("note=\"a&lt;b\""));
        assert!(xml.contains("salt &amp; pepper"));
    }

    #[test]
    fn envelope_without_hold() {
        let envelope = submission_envelope(None);
        assert_eq!(envelope.tag, "SUBMISSION");
        let actions = envelope.find("ACTIONS").unwrap();
        assert_eq!(actions.children.len(), 1);
        assert!(actions.children[0].find("ADD").is_some());
    }

    #[test]
    fn envelope_with_hold_date() {
        let date = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
        let envelope = submission_envelope(Some(date));
        let actions = envelope.find("ACTIONS").unwrap();
        assert_eq!(actions.children.len(), 2);
        assert!(actions.children[0].find("ADD").is_some());
        let hold = actions.children[1].find("HOLD").unwrap();
        assert_eq!(hold.attribute("HoldUntilDate"), Some("2026-12-31"));
    }
}
