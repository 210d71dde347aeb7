use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::{XmlElement, XmlError};

/// Tag names that may repeat under one parent and become ordered sequences.
pub type MultiTags = &'static [&'static str];

/// Attachments of a virtual machine template.
pub const VM_TEMPLATE_TAGS: MultiTags = &["DISK", "NIC"];

/// Configuration for templates where every tag is a scalar.
pub const NO_MULTI_TAGS: MultiTags = &[];

/// Recursively parsed configuration block.
///
/// Repeatable tags turn into sequences of nested templates keyed by the
/// lower-cased tag plus `s` (`DISK` becomes `disks`). A sequence exists for
/// every configured tag, empty when the tag never occurs. Other children are
/// scalar text fields keyed by lower-cased tag; a repeated scalar tag keeps
/// the last occurrence.
///
/// Only the outermost template keeps its source element; nested templates
/// hold their parsed fields alone.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    tag: String,
    source: Option<XmlElement>,
    multi: MultiTags,
    scalars: BTreeMap<String, String>,
    sequences: BTreeMap<String, Vec<Template>>,
}

impl Template {
    /// Parse `element` treating the tags in `multi` as repeatable, recursively.
    pub fn new(element: XmlElement, multi: MultiTags) -> Self {
        let mut template = Self::parse(&element, multi);
        template.source = Some(element);
        template
    }

    fn parse(element: &XmlElement, multi: MultiTags) -> Self {
        let mut scalars = BTreeMap::new();
        let mut sequences: BTreeMap<String, Vec<Template>> = multi
            .iter()
            .map(|tag| (sequence_key(tag), Vec::new()))
            .collect();
        for child in element.children() {
            if let Some(tag) = multi.iter().find(|tag| child.has_tag(tag)) {
                sequences
                    .entry(sequence_key(tag))
                    .or_default()
                    .push(Template::parse(child, multi));
            } else {
                scalars.insert(
                    child.tag().to_ascii_lowercase(),
                    child.text().unwrap_or("").to_string(),
                );
            }
        }
        Self {
            tag: element.tag().to_string(),
            source: None,
            multi,
            scalars,
            sequences,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The element this template was parsed from; `None` for nested templates.
    pub fn source(&self) -> Option<&XmlElement> {
        self.source.as_ref()
    }

    pub fn multi_tags(&self) -> MultiTags {
        self.multi
    }

    /// Scalar field by name, case-insensitive.
    pub fn get(&self, name: &str) -> Result<&str, XmlError> {
        self.scalars
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
            .ok_or_else(|| XmlError::FieldNotFound(name.to_string()))
    }

    /// Sequence by plural name such as `disks`.
    pub fn sequence(&self, name: &str) -> Result<&[Template], XmlError> {
        self.sequences
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
            .ok_or_else(|| XmlError::FieldNotFound(name.to_string()))
    }

    pub fn scalars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.scalars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn sequences(&self) -> impl Iterator<Item = (&str, &[Template])> {
        self.sequences
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// XML text of the template.
    ///
    /// The outermost template writes its source element unchanged. Nested
    /// templates are rebuilt with scalars first, then sequence entries.
    pub fn to_xml(&self) -> Result<String, XmlError> {
        match &self.source {
            Some(element) => element.to_xml(),
            None => self.rebuild().to_xml(),
        }
    }

    fn rebuild(&self) -> XmlElement {
        let mut element = XmlElement::new(self.tag.as_str());
        for (name, value) in &self.scalars {
            element = element
                .with_child(XmlElement::new(name.to_ascii_uppercase()).with_text(value.as_str()));
        }
        for entry in self.sequences.values().flatten() {
            element = element.with_child(entry.rebuild());
        }
        element
    }
}

// A scalar whose key is also a sequence key is written under its upper-cased
// tag so both values survive in one JSON object.
impl Serialize for Template {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.scalars.len() + self.sequences.len()))?;
        for (name, value) in &self.scalars {
            if self.sequences.contains_key(name) {
                map.serialize_entry(&name.to_ascii_uppercase(), value)?;
            } else {
                map.serialize_entry(name, value)?;
            }
        }
        for (name, entries) in &self.sequences {
            map.serialize_entry(name, entries)?;
        }
        map.end()
    }
}

fn sequence_key(tag: &str) -> String {
    format!("{}s", tag.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_document;

    fn template(xml: &str, multi: MultiTags) -> Template {
        Template::new(parse_document(xml).expect("parse template"), multi)
    }

    #[test]
    fn repeated_disks_keep_document_order() {
        let tpl = template(
            "<VM><DISK><ID>0</ID></DISK><DISK><ID>1</ID></DISK></VM>",
            VM_TEMPLATE_TAGS,
        );
        let disks = tpl.sequence("disks").expect("disks");
        assert_eq!(disks.len(), 2);
        assert_eq!(disks[0].get("id").unwrap(), "0");
        assert_eq!(disks[1].get("id").unwrap(), "1");
        assert!(matches!(tpl.get("disk"), Err(XmlError::FieldNotFound(_))));
    }

    #[test]
    fn configured_sequences_always_present() {
        let tpl = template("<TEMPLATE><MEMORY>128</MEMORY></TEMPLATE>", VM_TEMPLATE_TAGS);
        assert!(tpl.sequence("disks").unwrap().is_empty());
        assert!(tpl.sequence("NICS").unwrap().is_empty());
        assert!(matches!(
            tpl.sequence("graphics"),
            Err(XmlError::FieldNotFound(_))
        ));
        assert_eq!(tpl.get("MEMORY").unwrap(), "128");
    }

    #[test]
    fn nested_templates_share_configuration() {
        let tpl = template(
            r#"
            <TEMPLATE>
                <NIC>
                    <NETWORK>public</NETWORK>
                    <DISK><SIZE>1</SIZE></DISK>
                </NIC>
                <GRAPHICS><TYPE>vnc</TYPE></GRAPHICS>
            </TEMPLATE>
            "#,
            VM_TEMPLATE_TAGS,
        );
        let nics = tpl.sequence("nics").expect("nics");
        assert_eq!(nics.len(), 1);
        assert_eq!(nics[0].get("network").unwrap(), "public");
        assert_eq!(nics[0].sequence("disks").unwrap()[0].get("size").unwrap(), "1");
        assert_eq!(tpl.get("graphics").unwrap(), "");
        assert_eq!(nics[0].tag(), "NIC");
    }

    #[test]
    fn repeated_scalar_last_write_wins() {
        let tpl = template(
            "<TEMPLATE><NAME>first</NAME><NAME>second</NAME></TEMPLATE>",
            NO_MULTI_TAGS,
        );
        assert_eq!(tpl.get("name").unwrap(), "second");
        assert_eq!(tpl.scalars().count(), 1);
    }

    #[test]
    fn serializes_scalars_and_sequences() {
        let tpl = template(
            "<TEMPLATE><CPU>1</CPU><DISK><ID>3</ID></DISK></TEMPLATE>",
            VM_TEMPLATE_TAGS,
        );
        let json = serde_json::to_value(&tpl).expect("serialize");
        assert_eq!(json["cpu"], "1");
        assert_eq!(json["disks"][0]["id"], "3");
        assert_eq!(json["nics"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn scalar_named_like_a_sequence_keeps_both_in_json() {
        let tpl = template(
            "<TEMPLATE><DISKS>scalar</DISKS><DISK><ID>0</ID></DISK></TEMPLATE>",
            VM_TEMPLATE_TAGS,
        );
        assert_eq!(tpl.get("disks").unwrap(), "scalar");
        assert_eq!(tpl.sequence("disks").unwrap().len(), 1);

        let text = serde_json::to_string(&tpl).expect("serialize");
        assert_eq!(text.matches("\"disks\"").count(), 1);
        let json: serde_json::Value = serde_json::from_str(&text).expect("reparse");
        assert_eq!(json["DISKS"], "scalar");
        assert_eq!(json["disks"][0]["id"], "0");
        assert_eq!(json["nics"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn only_outermost_template_keeps_source() {
        let xml = "<TEMPLATE><CPU>1</CPU><NIC><IP>10.0.0.2</IP><DISK><SIZE>4</SIZE></DISK></NIC></TEMPLATE>";
        let tpl = template(xml, VM_TEMPLATE_TAGS);
        assert_eq!(tpl.source().map(XmlElement::tag), Some("TEMPLATE"));
        assert_eq!(tpl.to_xml().unwrap(), xml);

        let nic = &tpl.sequence("nics").unwrap()[0];
        assert!(nic.source().is_none());
        assert!(nic.sequence("disks").unwrap()[0].source().is_none());
        assert_eq!(
            nic.to_xml().unwrap(),
            "<NIC><IP>10.0.0.2</IP><DISK><SIZE>4</SIZE></DISK></NIC>"
        );
    }
}
