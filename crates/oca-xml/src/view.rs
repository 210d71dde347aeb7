use serde::Serialize;
use tracing::trace;

use crate::template::{MultiTags, Template};
use crate::{parse_document, XmlElement, XmlError};

/// Coercion applied to a declared field when a view is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Parse the child's text as a signed integer.
    Int,
    /// Parse the child's text as a floating point number.
    Float,
    /// Keep the child's text; an element without text reads as `""`.
    Text,
    /// Build a [`Template`] from the child element at `tag`.
    Template { tag: &'static str, multi: MultiTags },
}

/// One entry of a per-kind field schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: &'static str,
    pub rule: FieldRule,
}

impl FieldDecl {
    pub const fn int(name: &'static str) -> Self {
        Self {
            name,
            rule: FieldRule::Int,
        }
    }

    pub const fn float(name: &'static str) -> Self {
        Self {
            name,
            rule: FieldRule::Float,
        }
    }

    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            rule: FieldRule::Text,
        }
    }

    pub const fn template(name: &'static str, tag: &'static str, multi: MultiTags) -> Self {
        Self {
            name,
            rule: FieldRule::Template { tag, multi },
        }
    }

    /// Child tag the field is read from.
    pub fn tag(&self) -> &'static str {
        match self.rule {
            FieldRule::Template { tag, .. } => tag,
            _ => self.name,
        }
    }
}

/// Value produced by a declared field rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    Template(Template),
}

/// Result of a field lookup on an [`AttributeView`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field<'a> {
    Int(i64),
    Float(f64),
    Text(&'a str),
    Template(&'a Template),
    /// Child element without text content, typically a nested block.
    Element(&'a XmlElement),
}

impl<'a> From<&'a Value> for Field<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Int(v) => Field::Int(*v),
            Value::Float(v) => Field::Float(*v),
            Value::Text(v) => Field::Text(v),
            Value::Template(v) => Field::Template(v),
        }
    }
}

/// View over one XML element exposing its children as named fields.
///
/// Declared fields are coerced once when the view is built and take
/// precedence on lookup; every other direct child is resolved dynamically by
/// upper-casing the requested name.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeView {
    element: XmlElement,
    declared: Vec<(FieldDecl, Value)>,
}

impl AttributeView {
    /// Build a view over `element`, applying the declared `schema`.
    ///
    /// Declared fields whose child element is missing stay unpopulated.
    pub fn new(element: XmlElement, schema: &[FieldDecl]) -> Result<Self, XmlError> {
        let mut declared = Vec::with_capacity(schema.len());
        for decl in schema {
            if let Some(value) = convert(&element, decl)? {
                declared.push((*decl, value));
            }
        }
        Ok(Self { element, declared })
    }

    /// View without declared fields; every lookup is dynamic.
    pub fn untyped(element: XmlElement) -> Self {
        Self {
            element,
            declared: Vec::new(),
        }
    }

    /// Parse `xml`, check its root tag against `expected_root`, and apply `schema`.
    pub fn initialize_from(
        xml: &str,
        expected_root: &str,
        schema: &[FieldDecl],
    ) -> Result<Self, XmlError> {
        let element = parse_document(xml)?;
        if !element.has_tag(expected_root) {
            return Err(XmlError::InvalidRoot {
                expected: expected_root.to_string(),
                found: element.tag().to_string(),
            });
        }
        trace!(root = %element.tag(), children = element.children().len(), "parsed view");
        Self::new(element, schema)
    }

    /// Root tag of the wrapped element.
    pub fn tag(&self) -> &str {
        self.element.tag()
    }

    pub fn element(&self) -> &XmlElement {
        &self.element
    }

    pub fn into_element(self) -> XmlElement {
        self.element
    }

    /// Look up a field: declared values first, then the matching child element.
    pub fn get(&self, name: &str) -> Result<Field<'_>, XmlError> {
        if let Some(value) = self.declared(name) {
            return Ok(Field::from(value));
        }
        self.raw(name)
    }

    /// Dynamic lookup of the child whose tag equals `name` upper-cased.
    pub fn raw(&self, name: &str) -> Result<Field<'_>, XmlError> {
        let tag = name.to_ascii_uppercase();
        let child = self
            .element
            .find(&tag)
            .ok_or_else(|| XmlError::FieldNotFound(name.to_string()))?;
        Ok(match child.text() {
            Some(text) => Field::Text(text),
            None => Field::Element(child),
        })
    }

    /// Declared value for `name`, if the schema produced one.
    pub fn declared(&self, name: &str) -> Option<&Value> {
        self.declared
            .iter()
            .find(|(decl, _)| decl.name.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    /// Declared values in schema order.
    pub fn declared_values(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.declared.iter().map(|(decl, value)| (decl.name, value))
    }

    pub fn get_int(&self, name: &str) -> Result<i64, XmlError> {
        match self.get(name)? {
            Field::Int(value) => Ok(value),
            Field::Text(text) => parse_int(name, text),
            other => Err(mismatch(name, other, "integer")),
        }
    }

    pub fn get_float(&self, name: &str) -> Result<f64, XmlError> {
        match self.get(name)? {
            Field::Float(value) => Ok(value),
            Field::Int(value) => Ok(value as f64),
            Field::Text(text) => parse_float(name, text),
            other => Err(mismatch(name, other, "float")),
        }
    }

    pub fn get_str(&self, name: &str) -> Result<&str, XmlError> {
        match self.get(name)? {
            Field::Text(text) => Ok(text),
            other => Err(mismatch(name, other, "text")),
        }
    }

    pub fn template(&self, name: &str) -> Result<&Template, XmlError> {
        match self.get(name)? {
            Field::Template(template) => Ok(template),
            other => Err(mismatch(name, other, "template")),
        }
    }

    /// Distinct lower-cased child tags in document order.
    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for child in self.element.children() {
            let name = child.tag().to_ascii_lowercase();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Child tags not consumed by a populated declared field, lower-cased.
    pub fn undeclared_names(&self) -> Vec<String> {
        self.field_names()
            .into_iter()
            .filter(|name| {
                !self
                    .declared
                    .iter()
                    .any(|(decl, _)| decl.tag().eq_ignore_ascii_case(name))
            })
            .collect()
    }
}

fn convert(element: &XmlElement, decl: &FieldDecl) -> Result<Option<Value>, XmlError> {
    let value = match decl.rule {
        FieldRule::Template { tag, multi } => element
            .find(tag)
            .map(|child| Value::Template(Template::new(child.clone(), multi))),
        FieldRule::Int => match element.find(decl.name) {
            Some(child) => Some(Value::Int(parse_int(decl.name, child.text().unwrap_or(""))?)),
            None => None,
        },
        FieldRule::Float => match element.find(decl.name) {
            Some(child) => Some(Value::Float(parse_float(
                decl.name,
                child.text().unwrap_or(""),
            )?)),
            None => None,
        },
        FieldRule::Text => element
            .find(decl.name)
            .map(|child| Value::Text(child.text().unwrap_or("").to_string())),
    };
    Ok(value)
}

fn parse_int(field: &str, text: &str) -> Result<i64, XmlError> {
    text.trim().parse().map_err(|_| XmlError::Convert {
        field: field.to_string(),
        value: text.to_string(),
        expected: "integer",
    })
}

fn parse_float(field: &str, text: &str) -> Result<f64, XmlError> {
    text.trim().parse().map_err(|_| XmlError::Convert {
        field: field.to_string(),
        value: text.to_string(),
        expected: "float",
    })
}

fn mismatch(field: &str, found: Field<'_>, expected: &'static str) -> XmlError {
    let value = match found {
        Field::Int(v) => v.to_string(),
        Field::Float(v) => v.to_string(),
        Field::Text(v) => v.to_string(),
        Field::Template(t) => format!("<{}>", t.tag()),
        Field::Element(e) => format!("<{}>", e.tag()),
    };
    XmlError::Convert {
        field: field.to_string(),
        value,
        expected,
    }
}
