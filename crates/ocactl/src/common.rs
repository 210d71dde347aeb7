use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use oca::xmlrpc;
use oca::{Arg, AttributeView, Field, Transport, TransportError};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

/// Resource kinds selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Vm,
    Host,
    Image,
    Vnet,
    User,
}

/// Transport answering calls from canned response files.
///
/// `call(method, args)` reads `<dir>/<method>-<first arg>.xml` when it exists
/// and `<dir>/<method>.xml` otherwise. Files holding an XML-RPC
/// `methodResponse` are decoded; anything else is returned as is.
#[derive(Debug, Clone)]
pub struct DirTransport {
    root: PathBuf,
}

impl DirTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, method: &str, args: &[Arg]) -> PathBuf {
        if let Some(first) = args.first() {
            let specific = self.root.join(format!("{method}-{first}.xml"));
            if specific.is_file() {
                return specific;
            }
        }
        self.root.join(format!("{method}.xml"))
    }
}

impl Transport for DirTransport {
    fn call(&self, method: &str, args: &[Arg]) -> Result<String, TransportError> {
        let path = self.resolve(method, args);
        debug!(method, path = %path.display(), "reading canned response");
        let text = fs::read_to_string(&path)
            .map_err(|err| TransportError::Io(format!("{}: {err}", path.display())))?;
        if text.contains("<methodResponse") {
            xmlrpc::decode_response(&text)
        } else {
            Ok(text)
        }
    }
}

/// Every field of a view as JSON.
///
/// Declared values come first under their declared names; children no
/// declared field consumed follow, keyed by lower-cased tag.
pub fn view_json(view: &AttributeView) -> Result<Map<String, JsonValue>> {
    let mut map = Map::new();
    for (name, value) in view.declared_values() {
        let json = serde_json::to_value(value).with_context(|| format!("serialise {name}"))?;
        map.insert(name.to_string(), json);
    }
    for name in view.undeclared_names() {
        let value = match view.raw(&name)? {
            Field::Text(v) => JsonValue::from(v),
            Field::Element(element) if element.children().is_empty() => JsonValue::from(""),
            Field::Element(element) => JsonValue::from(element.to_xml()?),
            Field::Int(v) => JsonValue::from(v),
            Field::Float(v) => JsonValue::from(v),
            Field::Template(template) => serde_json::to_value(template)?,
        };
        map.insert(name, value);
    }
    Ok(map)
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialise JSON output")?;
    println!("{text}");
    Ok(())
}
