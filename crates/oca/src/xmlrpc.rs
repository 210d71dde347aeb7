//! XML-RPC envelopes as spoken by the OpenNebula daemon (transport-agnostic).
//!
//! Responses are arrays whose first value is a success flag and whose second
//! value is either the payload XML or an error message.

use oca_core::{Arg, TransportError};
use oca_xml::{parse_document, XmlElement};
use tracing::debug;

/// Error code reported when a failed response carries none.
pub const UNKNOWN_FAULT_CODE: i64 = -1;

/// Encode a `methodCall` document for `method` with `args` as params.
pub fn encode_call(method: &str, args: &[Arg]) -> Result<String, TransportError> {
    let mut params = XmlElement::new("params");
    for arg in args {
        let scalar = match arg {
            Arg::Int(v) => XmlElement::new("int").with_text(v.to_string()),
            Arg::Bool(v) => XmlElement::new("boolean").with_text(if *v { "1" } else { "0" }),
            Arg::Str(v) => XmlElement::new("string").with_text(v.as_str()),
        };
        let value = XmlElement::new("value").with_child(scalar);
        params = params.with_child(XmlElement::new("param").with_child(value));
    }
    let call = XmlElement::new("methodCall")
        .with_child(XmlElement::new("methodName").with_text(method))
        .with_child(params);
    let body = call
        .to_xml()
        .map_err(|err| TransportError::Io(format!("encode {method}: {err}")))?;
    Ok(format!("<?xml version=\"1.0\"?>{body}"))
}

/// Decode a `methodResponse`, returning the payload on success.
pub fn decode_response(xml: &str) -> Result<String, TransportError> {
    let root = parse_document(xml).map_err(|err| malformed(&err.to_string()))?;
    if !root.has_tag("methodResponse") {
        return Err(malformed(&format!("unexpected root <{}>", root.tag())));
    }
    if let Some(fault) = root.find("fault") {
        return Err(decode_fault(fault));
    }
    let values: Vec<&XmlElement> = root
        .find("params")
        .and_then(|params| params.find("param"))
        .and_then(|param| param.find("value"))
        .and_then(|value| value.find("array"))
        .and_then(|array| array.find("data"))
        .map(|data| data.find_all("value").collect())
        .ok_or_else(|| malformed("missing response array"))?;

    let success = match values.first().and_then(|value| scalar(value)) {
        Some(Scalar::Bool(flag)) => flag,
        _ => return Err(malformed("missing success flag")),
    };
    let payload = match values.get(1).and_then(|value| scalar(value)) {
        Some(Scalar::Str(text)) => text.to_string(),
        Some(Scalar::Int(v)) => v.to_string(),
        _ => return Err(malformed("missing response payload")),
    };
    if success {
        return Ok(payload);
    }
    let code = match values.get(2).and_then(|value| scalar(value)) {
        Some(Scalar::Int(code)) => code,
        _ => UNKNOWN_FAULT_CODE,
    };
    debug!(code, message = %payload, "call failed");
    Err(TransportError::Fault {
        code,
        message: payload,
    })
}

enum Scalar<'a> {
    Int(i64),
    Bool(bool),
    Str(&'a str),
}

// An untyped `<value>` is a string.
fn scalar(value: &XmlElement) -> Option<Scalar<'_>> {
    let Some(typed) = value.children().first() else {
        return Some(Scalar::Str(value.text().unwrap_or("")));
    };
    let text = typed.text().unwrap_or("");
    match typed.tag() {
        "int" | "i4" | "i8" => text.trim().parse().ok().map(Scalar::Int),
        "boolean" => match text.trim() {
            "1" => Some(Scalar::Bool(true)),
            "0" => Some(Scalar::Bool(false)),
            _ => None,
        },
        "string" => Some(Scalar::Str(text)),
        _ => None,
    }
}

fn decode_fault(fault: &XmlElement) -> TransportError {
    let members = fault
        .find("value")
        .and_then(|value| value.find("struct"))
        .map(|st| st.find_all("member").collect::<Vec<_>>())
        .unwrap_or_default();
    let mut code = UNKNOWN_FAULT_CODE;
    let mut message = String::from("unknown fault");
    for member in members {
        let name = member.find("name").and_then(XmlElement::text);
        let value = member.find("value").and_then(scalar);
        match (name, value) {
            (Some("faultCode"), Some(Scalar::Int(v))) => code = v,
            (Some("faultString"), Some(Scalar::Str(v))) => message = v.to_string(),
            _ => {}
        }
    }
    TransportError::Fault { code, message }
}

fn malformed(reason: &str) -> TransportError {
    TransportError::Io(format!("malformed response: {reason}"))
}
