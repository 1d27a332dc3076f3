//! Shared SOAP plumbing for both inventory backends
//!
//! Responses are small, so they are read into a lightweight element tree
//! keyed by local name (namespace prefixes differ between deployments).

use crate::error::InventoryQueryError;
use crate::models::{Backend, StyleCode};
use lazy_static::lazy_static;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use reqwest::StatusCode;
use std::time::Duration;

lazy_static! {
    static ref SECRET_ELEMENT_RE: Regex =
        Regex::new(r"(<(?:[\w-]+:)?(?:id|password|arg0|arg1|arg2)>)[^<]*(</)")
            .expect("valid secret element regex");
}

pub(crate) const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Element of a parsed response, namespace prefixes stripped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct XmlNode {
    pub name: String,
    pub text: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    fn named(name: &[u8]) -> Self {
        Self {
            name: String::from_utf8_lossy(name).into_owned(),
            ..Self::default()
        }
    }

    /// First direct child with the given local name
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All direct children with the given local name
    pub fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Trimmed text of a direct child, `None` when absent or blank
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name)
            .map(|c| c.text.trim())
            .filter(|t| !t.is_empty())
    }

    /// First descendant (depth first) with the given local name
    pub fn find(&self, name: &str) -> Option<&XmlNode> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// Every descendant with the given local name, in document order
    pub fn find_all<'a>(&'a self, name: &str) -> Vec<&'a XmlNode> {
        let mut found = Vec::new();
        self.collect(name, &mut found);
        found
    }

    fn collect<'a>(&'a self, name: &str, found: &mut Vec<&'a XmlNode>) {
        for child in &self.children {
            if child.name == name {
                found.push(child);
            }
            child.collect(name, found);
        }
    }
}

/// Parse a whole XML document and return its root element
pub(crate) fn parse_document(xml: &str) -> Result<XmlNode, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    // Synthetic parent of the document element
    let mut stack = vec![XmlNode::default()];

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(XmlNode::named(e.local_name().as_ref())),
            Ok(Event::Empty(e)) => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(XmlNode::named(e.local_name().as_ref()));
                }
            }
            Ok(Event::End(_)) => {
                let node = stack.pop().filter(|_| !stack.is_empty());
                match (node, stack.last_mut()) {
                    (Some(node), Some(parent)) => parent.children.push(node),
                    _ => return Err("unbalanced closing tag".to_string()),
                }
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(|e| e.to_string())?;
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&text);
                }
            }
            Ok(Event::CData(c)) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "XML error at position {}: {}",
                    reader.buffer_position(),
                    e
                ))
            }
            _ => {}
        }
    }

    if stack.len() != 1 {
        return Err("unexpected end of document".to_string());
    }
    stack
        .pop()
        .and_then(|root| root.children.into_iter().next())
        .ok_or_else(|| "empty document".to_string())
}

/// Text of a SOAP 1.1 or 1.2 fault in the body, if there is one
pub(crate) fn fault_message(doc: &XmlNode) -> Option<String> {
    let fault = doc.find("Fault")?;
    let message = fault
        .child_text("faultstring")
        .or_else(|| fault.child("Reason").and_then(|r| r.child_text("Text")))
        .unwrap_or("unspecified SOAP fault");
    Some(message.to_string())
}

/// Parse a response body and turn faults and bad statuses into errors
pub(crate) fn check_response(
    backend: Backend,
    style: &StyleCode,
    status: StatusCode,
    body: &str,
) -> Result<XmlNode, InventoryQueryError> {
    let doc = match parse_document(body) {
        Ok(doc) => doc,
        Err(reason) if status.is_success() => {
            return Err(InventoryQueryError::Malformed {
                backend,
                style: style.to_string(),
                reason,
            })
        }
        Err(_) => {
            return Err(InventoryQueryError::HttpStatus {
                backend,
                style: style.to_string(),
                status,
            })
        }
    };

    if let Some(message) = fault_message(&doc) {
        return Err(InventoryQueryError::Fault {
            backend,
            style: style.to_string(),
            message,
        });
    }

    if !status.is_success() {
        return Err(InventoryQueryError::HttpStatus {
            backend,
            style: style.to_string(),
            status,
        });
    }

    Ok(doc)
}

/// Parse a quantity element's text. Blank means zero.
pub(crate) fn parse_quantity(raw: Option<&str>) -> Result<u64, String> {
    let raw = match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Ok(0),
    };

    if let Ok(value) = raw.parse::<u64>() {
        return Ok(value);
    }
    if let Ok(value) = raw.parse::<i64>() {
        log::warn!("Negative quantity {} treated as 0", value);
        return Ok(0);
    }

    // Some deployments send "12.0"; anything outside u64 is not a count
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() == 0.0 => {
            if value < 0.0 {
                log::warn!("Negative quantity {} treated as 0", raw);
                Ok(0)
            } else if value < u64::MAX as f64 {
                Ok(value as u64)
            } else {
                Err(format!("quantity {raw:?} out of range"))
            }
        }
        _ => Err(format!("invalid quantity {raw:?}")),
    }
}

/// Escape a value for element content
pub(crate) fn escape(value: &str) -> String {
    quick_xml::escape::escape(value).into_owned()
}

/// Replace credential values in a request envelope before logging it
pub fn mask_credentials(xml: &str) -> String {
    SECRET_ELEMENT_RE.replace_all(xml, "${1}***${2}").into_owned()
}

/// Blocking HTTP transport bound to one service endpoint
pub(crate) struct SoapTransport {
    client: reqwest::blocking::Client,
    endpoint: String,
    backend: Backend,
}

impl SoapTransport {
    pub fn new(
        backend: Backend,
        endpoint: String,
        timeout: Duration,
    ) -> Result<Self, InventoryQueryError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(InventoryQueryError::HttpClient)?;
        Ok(Self {
            client,
            endpoint,
            backend,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST an envelope and return the checked response document
    pub fn call(
        &self,
        style: &StyleCode,
        soap_action: &str,
        envelope: String,
    ) -> Result<XmlNode, InventoryQueryError> {
        log::debug!(
            "POST {} ({}) for {}: {}",
            self.endpoint,
            self.backend,
            style,
            mask_credentials(&envelope)
        );

        let network = |source| InventoryQueryError::Network {
            backend: self.backend,
            style: style.to_string(),
            source,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "text/xml; charset=utf-8")
            .header("SOAPAction", soap_action)
            .body(envelope)
            .send()
            .map_err(network)?;

        let status = response.status();
        let body = response.text().map_err(network)?;
        log::debug!(
            "{} answered HTTP {} ({} bytes) for {}",
            self.backend,
            status,
            body.len(),
            style
        );

        check_response(self.backend, style, status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(code: &str) -> StyleCode {
        StyleCode::new(code).unwrap()
    }

    #[test]
    fn parses_nested_elements_without_prefixes() {
        let doc = parse_document(
            r#"<?xml version="1.0"?>
            <S:Envelope xmlns:S="http://schemas.xmlsoap.org/soap/envelope/">
              <S:Body>
                <ns2:item><ns2:name>Tee &amp; Polo</ns2:name><ns2:empty/></ns2:item>
                <ns2:item><ns2:name><![CDATA[<raw>]]></ns2:name></ns2:item>
              </S:Body>
            </S:Envelope>"#,
        )
        .unwrap();

        assert_eq!(doc.name, "Envelope");
        let body = doc.child("Body").unwrap();
        let items: Vec<_> = body.children("item").collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].child_text("name"), Some("Tee & Polo"));
        assert!(items[0].child("empty").is_some());
        assert_eq!(items[0].child_text("empty"), None);
        assert_eq!(items[1].child_text("name"), Some("<raw>"));
        assert_eq!(doc.find_all("name").len(), 2);
    }

    #[test]
    fn rejects_broken_documents() {
        assert!(parse_document("").is_err());
        assert!(parse_document("<a><b></a>").is_err());
        assert!(parse_document("<a><b>").is_err());
        assert!(parse_document("not xml at all").is_err());
    }

    #[test]
    fn finds_soap_11_and_12_faults() {
        let soap11 = parse_document(
            r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body>
                <soap:Fault><faultcode>soap:Client</faultcode><faultstring>Authentication failed</faultstring></soap:Fault>
            </soap:Body></soap:Envelope>"#,
        )
        .unwrap();
        assert_eq!(fault_message(&soap11).as_deref(), Some("Authentication failed"));

        let soap12 = parse_document(
            r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"><env:Body>
                <env:Fault><env:Reason><env:Text xml:lang="en">Bad request</env:Text></env:Reason></env:Fault>
            </env:Body></env:Envelope>"#,
        )
        .unwrap();
        assert_eq!(fault_message(&soap12).as_deref(), Some("Bad request"));

        let clean = parse_document("<Envelope><Body><ok/></Body></Envelope>").unwrap();
        assert_eq!(fault_message(&clean), None);
    }

    #[test]
    fn check_response_prefers_fault_text_over_status() {
        let body = r#"<Envelope><Body><Fault><faultstring>User is not authorized</faultstring></Fault></Body></Envelope>"#;
        match check_response(
            Backend::PromoStandards,
            &style("K420"),
            StatusCode::INTERNAL_SERVER_ERROR,
            body,
        ) {
            Err(InventoryQueryError::Fault { style, message, .. }) => {
                assert_eq!(style, "K420");
                assert_eq!(message, "User is not authorized");
            }
            other => panic!("Expected InventoryQueryError::Fault, got: {other:?}"),
        }
    }

    #[test]
    fn check_response_classifies_unparsable_bodies() {
        let err = check_response(Backend::Standard, &style("PC61"), StatusCode::BAD_GATEWAY, "")
            .unwrap_err();
        assert!(matches!(err, InventoryQueryError::HttpStatus { status, .. } if status == StatusCode::BAD_GATEWAY));

        let err = check_response(Backend::Standard, &style("PC61"), StatusCode::OK, "<html>")
            .unwrap_err();
        assert!(matches!(err, InventoryQueryError::Malformed { .. }));
    }

    #[test]
    fn quantities_default_to_zero_and_clamp() {
        assert_eq!(parse_quantity(None), Ok(0));
        assert_eq!(parse_quantity(Some("")), Ok(0));
        assert_eq!(parse_quantity(Some("  ")), Ok(0));
        assert_eq!(parse_quantity(Some("42")), Ok(42));
        assert_eq!(parse_quantity(Some("12.0")), Ok(12));
        assert_eq!(parse_quantity(Some("-3")), Ok(0));
        assert!(parse_quantity(Some("lots")).is_err());
        assert!(parse_quantity(Some("1.5")).is_err());
    }

    #[test]
    fn oversized_quantities_are_rejected() {
        assert_eq!(parse_quantity(Some("18446744073709551615")), Ok(u64::MAX));
        assert!(parse_quantity(Some("99999999999999999999")).is_err());
        assert!(parse_quantity(Some("1e30")).is_err());
        assert!(parse_quantity(Some("-99999999999999999999")).is_ok());
    }

    #[test]
    fn negative_decimal_quantity_is_clamped() {
        assert_eq!(parse_quantity(Some("-3.0")), Ok(0));
        assert_eq!(parse_quantity(Some("-0.0")), Ok(0));
    }

    #[test]
    fn masks_credentials_in_both_envelope_shapes() {
        let promo = "<shar:id>shop</shar:id><shar:password>s3cret</shar:password><shar:productId>K420</shar:productId>";
        assert_eq!(
            mask_credentials(promo),
            "<shar:id>***</shar:id><shar:password>***</shar:password><shar:productId>K420</shar:productId>"
        );

        let standard = "<arg0>12345</arg0><arg1>shop</arg1><arg2>s3cret</arg2><arg3>K420</arg3>";
        assert_eq!(
            mask_credentials(standard),
            "<arg0>***</arg0><arg1>***</arg1><arg2>***</arg2><arg3>K420</arg3>"
        );
    }

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(escape("a<b & c>\"d\""), "a&lt;b &amp; c&gt;&quot;d&quot;");
    }
}
