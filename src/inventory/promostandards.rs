//! PromoStandards Inventory 2.0.0 client (`GetInventoryLevels`)

use super::soap::{self, SoapTransport, XmlNode, SOAP_ENV_NS};
use super::{InventoryClient, InventoryReport, VariantFilter};
use crate::error::InventoryQueryError;
use crate::models::{Backend, Credentials, InventoryRow, StyleCode, StyleSet};
use reqwest::StatusCode;
use std::time::Duration;

pub const SERVICE_PATH: &str = "/promostandards/InventoryServiceBindingV2final";
const SOAP_ACTION: &str = "getInventoryLevels";
const WS_VERSION: &str = "2.0.0";
const INVENTORY_NS: &str = "http://www.promostandards.org/WSDL/Inventory/2.0.0/";
const SHARED_NS: &str = "http://www.promostandards.org/WSDL/Inventory/2.0.0/SharedObjects/";

/// Client for the standardized multi-vendor inventory service
pub struct PromoStandardsClient {
    transport: SoapTransport,
    credentials: Credentials,
    filter: VariantFilter,
}

impl PromoStandardsClient {
    /// Creates a client for `host` (scheme + authority, no path)
    pub fn new(
        credentials: Credentials,
        host: &str,
        timeout: Duration,
    ) -> Result<Self, InventoryQueryError> {
        let endpoint = format!("{}{}", host.trim_end_matches('/'), SERVICE_PATH);
        Ok(Self {
            transport: SoapTransport::new(Backend::PromoStandards, endpoint, timeout)?,
            credentials,
            filter: VariantFilter::default(),
        })
    }

    pub fn with_filter(mut self, filter: VariantFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }

    /// Build the `GetInventoryLevelsRequest` envelope for one product
    pub fn build_request(&self, style: &StyleCode) -> String {
        let mut filter = String::new();
        if !self.filter.is_empty() {
            filter.push_str("<shar:Filter>");
            if let Some(size) = &self.filter.size {
                filter.push_str(&format!(
                    "<shar:LabelSizeArray><shar:labelSize>{}</shar:labelSize></shar:LabelSizeArray>",
                    soap::escape(size)
                ));
            }
            if let Some(color) = &self.filter.color {
                filter.push_str(&format!(
                    "<shar:PartColorArray><shar:partColor>{}</shar:partColor></shar:PartColorArray>",
                    soap::escape(color)
                ));
            }
            filter.push_str("</shar:Filter>");
        }

        format!(
            concat!(
                r#"<soapenv:Envelope xmlns:soapenv="{env}" xmlns:ns="{inv}" xmlns:shar="{shar}">"#,
                "<soapenv:Header/>",
                "<soapenv:Body>",
                "<ns:GetInventoryLevelsRequest>",
                "<shar:wsVersion>{version}</shar:wsVersion>",
                "<shar:id>{id}</shar:id>",
                "<shar:password>{password}</shar:password>",
                "<shar:productId>{product}</shar:productId>",
                "{filter}",
                "</ns:GetInventoryLevelsRequest>",
                "</soapenv:Body>",
                "</soapenv:Envelope>"
            ),
            env = SOAP_ENV_NS,
            inv = INVENTORY_NS,
            shar = SHARED_NS,
            version = WS_VERSION,
            id = soap::escape(&self.credentials.username),
            password = soap::escape(&self.credentials.password),
            product = soap::escape(style.as_str()),
            filter = filter,
        )
    }

    /// Normalize a raw `GetInventoryLevelsResponse` body into rows
    pub fn parse_response(style: &StyleCode, xml: &str) -> Result<Vec<InventoryRow>, InventoryQueryError> {
        let doc = soap::check_response(Backend::PromoStandards, style, StatusCode::OK, xml)?;
        rows_from_document(style, &doc)
    }

    fn query_style(&self, style: &StyleCode) -> Result<Vec<InventoryRow>, InventoryQueryError> {
        let doc = self
            .transport
            .call(style, SOAP_ACTION, self.build_request(style))?;
        rows_from_document(style, &doc)
    }
}

impl InventoryClient for PromoStandardsClient {
    fn backend(&self) -> Backend {
        Backend::PromoStandards
    }

    /// One request per style; the first failure aborts the whole call
    fn get_inventory(&self, styles: &StyleSet) -> Result<InventoryReport, InventoryQueryError> {
        let mut report = InventoryReport::default();
        for style in styles {
            let rows = self.query_style(style)?;
            log::info!("{}: {} inventory row(s)", style, rows.len());
            report.rows.extend(rows);
        }
        Ok(report)
    }
}

fn rows_from_document(style: &StyleCode, doc: &XmlNode) -> Result<Vec<InventoryRow>, InventoryQueryError> {
    let malformed = |reason: String| InventoryQueryError::Malformed {
        backend: Backend::PromoStandards,
        style: style.to_string(),
        reason,
    };

    let response = doc
        .find("GetInventoryLevelsResponse")
        .ok_or_else(|| malformed("missing GetInventoryLevelsResponse".to_string()))?;

    for message in response.find_all("ServiceMessage") {
        let code = message.child_text("code").unwrap_or("");
        let description = message.child_text("description").unwrap_or("");
        let severity = message.child_text("severity").unwrap_or("");
        if severity.eq_ignore_ascii_case("error") {
            return Err(InventoryQueryError::Fault {
                backend: Backend::PromoStandards,
                style: style.to_string(),
                message: format!("{code} {description}").trim().to_string(),
            });
        }
        log::info!("{} service message for {}: {} {}", severity, style, code, description);
    }

    let mut rows = Vec::new();
    for part in response.find_all("PartInventory") {
        let total_available = match part.child("quantityAvailable") {
            Some(node) => Some(quantity_value(node).map_err(&malformed)?),
            None => None,
        };

        let template = InventoryRow {
            style: style.to_string(),
            part_id: part.child_text("partId").map(str::to_string),
            color: part.child_text("partColor").unwrap_or_default().to_string(),
            size: part.child_text("labelSize").unwrap_or_default().to_string(),
            description: part.child_text("partDescription").map(str::to_string),
            warehouse_id: String::new(),
            warehouse_name: String::new(),
            quantity: 0,
            total_available,
        };

        let locations = part.find_all("InventoryLocation");
        if locations.is_empty() {
            rows.push(InventoryRow {
                quantity: total_available.unwrap_or(0),
                ..template
            });
            continue;
        }

        for location in locations {
            let quantity = match location.child("inventoryLocationQuantity") {
                Some(node) => quantity_value(node).map_err(&malformed)?,
                None => 0,
            };
            rows.push(InventoryRow {
                warehouse_id: location
                    .child_text("inventoryLocationId")
                    .unwrap_or_default()
                    .to_string(),
                warehouse_name: location
                    .child_text("inventoryLocationName")
                    .unwrap_or_default()
                    .to_string(),
                quantity,
                ..template.clone()
            });
        }
    }

    Ok(rows)
}

/// `<X><Quantity><uom/><value>n</value></Quantity></X>`; missing value is 0
fn quantity_value(node: &XmlNode) -> Result<u64, String> {
    soap::parse_quantity(node.find("value").map(|v| v.text.as_str()))
}

#[cfg(test)]
#[path = "promostandards_tests.rs"]
mod tests;
