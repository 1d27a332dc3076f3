//! SanMar Standard web service client (`getInventoryQtyForStyleColorSize`)
//!
//! Unlike the PromoStandards client, a failing style does not abort the run:
//! it is logged, recorded in the report and the remaining styles are queried.

use super::soap::{self, SoapTransport, XmlNode, SOAP_ENV_NS};
use super::{InventoryClient, InventoryReport, StyleFailure, VariantFilter};
use crate::error::InventoryQueryError;
use crate::models::{Backend, Credentials, InventoryRow, StyleCode, StyleSet};
use reqwest::StatusCode;
use std::time::Duration;

pub const SERVICE_PATH: &str = "/SanMarWebService/SanMarWebServicePort";
const SOAP_ACTION: &str = "";
const IMPL_NS: &str = "http://impl.webservice.integration.sanmar.com/";

const WAREHOUSE_ID_FIELDS: [&str; 3] = ["whseNo", "whseID", "warehouseId"];
const WAREHOUSE_NAME_FIELDS: [&str; 2] = ["whseName", "warehouseName"];
const QUANTITY_FIELDS: [&str; 2] = ["qty", "quantity"];
const COLOR_FIELDS: [&str; 2] = ["color", "catalogColor"];

pub struct SanMarStandardClient {
    transport: SoapTransport,
    credentials: Credentials,
    filter: VariantFilter,
}

impl SanMarStandardClient {
    pub fn new(
        credentials: Credentials,
        host: &str,
        timeout: Duration,
    ) -> Result<Self, InventoryQueryError> {
        let endpoint = format!("{}{}", host.trim_end_matches('/'), SERVICE_PATH);
        Ok(Self {
            transport: SoapTransport::new(Backend::Standard, endpoint, timeout)?,
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

    /// arg0..arg5: customer number, username, password, style, color, size
    pub fn build_request(&self, style: &StyleCode) -> String {
        let optional = |value: &Option<String>| value.as_deref().map(soap::escape).unwrap_or_default();

        format!(
            concat!(
                r#"<soapenv:Envelope xmlns:soapenv="{env}" xmlns:impl="{ns}">"#,
                "<soapenv:Header/>",
                "<soapenv:Body>",
                "<impl:getInventoryQtyForStyleColorSize>",
                "<arg0>{customer}</arg0>",
                "<arg1>{username}</arg1>",
                "<arg2>{password}</arg2>",
                "<arg3>{style}</arg3>",
                "<arg4>{color}</arg4>",
                "<arg5>{size}</arg5>",
                "</impl:getInventoryQtyForStyleColorSize>",
                "</soapenv:Body>",
                "</soapenv:Envelope>"
            ),
            env = SOAP_ENV_NS,
            ns = IMPL_NS,
            customer = optional(&self.credentials.customer_number),
            username = soap::escape(&self.credentials.username),
            password = soap::escape(&self.credentials.password),
            style = soap::escape(style.as_str()),
            color = optional(&self.filter.color),
            size = optional(&self.filter.size),
        )
    }

    /// Normalize a raw response body for one style into rows
    pub fn parse_response(style: &StyleCode, xml: &str) -> Result<Vec<InventoryRow>, InventoryQueryError> {
        let doc = soap::check_response(Backend::Standard, style, StatusCode::OK, xml)?;
        rows_from_document(style, &doc)
    }

    fn query_style(&self, style: &StyleCode) -> Result<Vec<InventoryRow>, InventoryQueryError> {
        let doc = self
            .transport
            .call(style, SOAP_ACTION, self.build_request(style))?;
        rows_from_document(style, &doc)
    }
}

impl InventoryClient for SanMarStandardClient {
    fn backend(&self) -> Backend {
        Backend::Standard
    }

    fn get_inventory(&self, styles: &StyleSet) -> Result<InventoryReport, InventoryQueryError> {
        let mut report = InventoryReport::default();

        for style in styles {
            match self.query_style(style) {
                Ok(rows) => {
                    log::info!("{}: {} inventory row(s)", style, rows.len());
                    report.rows.extend(rows);
                }
                Err(error) => {
                    log::warn!("Skipping style {}: {}", style, error);
                    report.failures.push(StyleFailure {
                        style: style.clone(),
                        error,
                    });
                }
            }
        }

        if !styles.is_empty() && report.failures.len() == styles.len() {
            return Err(InventoryQueryError::AllStylesFailed {
                backend: Backend::Standard,
                styles: report.failed_styles(),
            });
        }

        if !report.failures.is_empty() {
            log::warn!(
                "Skipped {} of {} style(s): {}",
                report.failures.len(),
                styles.len(),
                report.failed_styles().join(", ")
            );
        }

        Ok(report)
    }
}

fn rows_from_document(style: &StyleCode, doc: &XmlNode) -> Result<Vec<InventoryRow>, InventoryQueryError> {
    let result = doc.find("return").ok_or_else(|| InventoryQueryError::Malformed {
        backend: Backend::Standard,
        style: style.to_string(),
        reason: "missing return element".to_string(),
    })?;

    // The service spells it both ways depending on the release
    let error_flag = result
        .child_text("errorOccured")
        .or_else(|| result.child_text("errorOccurred"))
        .unwrap_or("false");
    if error_flag.eq_ignore_ascii_case("true") {
        return Err(InventoryQueryError::Fault {
            backend: Backend::Standard,
            style: style.to_string(),
            message: result
                .child_text("message")
                .unwrap_or("request failed")
                .to_string(),
        });
    }

    let mut rows = Vec::new();
    for entry in result.children("listResponse") {
        let quantity = soap::parse_quantity(first_text(entry, &QUANTITY_FIELDS)).map_err(|reason| {
            InventoryQueryError::Malformed {
                backend: Backend::Standard,
                style: style.to_string(),
                reason,
            }
        })?;

        rows.push(InventoryRow {
            style: style.to_string(),
            part_id: None,
            color: first_text(entry, &COLOR_FIELDS).unwrap_or_default().to_string(),
            size: entry.child_text("size").unwrap_or_default().to_string(),
            description: None,
            warehouse_id: first_text(entry, &WAREHOUSE_ID_FIELDS)
                .unwrap_or_default()
                .to_string(),
            warehouse_name: first_text(entry, &WAREHOUSE_NAME_FIELDS)
                .unwrap_or_default()
                .to_string(),
            quantity,
            total_available: None,
        });
    }

    Ok(rows)
}

fn first_text<'a>(node: &'a XmlNode, names: &[&str]) -> Option<&'a str> {
    names.iter().find_map(|name| node.child_text(name))
}

#[cfg(test)]
#[path = "sanmar_standard_tests.rs"]
mod tests;
