//! Inventory clients for SanMar's SOAP web services
//!
//! Two backends implement [`InventoryClient`]: PromoStandards Inventory 2.0.0
//! and the SanMar Standard service. The backend is picked once per run by
//! [`client_for`].

pub mod promostandards;
pub mod sanmar_standard;
pub mod soap;

use crate::config::Settings;
use crate::error::InventoryQueryError;
use crate::models::{Backend, Environment, InventoryRow, StyleCode, StyleSet};

pub use promostandards::PromoStandardsClient;
pub use sanmar_standard::SanMarStandardClient;

/// Production web service host
pub const PRODUCTION_HOST: &str = "https://ws.sanmar.com:8080";
/// Test web service host; same paths as production
pub const TEST_HOST: &str = "https://test-ws.sanmar.com:8080";

/// Uniform inventory lookup over the supported backends
pub trait InventoryClient {
    /// Backend this client speaks
    fn backend(&self) -> Backend;

    /// Query inventory for every style in the set
    fn get_inventory(&self, styles: &StyleSet) -> Result<InventoryReport, InventoryQueryError>;
}

/// Rows gathered by a query plus the styles that were skipped
#[derive(Debug, Default)]
pub struct InventoryReport {
    pub rows: Vec<InventoryRow>,
    pub failures: Vec<StyleFailure>,
}

impl InventoryReport {
    /// Styles that were skipped, in query order
    pub fn failed_styles(&self) -> Vec<String> {
        self.failures.iter().map(|f| f.style.to_string()).collect()
    }
}

/// A style whose query failed in a skip-and-warn run
#[derive(Debug)]
pub struct StyleFailure {
    pub style: StyleCode,
    pub error: InventoryQueryError,
}

/// Optional color/size narrowing applied to every style query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantFilter {
    pub color: Option<String>,
    pub size: Option<String>,
}

impl VariantFilter {
    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.size.is_none()
    }
}

/// Host (scheme + authority) the clients should talk to
pub fn service_host(settings: &Settings) -> String {
    if let Some(base) = &settings.base_url {
        return base.clone();
    }
    match settings.credentials.environment {
        Environment::Test => TEST_HOST.to_string(),
        Environment::Production => PRODUCTION_HOST.to_string(),
    }
}

/// Build the client for the chosen backend
pub fn client_for(
    settings: &Settings,
    backend: Backend,
    filter: VariantFilter,
) -> Result<Box<dyn InventoryClient>, InventoryQueryError> {
    let host = service_host(settings);
    let credentials = settings.credentials.clone();

    let client: Box<dyn InventoryClient> = match backend {
        Backend::PromoStandards => Box::new(
            PromoStandardsClient::new(credentials, &host, settings.timeout)?.with_filter(filter),
        ),
        Backend::Standard => Box::new(
            SanMarStandardClient::new(credentials, &host, settings.timeout)?.with_filter(filter),
        ),
    };

    log::info!("Using {} backend ({}) at {}", backend, backend.code(), host);
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_follows_environment_unless_overridden() {
        let mut settings = Settings::default();
        assert_eq!(service_host(&settings), PRODUCTION_HOST);

        settings.credentials.environment = Environment::Test;
        assert_eq!(service_host(&settings), TEST_HOST);

        settings.base_url = Some("http://127.0.0.1:9999".to_string());
        assert_eq!(service_host(&settings), "http://127.0.0.1:9999");
    }

    #[test]
    fn client_for_returns_requested_backend() {
        let settings = Settings::default();
        let promo = client_for(&settings, Backend::PromoStandards, VariantFilter::default()).unwrap();
        assert_eq!(promo.backend(), Backend::PromoStandards);

        let standard = client_for(&settings, Backend::Standard, VariantFilter::default()).unwrap();
        assert_eq!(standard.backend(), Backend::Standard);
    }
}
