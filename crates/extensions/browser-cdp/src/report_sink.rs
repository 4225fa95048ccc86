//! [`ReportSink`] that shows the report in a new browser tab.

use std::sync::Arc;

use async_trait::async_trait;
use casetrail_protocols::{ReportError, ReportSink};
use tracing::info;
use url::form_urlencoded;

use crate::cdp::CdpClient;

const DATA_URL_PREFIX: &str = "data:text/html;charset=UTF-8,";

/// Percent-encode an HTML document into a `data:` URL.
pub fn data_url(html: &str) -> String {
    // Form encoding writes spaces as '+' and escapes literal '+' as %2B.
    let encoded: String = form_urlencoded::byte_serialize(html.as_bytes()).collect();
    format!("{}{}", DATA_URL_PREFIX, encoded.replace('+', "%20"))
}

/// Opens reports as `data:text/html` tabs.
pub struct DataUrlReportSink {
    client: Arc<CdpClient>,
}

impl DataUrlReportSink {
    pub fn new(client: Arc<CdpClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReportSink for DataUrlReportSink {
    async fn open_report(&self, html: String) -> Result<(), ReportError> {
        let target = self
            .client
            .create_target(&data_url(&html), false)
            .await
            .map_err(|e| ReportError::OpenFailed(e.to_string()))?;
        info!("Opened report in tab {}", target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url_encodes_spaces_and_markup() {
        let url = data_url("<p>a b+c & d#</p>");
        assert_eq!(
            url,
            "data:text/html;charset=UTF-8,%3Cp%3Ea%20b%2Bc%20%26%20d%23%3C%2Fp%3E"
        );
    }

    #[test]
    fn test_data_url_encodes_utf8() {
        let url = data_url("é");
        assert!(url.ends_with("%C3%A9"));
    }
}
