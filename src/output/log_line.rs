//! Single-line structured summaries of scan records.

use log::info;

use crate::config::LOG_LINE_PREFIX;
use crate::models::{AddressCertificateRecord, CertificateRecord};

/// A record that can be summarized on one log line.
pub trait LogLine {
    /// Renders the fixed-order summary, prefixed with `tls-scrape`.
    fn log_line(&self) -> String;
}

impl LogLine for CertificateRecord {
    fn log_line(&self) -> String {
        let mut line = format!("{LOG_LINE_PREFIX} Domain:{} Valid:{} ", self.domain, self.valid);
        if !self.validation_errors.is_empty() {
            line.push_str(&format!(
                "ValidationErrors:[{}] ",
                self.validation_errors.join("; ")
            ));
        }
        line.push_str(&format!(
            "Serial:{} NotBefore:{} NotAfter:{} Issuer:{} CRL:{} OCSPServer:{}",
            self.serial,
            self.not_before,
            self.not_after,
            self.issuer,
            join_or_null(&self.crl),
            join_or_null(&self.ocsp_server),
        ));
        line
    }
}

impl LogLine for AddressCertificateRecord {
    fn log_line(&self) -> String {
        let mut line = self.certificate.log_line();
        line.push_str(&format!(" IP:{}", self.ip));
        if let Some(hostname) = &self.hostname {
            line.push_str(&format!(
                " Hostname:{hostname} HostnameInCert:{}",
                self.hostname_in_cert
            ));
        }
        line.push_str(&format!(" SANs:{}", self.sans.join(",")));
        line
    }
}

/// Logs one summary line per record at info level.
pub fn log_records<R: LogLine>(records: &[R]) {
    for record in records {
        info!("{}", record.log_line());
    }
}

fn join_or_null(items: &[String]) -> String {
    if items.is_empty() {
        "null".to_string()
    } else {
        items.join(", ")
    }
}
