//! Aggregate reports and file exports under `/reportes/`.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use tracing::info;

use crate::error::ApiError;
use crate::pipeline::{ApiClient, ApiRequest};

pub const REPORTS_PATH: &str = "/reportes/";
pub const DEFAULT_REPORT_KIND: &str = "global";

/// Grouping a summary report aggregates events by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Summary {
    ByUser,
    ByCategory,
    ByLocation,
    ByStatus,
}

impl Summary {
    #[must_use]
    pub fn path(self) -> String {
        let slug = match self {
            Self::ByUser => "eventos-por-usuarios",
            Self::ByCategory => "eventos-por-categoria",
            Self::ByLocation => "eventos-por-lugar",
            Self::ByStatus => "eventos-por-estado",
        };
        format!("{REPORTS_PATH}{slug}/")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
    Pdf,
}

impl ExportFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Pdf => "pdf",
        }
    }

    #[must_use]
    pub fn path(self) -> String {
        format!("{REPORTS_PATH}export/{}/", self.extension())
    }

    /// File name the export is saved under, e.g. `reporte_global.pdf`.
    #[must_use]
    pub fn file_name(self, kind: &str) -> String {
        format!("reporte_{kind}.{}", self.extension())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" => Ok(Self::Xlsx),
            "pdf" => Ok(Self::Pdf),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

/// Downloaded report body plus the name it should be saved as.
#[derive(Debug, Clone)]
pub struct ExportedReport {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Events grouped by month, optionally bounded by `inicio`/`fin` dates.
///
/// # Errors
///
/// Returns transport or status errors.
pub async fn events_by_month(
    client: &ApiClient,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<Value, ApiError> {
    let mut request = ApiRequest::get(format!("{REPORTS_PATH}eventos-por-mes/"));
    if let Some(start) = start {
        request = request.query("inicio", start);
    }
    if let Some(end) = end {
        request = request.query("fin", end);
    }
    client.send_json(request).await
}

/// # Errors
///
/// Returns transport or status errors.
pub async fn summary(client: &ApiClient, report: Summary) -> Result<Value, ApiError> {
    client.send_json(ApiRequest::get(report.path())).await
}

/// Download a report file. `kind` selects the dataset (`mes`, `usuarios`,
/// `categorias`, `lugares`, `global`); `None` means `global`.
///
/// # Errors
///
/// Returns transport or status errors.
pub async fn export(
    client: &ApiClient,
    format: ExportFormat,
    kind: Option<&str>,
) -> Result<ExportedReport, ApiError> {
    let kind = kind.unwrap_or(DEFAULT_REPORT_KIND);
    let response = client
        .send(ApiRequest::get(format.path()).query("tipo", kind))
        .await?;
    let bytes = response.into_bytes();
    info!(format = %format, kind, size = bytes.len(), "report exported");
    Ok(ExportedReport {
        file_name: format.file_name(kind),
        bytes,
    })
}

#[cfg(test)]
#[path = "reports_test.rs"]
mod tests;
