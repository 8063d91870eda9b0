//! Dashboard statistics and report export under `/dashboard`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::api::ApiClient;
use crate::error::AppResult;

const BASE: &str = "/dashboard";

/// Report filters. Unset values, and ids of 0, are left out of the query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardFilters {
    pub fecha_inicio: Option<NaiveDate>,
    pub fecha_fin: Option<NaiveDate>,
    pub id_estado: Option<u32>,
    pub id_unidad: Option<u32>,
    pub id_fiscalia: Option<u32>,
    pub id_tecnico: Option<u32>,
}

impl DashboardFilters {
    /// `fechaInicio=..&fechaFin=..&idEstado=..&idUnidad=..&idFiscalia=..&idTecnico=..`
    pub fn query_string(&self) -> String {
        let mut pairs: Vec<(&str, String)> = Vec::new();
        if let Some(d) = self.fecha_inicio { pairs.push(("fechaInicio", d.format("%Y-%m-%d").to_string())); }
        if let Some(d) = self.fecha_fin { pairs.push(("fechaFin", d.format("%Y-%m-%d").to_string())); }
        let ids = [
            ("idEstado", self.id_estado),
            ("idUnidad", self.id_unidad),
            ("idFiscalia", self.id_fiscalia),
            ("idTecnico", self.id_tecnico),
        ];
        for (key, value) in ids {
            if let Some(v) = value.filter(|v| *v != 0) { pairs.push((key, v.to_string())); }
        }
        pairs.iter().map(|(k, v)| format!("{}={}", k, urlencoding::encode(v))).collect::<Vec<_>>().join("&")
    }

    /// The subset the technician metrics endpoint understands.
    pub fn for_technician_metrics(&self) -> Self {
        Self { fecha_inicio: self.fecha_inicio, fecha_fin: self.fecha_fin, id_unidad: self.id_unidad, ..Default::default() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }
}

/// `reporte-dashboard-YYYY-MM-DD.{json|csv}`
pub fn export_file_name(format: ExportFormat, date: NaiveDate) -> String {
    format!("reporte-dashboard-{}.{}", date.format("%Y-%m-%d"), format.as_str())
}

fn with_query(path: &str, query: &str) -> String {
    if query.is_empty() { path.to_string() } else { format!("{}?{}", path, query) }
}

/// `reporte-general` payload. The embedded statistics are kept as the backend
/// sends them; anything else lands in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralReport {
    #[serde(default)]
    pub estadisticas_registros: Option<Value>,
    #[serde(default)]
    pub estadisticas_aprobaciones: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of a full dashboard refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardData {
    pub report: GeneralReport,
    pub technician_metrics: Vec<Value>,
}

#[derive(Debug, Clone)]
pub struct DashboardService {
    api: ApiClient,
}

impl DashboardService {
    pub fn new(api: ApiClient) -> Self { Self { api } }

    pub async fn registration_stats(&self, filters: &DashboardFilters, cancel: Option<&CancellationToken>) -> AppResult<Value> {
        let path = with_query(&format!("{}/estadisticas-registros", BASE), &filters.query_string());
        self.api.get_data(&path, cancel).await
    }

    pub async fn approval_stats(&self, filters: &DashboardFilters, cancel: Option<&CancellationToken>) -> AppResult<Value> {
        let path = with_query(&format!("{}/estadisticas-aprobaciones", BASE), &filters.query_string());
        self.api.get_data(&path, cancel).await
    }

    pub async fn general_report(&self, filters: &DashboardFilters, cancel: Option<&CancellationToken>) -> AppResult<GeneralReport> {
        let path = with_query(&format!("{}/reporte-general", BASE), &filters.query_string());
        self.api.get_data(&path, cancel).await
    }

    pub async fn technician_metrics(&self, filters: &DashboardFilters, cancel: Option<&CancellationToken>) -> AppResult<Vec<Value>> {
        let path = with_query(&format!("{}/metricas-tecnicos", BASE), &filters.for_technician_metrics().query_string());
        self.api.get_data(&path, cancel).await
    }

    /// Raw export body in `format`.
    pub async fn export(&self, format: ExportFormat, filters: &DashboardFilters, cancel: Option<&CancellationToken>) -> AppResult<Vec<u8>> {
        let mut path = format!("{}/exportar?formato={}", BASE, format.as_str());
        let q = filters.query_string();
        if !q.is_empty() {
            path.push('&');
            path.push_str(&q);
        }
        self.api.get_bytes(&path, cancel).await
    }

    /// General report and technician metrics, fetched together. Either
    /// failure fails the refresh.
    pub async fn refresh(&self, filters: &DashboardFilters, cancel: Option<&CancellationToken>) -> AppResult<DashboardData> {
        let (report, technician_metrics) =
            tokio::try_join!(self.general_report(filters, cancel), self.technician_metrics(filters, cancel))?;
        Ok(DashboardData { report, technician_metrics })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate { NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap() }

    #[test]
    fn query_order_and_omission() {
        let f = DashboardFilters {
            fecha_inicio: Some(d("2024-01-01")),
            fecha_fin: None,
            id_estado: Some(3),
            id_unidad: Some(0),
            id_fiscalia: None,
            id_tecnico: Some(7),
        };
        assert_eq!(f.query_string(), "fechaInicio=2024-01-01&idEstado=3&idTecnico=7");
        assert_eq!(DashboardFilters::default().query_string(), "");
    }

    #[test]
    fn technician_metrics_subset() {
        let f = DashboardFilters { fecha_fin: Some(d("2024-02-29")), id_estado: Some(1), id_unidad: Some(4), ..Default::default() };
        assert_eq!(f.for_technician_metrics().query_string(), "fechaFin=2024-02-29&idUnidad=4");
    }

    #[test]
    fn export_names() {
        assert_eq!(export_file_name(ExportFormat::Csv, d("2024-03-05")), "reporte-dashboard-2024-03-05.csv");
        assert_eq!(export_file_name(ExportFormat::Json, d("2024-03-05")), "reporte-dashboard-2024-03-05.json");
        assert_eq!(ExportFormat::parse("CSV"), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::parse("xml"), None);
    }

    #[test]
    fn general_report_keeps_unknown_fields() {
        let r: GeneralReport = serde_json::from_value(serde_json::json!({
            "estadisticasRegistros": {"total": 10},
            "periodo": "2024"
        }))
        .unwrap();
        assert_eq!(r.estadisticas_registros, Some(serde_json::json!({"total": 10})));
        assert_eq!(r.extra.get("periodo"), Some(&serde_json::json!("2024")));
    }
}
