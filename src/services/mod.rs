//! Feature services on top of `ApiClient`.

pub mod dashboard;
pub mod expedientes;

pub use dashboard::{export_file_name, DashboardData, DashboardFilters, DashboardService, ExportFormat, GeneralReport};
pub use expedientes::{CaseDetail, CasePage, CaseQuery, CaseRecord, CaseService, Evidence};
