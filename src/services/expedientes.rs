use futures_util::future::try_join;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio_util::sync::CancellationToken;

use crate::api::ApiClient;
use crate::error::AppResult;
use crate::validation::FieldErrors;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseQuery {
    pub pagina: u32,
    pub limite: u32,
    pub busqueda: Option<String>,
    pub id_estado: Option<u32>,
}

impl Default for CaseQuery {
    fn default() -> Self { Self { pagina: 1, limite: DEFAULT_PAGE_SIZE, busqueda: None, id_estado: None } }
}

impl CaseQuery {
    pub fn query_string(&self) -> String {
        let mut q = format!("pagina={}&limite={}", self.pagina.max(1), self.limite);
        if let Some(b) = self.busqueda.as_deref().map(str::trim).filter(|b| !b.is_empty()) {
            q.push_str("&busqueda=");
            q.push_str(&urlencoding::encode(b));
        }
        if let Some(id) = self.id_estado {
            q.push_str(&format!("&idEstado={}", id));
        }
        q
    }
}

/// Case file as listed and shown by the backend. Fields the console does not
/// use are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub id_expediente: u64,
    pub numero_expediente: String,
    #[serde(default)]
    pub numero_caso_mp: Option<String>,
    #[serde(default)]
    pub fecha_registro: Option<String>,
    #[serde(default)]
    pub nombre_estado: Option<String>,
    #[serde(default)]
    pub tecnico_nombre: Option<String>,
    #[serde(default)]
    pub tecnico_apellido: Option<String>,
    #[serde(default)]
    pub fiscalia_nombre: Option<String>,
    #[serde(default)]
    pub nombre_unidad: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Evidence item (indicio) attached to a case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub id_indicio: u64,
    pub numero_indicio: String,
    #[serde(default)]
    pub descripcion: String,
    #[serde(default)]
    pub tipo_objeto: Option<String>,
    #[serde(default)]
    pub estado_nombre: Option<String>,
    #[serde(default)]
    pub cantidad: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CasePage {
    #[serde(default)]
    pub expedientes: Vec<CaseRecord>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub total_paginas: u32,
}

#[derive(Debug, Deserialize)]
struct EvidenceList {
    #[serde(default)]
    indicios: Vec<Evidence>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseDetail {
    pub expediente: CaseRecord,
    pub indicios: Vec<Evidence>,
}

#[derive(Debug, Clone)]
pub struct CaseService {
    api: ApiClient,
}

impl CaseService {
    pub fn new(api: ApiClient) -> Self { Self { api } }

    pub async fn list(&self, query: &CaseQuery, cancel: Option<&CancellationToken>) -> AppResult<CasePage> {
        self.api.get_data(&format!("/expedientes?{}", query.query_string()), cancel).await
    }

    /// Case and its evidence, fetched together. Either failure fails the whole detail.
    pub async fn detail(&self, id: u64, cancel: Option<&CancellationToken>) -> AppResult<CaseDetail> {
        let case_path = format!("/expedientes/{}", id);
        let evidence_path = format!("/indicios?idExpediente={}", id);
        let (expediente, evidence) = try_join(
            self.api.get_data::<CaseRecord>(&case_path, cancel),
            self.api.get_data::<EvidenceList>(&evidence_path, cancel),
        )
        .await?;
        Ok(CaseDetail { expediente, indicios: evidence.indicios })
    }

    pub async fn approve(&self, id: u64) -> AppResult<String> {
        self.api.post_unit(&format!("/expedientes/{}/aprobar", id), &json!({}), None).await
    }

    pub async fn reject(&self, id: u64, reason: &str) -> AppResult<String> {
        let reason = reason.trim();
        if reason.is_empty() {
            let mut errs = FieldErrors::new();
            errs.add("motivoRechazo", "El motivo de rechazo es requerido");
            errs.into_result()?;
        }
        let body = json!({ "motivoRechazo": reason });
        self.api.post_unit(&format!("/expedientes/{}/rechazar", id), &body, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query() {
        assert_eq!(CaseQuery::default().query_string(), "pagina=1&limite=10");
        let q = CaseQuery { pagina: 2, limite: 25, busqueda: Some(" robo agravado ".into()), id_estado: Some(4) };
        assert_eq!(q.query_string(), "pagina=2&limite=25&busqueda=robo%20agravado&idEstado=4");
    }

    #[test]
    fn case_record_tolerates_nulls_and_extras() {
        let c: CaseRecord = serde_json::from_value(json!({
            "id_expediente": 9,
            "numero_expediente": "DICRI-2024-0009",
            "numero_caso_mp": null,
            "nombre_estado": "En revisión",
            "urgencia": "alta"
        }))
        .unwrap();
        assert_eq!(c.numero_caso_mp, None);
        assert_eq!(c.extra.get("urgencia"), Some(&json!("alta")));
    }
}
