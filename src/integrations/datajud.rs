//! DataJud, the public court-process search API of the CNJ.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use serde_json::json;

use crate::domain::case::{CourtSync, NewCaseMovement, latest_movement_summary};
use crate::domain::process_number;
use crate::integrations::{IntegrationError, check_status, http_client};
use crate::models::config::ServerConfig;

/// Tribunals tried, in order, when the court of a process is unknown.
pub const DEFAULT_TRIBUNALS: [&str; 8] = [
    "tjrj", "tjsp", "tjmg", "trf1", "trf2", "trf3", "trf4", "trf5",
];

const STATE_COURTS: [&str; 27] = [
    "tjac", "tjal", "tjam", "tjap", "tjba", "tjce", "tjdft", "tjes", "tjgo", "tjma", "tjmg",
    "tjms", "tjmt", "tjpa", "tjpb", "tjpe", "tjpi", "tjpr", "tjrj", "tjrn", "tjro", "tjrr",
    "tjrs", "tjsc", "tjse", "tjsp", "tjto",
];

const UFS: [&str; 27] = [
    "ac", "al", "am", "ap", "ba", "ce", "df", "es", "go", "ma", "mg", "ms", "mt", "pa", "pb",
    "pe", "pi", "pr", "rj", "rn", "ro", "rr", "rs", "sc", "se", "sp", "to",
];

const SUPERIOR_AND_MILITARY: [&str; 8] =
    ["stf", "stj", "tst", "stm", "tse", "tjmsp", "tjmmg", "tjmrs"];

/// Whether `tribunal` names a DataJud index. Anything else is refused before
/// it can end up in a request URL.
pub fn is_valid_tribunal(tribunal: &str) -> bool {
    let tribunal = tribunal.trim().to_lowercase();
    if STATE_COURTS.contains(&tribunal.as_str())
        || SUPERIOR_AND_MILITARY.contains(&tribunal.as_str())
    {
        return true;
    }
    if let Some(uf) = tribunal.strip_prefix("tre-") {
        return UFS.contains(&uf);
    }
    let numbered = |prefix: &str, max: u32| {
        tribunal
            .strip_prefix(prefix)
            .and_then(|n| n.parse::<u32>().ok())
            .is_some_and(|n| (1..=max).contains(&n) && !tribunal.contains("+"))
    };
    numbered("trf", 6) || numbered("trt", 24)
}

/// A process found in DataJud.
#[derive(Clone, Debug, PartialEq)]
pub struct CourtProcess {
    pub tribunal: String,
    pub process_number: String,
    pub class_name: Option<String>,
    pub subjects: Vec<String>,
    pub court_unit: Option<String>,
    /// Newest first, deduplicated across instances.
    pub movements: Vec<NewCaseMovement>,
}

impl CourtProcess {
    /// Court data to store on the case.
    pub fn into_sync(self, synced_at: NaiveDateTime) -> CourtSync {
        CourtSync {
            court: Some(self.tribunal),
            ultimo_andamento: latest_movement_summary(&self.movements),
            movements: self.movements,
            synced_at,
        }
    }
}

/// Court lookup used by the case services.
#[cfg_attr(feature = "test-mocks", mockall::automock)]
pub trait CourtLookup {
    fn lookup(
        &self,
        tribunal: &str,
        process_number: &str,
    ) -> Result<Option<CourtProcess>, IntegrationError>;

    /// Tries the default tribunals in order and returns the first hit.
    /// Errors are logged and the next tribunal is tried.
    fn search_all(&self, process_number: &str) -> Option<CourtProcess> {
        for tribunal in DEFAULT_TRIBUNALS {
            match self.lookup(tribunal, process_number) {
                Ok(Some(found)) => return Some(found),
                Ok(None) => {}
                Err(err) => log::warn!("DataJud lookup in {tribunal} failed: {err}"),
            }
        }
        None
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    hits: Hits,
}

#[derive(Debug, Deserialize)]
struct Hits {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source")]
    source: Source,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Source {
    numero_processo: String,
    #[serde(default)]
    tribunal: Option<String>,
    #[serde(default)]
    classe: Option<Named>,
    #[serde(default)]
    assuntos: Vec<Named>,
    #[serde(default)]
    orgao_julgador: Option<Named>,
    #[serde(default)]
    movimentos: Vec<Movement>,
}

#[derive(Debug, Deserialize)]
struct Named {
    #[serde(default)]
    nome: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Movement {
    codigo: i32,
    nome: String,
    data_hora: String,
    #[serde(default)]
    complementos_tabelados: Vec<Complement>,
}

#[derive(Debug, Deserialize)]
struct Complement {
    #[serde(default)]
    nome: String,
    #[serde(default)]
    descricao: String,
}

fn parse_movement_date(value: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.naive_utc())
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok())
        .or_else(|| NaiveDateTime::parse_from_str(value, "%Y%m%d%H%M%S").ok())
}

/// Merges the movements of every hit (one per instance), dropping duplicates
/// keyed by code, timestamp and name, and sorts them newest first.
pub(crate) fn parse_search_response(
    tribunal: &str,
    response: SearchResponse,
) -> Option<CourtProcess> {
    let mut hits = response.hits.hits.into_iter();
    let first = hits.next()?.source;

    let mut seen = HashSet::new();
    let mut movements = Vec::new();
    let all = first
        .movimentos
        .into_iter()
        .chain(hits.flat_map(|hit| hit.source.movimentos));
    for movement in all {
        let key = format!("{}_{}_{}", movement.codigo, movement.data_hora, movement.nome);
        if !seen.insert(key) {
            continue;
        }
        let Some(movement_date) = parse_movement_date(&movement.data_hora) else {
            log::warn!("Skipping movement with unreadable date {}", movement.data_hora);
            continue;
        };
        let description = movement
            .complementos_tabelados
            .iter()
            .map(|c| format!("{}: {}", c.nome, c.descricao))
            .collect::<Vec<_>>()
            .join("; ");
        movements.push(NewCaseMovement {
            code: movement.codigo,
            name: movement.nome,
            movement_date,
            description: (!description.is_empty()).then_some(description),
        });
    }
    movements.sort_by(|a, b| b.movement_date.cmp(&a.movement_date));

    Some(CourtProcess {
        tribunal: first
            .tribunal
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| tribunal.to_uppercase()),
        process_number: first.numero_processo,
        class_name: first.classe.map(|c| c.nome),
        subjects: first.assuntos.into_iter().map(|a| a.nome).collect(),
        court_unit: first.orgao_julgador.map(|o| o.nome),
        movements,
    })
}

/// HTTP client for the DataJud public API.
pub struct DataJudClient {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl DataJudClient {
    pub fn new(config: &ServerConfig) -> Result<Self, IntegrationError> {
        Ok(Self {
            http: http_client()?,
            base_url: config.datajud_url.trim_end_matches('/').to_string(),
            api_key: config.datajud_api_key.clone(),
        })
    }
}

impl CourtLookup for DataJudClient {
    fn lookup(
        &self,
        tribunal: &str,
        process_number: &str,
    ) -> Result<Option<CourtProcess>, IntegrationError> {
        if self.api_key.is_empty() {
            return Err(IntegrationError::NotConfigured("datajud_api_key"));
        }
        let tribunal = tribunal.trim().to_lowercase();
        if !is_valid_tribunal(&tribunal) {
            log::warn!("Rejected DataJud lookup for unknown tribunal {tribunal}");
            return Err(IntegrationError::InvalidRequest(format!(
                "Tribunal inválido: {tribunal}"
            )));
        }

        let url = format!("{}/api_publica_{tribunal}/_search", self.base_url);
        let body = json!({
            "query": { "match": { "numeroProcesso": process_number::normalize(process_number) } }
        });
        let response = self
            .http
            .post(url)
            .header("Authorization", format!("APIKey {}", self.api_key))
            .json(&body)
            .send()?;
        let response: SearchResponse = check_status(response)?.json()?;

        Ok(parse_search_response(&tribunal, response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(value: serde_json::Value) -> SearchResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn whitelist_accepts_known_courts_only() {
        for tribunal in ["tjrj", "TJSP", "trf6", "trt24", "tre-sp", "stj", "tjmmg"] {
            assert!(is_valid_tribunal(tribunal), "{tribunal}");
        }
        for tribunal in ["trf7", "trt0", "tre-xx", "evil.com/", "tj", "trt+1"] {
            assert!(!is_valid_tribunal(tribunal), "{tribunal}");
        }
    }

    #[test]
    fn empty_result_is_none() {
        let parsed = parse_search_response("tjrj", response(json!({"hits": {"hits": []}})));
        assert!(parsed.is_none());
    }

    #[test]
    fn movements_are_merged_deduplicated_and_sorted() {
        let value = json!({"hits": {"hits": [
            {"_source": {
                "numeroProcesso": "00012345620248190001",
                "tribunal": "TJRJ",
                "classe": {"nome": "Procedimento Comum"},
                "movimentos": [
                    {"codigo": 1, "nome": "Distribuição", "dataHora": "2024-01-10T10:00:00.000Z"},
                    {"codigo": 2, "nome": "Conclusão", "dataHora": "2024-02-01T09:00:00.000Z"}
                ]
            }},
            {"_source": {
                "numeroProcesso": "00012345620248190001",
                "movimentos": [
                    {"codigo": 2, "nome": "Conclusão", "dataHora": "2024-02-01T09:00:00.000Z"},
                    {"codigo": 3, "nome": "Juntada", "dataHora": "2024-03-05T15:30:00.000Z",
                     "complementosTabelados": [{"nome": "tipo", "descricao": "Petição"}]}
                ]
            }}
        ]}});

        let process = parse_search_response("tjrj", response(value)).unwrap();
        assert_eq!(process.tribunal, "TJRJ");
        assert_eq!(process.class_name.as_deref(), Some("Procedimento Comum"));
        let names: Vec<_> = process.movements.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Juntada", "Conclusão", "Distribuição"]);
        assert_eq!(process.movements[0].description.as_deref(), Some("tipo: Petição"));

        let sync = process.into_sync(NaiveDateTime::default());
        assert_eq!(sync.ultimo_andamento.as_deref(), Some("Juntada - 05/03/2024"));
    }
}
