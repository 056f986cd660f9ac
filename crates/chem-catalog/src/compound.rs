use serde::{Deserialize, Serialize};

/// Proyección de un compuesto tal como aparece en los listados.
///
/// Los nombres serializados siguen las columnas de ChEMBL (`pref_name`,
/// `full_mwt`, `alogp`...), que es lo que consumen los clientes existentes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundSummary {
  pub chembl_id: String,
  #[serde(rename = "pref_name")]
  pub preferred_name: Option<String>,
  pub molecule_type: Option<String>,
  pub max_phase: Option<f64>,
  #[serde(rename = "full_mwt")]
  pub molecular_weight: Option<f64>,
  #[serde(rename = "alogp")]
  pub log_p: Option<f64>,
  #[serde(rename = "hbd")]
  pub hydrogen_bond_donors: Option<i32>,
  #[serde(rename = "hba")]
  pub hydrogen_bond_acceptors: Option<i32>,
}

/// Registro completo devuelto por la búsqueda puntual: el resumen más la
/// estructura canónica.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundDetail {
  #[serde(flatten)]
  pub summary: CompoundSummary,
  pub canonical_smiles: Option<String>,
}

impl CompoundDetail {
  pub fn chembl_id(&self) -> &str {
    &self.summary.chembl_id
  }
}

/// Una fila del agregado `molecule_type -> count`. El tipo puede ser nulo en
/// ChEMBL y se conserva como grupo propio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCount {
  pub molecule_type: Option<String>,
  pub count: i64,
}

impl TypeCount {
  pub fn new(molecule_type: Option<&str>, count: i64) -> Self {
    Self { molecule_type: molecule_type.map(|s| s.to_string()),
           count }
  }
}
