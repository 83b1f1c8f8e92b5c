use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::priority::PriorityTable;

/// Represents a tracked title/series
/// This is the root entity: mirrors, chapters, and the priority table
/// all hang off a Work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Work {
    /// Internal immutable identifier
    pub id: Uuid,

    /// Primary title
    pub titulo_principal: String,

    /// Alternative titles (romaji, english, synonyms)
    pub titulos_alternativos: Vec<String>,

    /// How the unified chapter sequence is presented
    pub politica: DisplayPolicy,

    /// Mirror and scanlator priority ranks, derived by reconciliation
    pub prioridades: PriorityTable,

    /// Set by any mutation that alters mirror membership or introduces
    /// new attribution labels; cleared after reconciliation runs
    pub precisa_reconciliacao: bool,

    /// Free-form metadata (genres, author, etc.)
    /// Stored as JSON internally
    pub metadados_livres: serde_json::Value,

    /// Creation timestamp
    pub criado_em: DateTime<Utc>,

    /// Last update timestamp
    pub atualizado_em: DateTime<Utc>,
}

impl Work {
    /// Create a new Work entity
    /// This is the only way to construct a valid Work
    pub fn new(titulo_principal: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            titulo_principal,
            titulos_alternativos: Vec::new(),
            politica: DisplayPolicy::default(),
            prioridades: PriorityTable::default(),
            precisa_reconciliacao: false,
            metadados_livres: serde_json::Value::Object(serde_json::Map::new()),
            criado_em: now,
            atualizado_em: now,
        }
    }

    /// Update metadata
    /// This preserves the creation timestamp and updates the modification timestamp
    pub fn update_metadata(
        &mut self,
        titulo_principal: Option<String>,
        titulos_alternativos: Option<Vec<String>>,
        metadados_livres: Option<serde_json::Value>,
    ) {
        if let Some(titulo) = titulo_principal {
            self.titulo_principal = titulo;
        }
        if let Some(titulos) = titulos_alternativos {
            self.titulos_alternativos = titulos;
        }
        if let Some(meta) = metadados_livres {
            self.metadados_livres = meta;
        }

        self.atualizado_em = Utc::now();
    }

    /// Replace the display policy
    pub fn set_policy(&mut self, politica: DisplayPolicy) {
        self.politica = politica;
        self.atualizado_em = Utc::now();
    }

    /// Mark this work as needing a reconciliation pass
    pub fn flag_reconciliation(&mut self) {
        self.precisa_reconciliacao = true;
        self.atualizado_em = Utc::now();
    }

    /// Clear the reconciliation flag (called after the pass ran)
    pub fn clear_reconciliation_flag(&mut self) {
        self.precisa_reconciliacao = false;
        self.atualizado_em = Utc::now();
    }
}

/// How the unified chapter sequence is filtered and ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayPolicy {
    /// Show every record side by side instead of deduplicating
    pub mostrar_duplicatas: bool,

    /// Include half chapters (10.5) and other non-whole numbers
    pub incluir_meios_capitulos: bool,

    /// Primary sort key
    pub chave_ordenacao: SortKey,

    /// Sort direction
    pub direcao_ordenacao: SortDirection,
}

impl Default for DisplayPolicy {
    fn default() -> Self {
        Self {
            mostrar_duplicatas: false,
            incluir_meios_capitulos: true,
            chave_ordenacao: SortKey::Numero,
            direcao_ordenacao: SortDirection::Descendente,
        }
    }
}

/// Sort key for the unified sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Numero,
    Data,
}

/// Sort direction for the unified sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascendente,
    Descendente,
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortKey::Numero => write!(f, "numero"),
            SortKey::Data => write!(f, "data"),
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortDirection::Ascendente => write!(f, "ascendente"),
            SortDirection::Descendente => write!(f, "descendente"),
        }
    }
}
