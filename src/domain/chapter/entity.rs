use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Represents a single chapter as published by one specific Mirror
/// Distinct records on different mirrors may describe the same logical
/// chapter; unification resolves that duplication at read time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterRecord {
    /// Internal immutable identifier
    pub id: Uuid,

    /// Reference to parent Mirror (REQUIRED)
    pub mirror_id: Uuid,

    /// Chapter number (rational, half numbers like 10.5 are valid)
    pub numero: ChapterNumber,

    /// Chapter title (optional)
    pub titulo: Option<String>,

    /// Attribution label: the scanlation group responsible for this record
    pub scanlator: String,

    /// When the mirror published this chapter
    pub publicado_em: DateTime<Utc>,

    /// Local reading progress, 0.0 (unread) to 1.0 (finished)
    pub progresso_leitura: f32,

    /// Creation timestamp
    pub criado_em: DateTime<Utc>,

    /// Last update timestamp
    pub atualizado_em: DateTime<Utc>,
}

impl ChapterRecord {
    /// Create a new ChapterRecord
    /// mirror_id MUST be valid (checked by caller)
    pub fn new(
        mirror_id: Uuid,
        numero: ChapterNumber,
        scanlator: String,
        publicado_em: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            mirror_id,
            numero,
            titulo: None,
            scanlator,
            publicado_em,
            progresso_leitura: 0.0,
            criado_em: now,
            atualizado_em: now,
        }
    }

    /// Update reading progress
    /// Returns error text if progress is outside 0.0..=1.0
    pub fn set_progress(&mut self, progresso: f32) -> Result<(), String> {
        if !(0.0..=1.0).contains(&progresso) || progresso.is_nan() {
            return Err(format!("Progress {} outside 0.0..=1.0", progresso));
        }
        self.progresso_leitura = progresso;
        self.atualizado_em = Utc::now();
        Ok(())
    }

    /// A chapter counts as read once progress reaches 1.0
    pub fn is_read(&self) -> bool {
        self.progresso_leitura >= 1.0
    }
}

/// Chapter number with exact equality and ordering
///
/// Stored in thousandths of a chapter so that half numbers (10.5) and
/// the occasional 10.75 extra compare and hash exactly. A number within
/// one thousandth of a whole chapter counts as whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChapterNumber(i64);

impl ChapterNumber {
    const SCALE: i64 = 1000;

    /// Tolerance in thousandths for the whole-number check
    const EPSILON_MILLIS: i64 = 1;

    /// Build from a floating point chapter number (rounds to thousandths)
    pub fn from_f64(value: f64) -> Self {
        Self((value * Self::SCALE as f64).round() as i64)
    }

    /// Build from raw thousandths
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Raw thousandths value
    pub fn millis(&self) -> i64 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }

    /// True when the number sits at (or within epsilon of) a whole chapter
    pub fn is_whole(&self) -> bool {
        let frac = self.0.rem_euclid(Self::SCALE);
        frac <= Self::EPSILON_MILLIS || frac >= Self::SCALE - Self::EPSILON_MILLIS
    }

    /// Parse a plain decimal chapter number ("10", "10.5")
    pub fn parse(text: &str) -> Option<Self> {
        let value: f64 = text.trim().parse().ok()?;
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        Some(Self::from_f64(value))
    }
}

impl std::fmt::Display for ChapterNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let whole = self.0 / Self::SCALE;
        let frac = (self.0 % Self::SCALE).abs();
        if frac == 0 {
            write!(f, "{}", whole)
        } else {
            let digits = format!("{:03}", frac);
            write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
        }
    }
}

// Serialized as a plain JSON number so stored policies and exports stay
// readable ("numero": 10.5, not a thousandths integer)
impl Serialize for ChapterNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for ChapterNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Ok(ChapterNumber::from_f64(value))
    }
}
