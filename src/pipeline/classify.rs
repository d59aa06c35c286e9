//! Card classification — pipeline category and boolean signal flags.

use serde::{Deserialize, Serialize};

use crate::crm::types::Card;

/// Custom-field name for the explicit warm-contact flag.
pub const FIELD_WARM: &str = "ПРОГРІТИЙ (готовий працювати)";

/// Custom-field name for the full-qualification flag.
pub const FIELD_QUALIFIED: &str = "Кваліфікований повністю";

/// Custom-field name for the "closed: meeting in Kyiv" outcome.
pub const FIELD_CLOSED_MEETING_KYIV: &str = "Закр. Зустріч КИЇВ";

/// Custom-field name for the "closed: recorded training" outcome.
pub const FIELD_CLOSED_TRAINING_RECORDED: &str = "Закр. Навчання В ЗАПИСІ";

/// Custom-field name for the "closed: online meeting" outcome.
pub const FIELD_CLOSED_MEETING_ONLINE: &str = "Закр. Зустріч ONLINE";

/// Statuses that count as a warm contact on their own.
const HOT_STATUS_IDS: [i64; 3] = [344, 437, 398];

/// Statuses that count as not-qualified on their own.
const NOT_QUALIFIED_STATUS_IDS: [i64; 4] = [341, 386, 396, 435];

// ── Category ────────────────────────────────────────────────────────

/// Coarse category derived from a card's pipeline id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    NonDiamond,
    SuperDiamond,
    Diamond,
}

impl Category {
    /// Map a pipeline id to its category.
    ///
    /// The three id sets are disjoint by construction; any id outside them
    /// yields `None` and the card is excluded from aggregation.
    pub fn of(pipeline_id: i64) -> Option<Self> {
        match pipeline_id {
            1 | 4 | 7 | 10 | 13 => Some(Self::SuperDiamond),
            2 | 5 | 8 | 11 | 14 => Some(Self::Diamond),
            0 | 3 | 6 | 9 | 12 | 15 | 16 => Some(Self::NonDiamond),
            _ => None,
        }
    }

    /// Display label (the CRM operates in Ukrainian).
    pub fn label(&self) -> &'static str {
        match self {
            Self::NonDiamond => "Не Алмази",
            Self::SuperDiamond => "Алмази",
            Self::Diamond => "Діаманти",
        }
    }

    /// All categories in presentation order.
    pub const ALL: [Category; 3] = [Self::NonDiamond, Self::SuperDiamond, Self::Diamond];
}

// ── Flags ───────────────────────────────────────────────────────────

/// Boolean signals derived from a card's custom fields and status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CardFlags {
    pub warm: bool,
    pub qualified: bool,
    pub closed_meeting_kyiv: bool,
    pub closed_training_recorded: bool,
    pub closed_meeting_online: bool,
}

impl CardFlags {
    /// Derive flags from a card in a single scan of its custom fields.
    ///
    /// Fields are matched by exact name; an absent name leaves its flag
    /// false; a name appearing more than once is last-write-wins in the
    /// order the fields were supplied.
    pub fn derive(card: &Card) -> Self {
        let mut warm_field = false;
        let mut qualified_field = false;
        let mut flags = Self::default();

        for field in &card.custom_fields {
            let value = truthy(&field.value);
            match field.name.as_str() {
                FIELD_WARM => warm_field = value,
                FIELD_QUALIFIED => qualified_field = value,
                FIELD_CLOSED_MEETING_KYIV => flags.closed_meeting_kyiv = value,
                FIELD_CLOSED_TRAINING_RECORDED => flags.closed_training_recorded = value,
                FIELD_CLOSED_MEETING_ONLINE => flags.closed_meeting_online = value,
                _ => {}
            }
        }

        // Either signal alone is sufficient for warm.
        flags.warm = warm_field || card.status_id.is_some_and(|s| HOT_STATUS_IDS.contains(&s));
        flags.qualified = qualified_field;
        flags
    }

    /// Whether the card counts toward "not qualified".
    ///
    /// Holds when the explicit qualification flag is false or the card sits
    /// in one of the disqualifying statuses.
    pub fn not_qualified(&self, status_id: Option<i64>) -> bool {
        !self.qualified || status_id.is_some_and(|s| NOT_QUALIFIED_STATUS_IDS.contains(&s))
    }
}

/// Boolean interpretation of a loosely-typed custom-field value.
///
/// Follows the upstream convention: `null`, `false`, `0`, `""`, and empty
/// containers are false; everything else is true.
pub fn truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(a) => !a.is_empty(),
        serde_json::Value::Object(o) => !o.is_empty(),
    }
}
