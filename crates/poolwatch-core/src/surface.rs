// ── Diagnostic surface derivation ──
//
// Which discrete values exist to expose is only known after the first
// successful poll: the decoder reports fields it could not interpret
// under reserved `unknown_at_offset_*` names, and those are exactly the
// values worth watching. Enumeration is deterministic — the derived
// identifier set becomes the host's long-lived entity set, and ordering
// churn across restarts would churn entities.

use poolwatch_gateway::{DataCategory, FieldMap, GatewayData};
use serde_json::Value;

/// Reserved name prefix for fields the decoding library could not
/// interpret.
pub const UNKNOWN_FIELD_PREFIX: &str = "unknown_at_offset_";

/// Sub-structures under CHEMISTRY exposed raw regardless of data shape.
const RAW_CHEMISTRY_KEYS: [&str; 2] = ["alerts", "notifications"];

/// Known debug fields per category. Anything else is only surfaced when
/// it matches [`UNKNOWN_FIELD_PREFIX`].
fn debug_fields(category: DataCategory) -> &'static [&'static str] {
    match category {
        DataCategory::Config => &["controller_buffer", "ok"],
        DataCategory::Circuits => &[],
        DataCategory::Pumps => &["data", "state"],
        DataCategory::Chemistry => &["status", "flags"],
        DataCategory::Scg => &["scg_flags"],
    }
}

fn is_surfaced(category: DataCategory, name: &str) -> bool {
    debug_fields(category).contains(&name) || name.starts_with(UNKNOWN_FIELD_PREFIX)
}

// ── DiagnosticField ──────────────────────────────────────────────

/// How a field's value is read from a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A single leaf value, possibly under an equipment index.
    Scalar,
    /// A whole sub-structure addressed by literal key.
    Raw,
}

/// One diagnostic value, addressable across snapshots.
///
/// The identifier is `category[_index]_name`, globally unique per
/// gateway and stable for the lifetime of the surface. Lookup through
/// [`value`](Self::value) stays valid even if equipment is removed at
/// runtime — the field then reads as absent rather than disappearing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticField {
    pub category: DataCategory,
    pub index: Option<u16>,
    pub name: String,
    pub kind: FieldKind,
    id: String,
}

impl DiagnosticField {
    fn scalar(category: DataCategory, index: Option<u16>, name: &str) -> Self {
        let id = match index {
            Some(index) => format!("{category}_{index}_{name}"),
            None => format!("{category}_{name}"),
        };
        Self {
            category,
            index,
            name: name.to_owned(),
            kind: FieldKind::Scalar,
            id,
        }
    }

    fn raw(key: &str) -> Self {
        Self {
            category: DataCategory::Chemistry,
            index: None,
            name: key.to_owned(),
            kind: FieldKind::Raw,
            id: format!("{}_{key}_raw", DataCategory::Chemistry),
        }
    }

    /// Stable identifier for this field.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Resolve this field against a snapshot. `None` when the category,
    /// index, or field is absent (e.g. equipment removed).
    pub fn value<'a>(&self, data: &'a GatewayData) -> Option<&'a Value> {
        match self.index {
            Some(index) => data.indexed(self.category)?.get(&index)?.get(&self.name),
            None => data.flat(self.category)?.get(&self.name),
        }
    }
}

// ── DiagnosticSurface ────────────────────────────────────────────

/// The derived set of diagnostic fields for one gateway.
///
/// Built once after the first successful poll and held for the life of
/// the integration; values update live through [`DiagnosticField::value`]
/// but the field set itself is not recomputed per poll.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticSurface {
    fields: Vec<DiagnosticField>,
}

impl DiagnosticSurface {
    /// Enumerate the diagnostic fields present in a snapshot.
    ///
    /// Order is deterministic: categories in config → circuits → pumps
    /// → chemistry → scg order, indices ascending, fields in decoder
    /// insertion order, the two raw chemistry sentinels last. Absent
    /// categories contribute nothing.
    pub fn build(data: &GatewayData) -> Self {
        let mut fields = Vec::new();

        for category in DataCategory::ALL {
            let Some(payload) = data.get(category) else {
                continue;
            };
            if category.is_indexed() {
                if let Some(slots) = payload.as_indexed() {
                    for (&index, slot_fields) in slots {
                        collect_scalars(&mut fields, category, Some(index), slot_fields);
                    }
                }
            } else if let Some(flat_fields) = payload.as_flat() {
                collect_scalars(&mut fields, category, None, flat_fields);
            }
        }

        // Whole-substructure sentinels, unconditional.
        for key in RAW_CHEMISTRY_KEYS {
            fields.push(DiagnosticField::raw(key));
        }

        Self { fields }
    }

    pub fn fields(&self) -> &[DiagnosticField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DiagnosticField> {
        self.fields.iter()
    }
}

impl<'a> IntoIterator for &'a DiagnosticSurface {
    type Item = &'a DiagnosticField;
    type IntoIter = std::slice::Iter<'a, DiagnosticField>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

fn collect_scalars(
    fields: &mut Vec<DiagnosticField>,
    category: DataCategory,
    index: Option<u16>,
    field_map: &FieldMap,
) {
    for name in field_map.keys() {
        if is_surfaced(category, name) {
            fields.push(DiagnosticField::scalar(category, index, name));
        }
    }
}
