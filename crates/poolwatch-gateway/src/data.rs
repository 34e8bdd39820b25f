// ── Gateway data model ──
//
// Decoded telemetry as category-keyed payloads. Payloads are loosely
// typed (`serde_json::Value` leaves) because the device firmware adds
// fields faster than the decoder learns their meaning — unrecognized
// fields are carried through under `unknown_at_offset_*` names.

use std::collections::BTreeMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

/// Field map for a single category (or a single indexed slot).
///
/// `IndexMap` keeps decoder insertion order, so enumeration over a
/// snapshot is deterministic.
pub type FieldMap = IndexMap<String, Value>;

/// Telemetry categories decoded from the gateway.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DataCategory {
    Config,
    Circuits,
    Pumps,
    Chemistry,
    Scg,
}

impl DataCategory {
    /// All categories in canonical order.
    pub const ALL: [DataCategory; 5] = [
        DataCategory::Config,
        DataCategory::Circuits,
        DataCategory::Pumps,
        DataCategory::Chemistry,
        DataCategory::Scg,
    ];

    /// Whether payloads for this category are keyed by an integer
    /// equipment index rather than directly by field name.
    pub const fn is_indexed(self) -> bool {
        matches!(self, DataCategory::Circuits | DataCategory::Pumps)
    }
}

/// Payload for one category: either a flat field map, or (for circuits
/// and pumps) an index → field map level.
///
/// Readers branch on [`DataCategory::is_indexed`], never on the shape of
/// the payload they happen to find.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CategoryData {
    Flat(FieldMap),
    Indexed(BTreeMap<u16, FieldMap>),
}

impl CategoryData {
    pub fn as_flat(&self) -> Option<&FieldMap> {
        match self {
            CategoryData::Flat(fields) => Some(fields),
            CategoryData::Indexed(_) => None,
        }
    }

    pub fn as_indexed(&self) -> Option<&BTreeMap<u16, FieldMap>> {
        match self {
            CategoryData::Indexed(slots) => Some(slots),
            CategoryData::Flat(_) => None,
        }
    }
}

// ── Equipment flags ──────────────────────────────────────────────

/// Installed-hardware bitmask from the CONFIG category.
///
/// Determines which optional fetches a poll cycle issues. Always re-read
/// from the current snapshot each cycle — equipment can be added or
/// removed between cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EquipmentFlags(u32);

impl EquipmentFlags {
    pub const SOLAR: EquipmentFlags = EquipmentFlags(0x1);
    pub const SOLAR_AS_HEAT_PUMP: EquipmentFlags = EquipmentFlags(0x2);
    pub const CHLORINATOR: EquipmentFlags = EquipmentFlags(0x4);
    pub const INTELLIBRITE: EquipmentFlags = EquipmentFlags(0x8);
    pub const INTELLIFLO_0: EquipmentFlags = EquipmentFlags(0x10);
    pub const INTELLIFLO_1: EquipmentFlags = EquipmentFlags(0x20);
    pub const INTELLICHEM: EquipmentFlags = EquipmentFlags(0x8000);

    pub const fn from_bits(bits: u32) -> Self {
        EquipmentFlags(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: EquipmentFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for EquipmentFlags {
    type Output = EquipmentFlags;

    fn bitor(self, rhs: EquipmentFlags) -> EquipmentFlags {
        EquipmentFlags(self.0 | rhs.0)
    }
}

// ── GatewayData ──────────────────────────────────────────────────

/// Field in the CONFIG category carrying [`EquipmentFlags`].
pub const EQUIPMENT_FLAGS_FIELD: &str = "equipment_flags";

/// The full decoded state of a gateway: category key → payload.
///
/// Replaced wholesale on each successful fetch set — never merged
/// field-by-field. Share snapshots through [`SharedGatewayData`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GatewayData {
    categories: BTreeMap<DataCategory, CategoryData>,
}

impl GatewayData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a category payload.
    pub fn insert(&mut self, category: DataCategory, data: CategoryData) {
        self.categories.insert(category, data);
    }

    pub fn get(&self, category: DataCategory) -> Option<&CategoryData> {
        self.categories.get(&category)
    }

    /// Flat field map for a non-indexed category.
    pub fn flat(&self, category: DataCategory) -> Option<&FieldMap> {
        self.categories.get(&category)?.as_flat()
    }

    /// Index → field map for an indexed category (circuits, pumps).
    pub fn indexed(&self, category: DataCategory) -> Option<&BTreeMap<u16, FieldMap>> {
        self.categories.get(&category)?.as_indexed()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Equipment flags from the CONFIG category, if present.
    pub fn equipment_flags(&self) -> Option<EquipmentFlags> {
        let bits = self
            .flat(DataCategory::Config)?
            .get(EQUIPMENT_FLAGS_FIELD)?
            .as_u64()?;
        Some(EquipmentFlags::from_bits(u32::try_from(bits).ok()?))
    }
}

// ── Shared snapshot handle ───────────────────────────────────────

/// Single-writer, multi-reader handle over the current [`GatewayData`].
///
/// Writers replace the whole snapshot with a pointer swap; readers load
/// an `Arc` and never lock, so no reader can observe a half-written
/// category.
#[derive(Debug, Clone)]
pub struct SharedGatewayData {
    inner: Arc<ArcSwap<GatewayData>>,
}

impl SharedGatewayData {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(GatewayData::new())),
        }
    }

    /// Current snapshot (cheap `Arc` clone).
    pub fn load(&self) -> Arc<GatewayData> {
        self.inner.load_full()
    }

    /// Replace the snapshot wholesale.
    pub fn replace(&self, data: GatewayData) {
        self.inner.store(Arc::new(data));
    }
}

impl Default for SharedGatewayData {
    fn default() -> Self {
        Self::new()
    }
}
