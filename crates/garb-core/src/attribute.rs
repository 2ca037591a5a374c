//! Attribute reference data — the static description of what is filterable.
//!
//! An attribute is either one of the three system axes every variant carries
//! (colour, size, gender) or a dynamically-defined custom property. Earlier
//! revisions of the upstream system distinguished the two with reserved
//! numeric id ranges; here the distinction is a tagged enum, so the mapping
//! is exhaustive and cannot collide with auto-assigned property ids.

use serde::{Deserialize, Serialize};

use crate::ids::{PropertyId, ValueId};

// ─── Keys ────────────────────────────────────────────────────────────────────

/// The three attribute axes built into every variant.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
  Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SystemAttribute {
  Color,
  Size,
  Gender,
}

impl SystemAttribute {
  pub const ALL: [SystemAttribute; 3] =
    [Self::Color, Self::Size, Self::Gender];

  /// The fixed slug this axis answers to in criteria payloads.
  pub fn slug(self) -> &'static str {
    match self {
      Self::Color => "color",
      Self::Size => "size",
      Self::Gender => "gender",
    }
  }

  pub fn from_slug(slug: &str) -> Option<Self> {
    match slug {
      "color" => Some(Self::Color),
      "size" => Some(Self::Size),
      "gender" => Some(Self::Gender),
      _ => None,
    }
  }
}

/// Identity of a filterable attribute.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
  Serialize, Deserialize,
)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum AttributeKey {
  System(SystemAttribute),
  Custom(PropertyId),
}

impl std::fmt::Display for AttributeKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::System(sys) => f.write_str(sys.slug()),
      Self::Custom(id) => write!(f, "property:{id}"),
    }
  }
}

// ─── Definitions ─────────────────────────────────────────────────────────────

/// One selectable value of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeValue {
  pub id:        ValueId,
  /// The canonical value string ("XS", "Cotton", ...); unique per attribute.
  pub raw_value: String,
  /// Optional display override; rendering falls back to `raw_value`.
  pub label:     Option<String>,
  pub priority:  i32,
}

impl AttributeValue {
  pub fn display_label(&self) -> &str {
    self.label.as_deref().unwrap_or(&self.raw_value)
  }
}

/// Immutable description of one filterable attribute, loaded once per
/// category context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDefinition {
  pub key:          AttributeKey,
  pub slug:         String,
  pub display_name: String,
  /// Measure symbol ("cm", "g") shown next to values, when one applies.
  pub unit_symbol:  Option<String>,
  /// Sidebar ordering of the attribute group, ascending.
  pub priority:     i32,
  /// All defined values, not just the ones currently in stock.
  pub values:       Vec<AttributeValue>,
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

/// The priority-ordered set of attributes filterable within one category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeCatalog {
  attributes: Vec<AttributeDefinition>,
}

impl AttributeCatalog {
  /// Build a catalog, ordering attribute groups by priority (ties by slug).
  pub fn new(mut attributes: Vec<AttributeDefinition>) -> Self {
    attributes.sort_by(|a, b| {
      a.priority.cmp(&b.priority).then_with(|| a.slug.cmp(&b.slug))
    });
    Self { attributes }
  }

  pub fn attributes(&self) -> &[AttributeDefinition] { &self.attributes }

  pub fn is_empty(&self) -> bool { self.attributes.is_empty() }

  pub fn by_key(&self, key: &AttributeKey) -> Option<&AttributeDefinition> {
    self.attributes.iter().find(|def| &def.key == key)
  }

  pub fn by_slug(&self, slug: &str) -> Option<&AttributeDefinition> {
    self.attributes.iter().find(|def| def.slug == slug)
  }

  /// Map a payload slug to an attribute key.
  ///
  /// The system slugs `color`/`size`/`gender` always resolve, whether or not
  /// the category currently carries that axis; custom slugs resolve only
  /// through the catalog. Unknown slugs yield `None` and are treated as
  /// no-ops by callers.
  pub fn resolve_slug(&self, slug: &str) -> Option<AttributeKey> {
    SystemAttribute::from_slug(slug)
      .map(AttributeKey::System)
      .or_else(|| self.by_slug(slug).map(|def| def.key))
  }
}
