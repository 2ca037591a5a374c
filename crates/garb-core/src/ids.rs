//! Integer id newtypes for the catalog domain.
//!
//! Upstream records carry auto-increment integer keys. Wrapping each id
//! space in its own type keeps product ids, variant ids, and the various
//! reference-data ids from mixing at compile time.

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
  ($(#[$doc:meta])* $name:ident) => {
    $(#[$doc])*
    #[derive(
      Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
      Serialize, Deserialize,
    )]
    #[serde(transparent)]
    pub struct $name(pub u64);

    impl std::fmt::Display for $name {
      fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
      }
    }

    impl From<u64> for $name {
      fn from(raw: u64) -> Self { Self(raw) }
    }
  };
}

id_newtype!(
  /// A product — the unit shown in the catalog grid.
  ProductId
);
id_newtype!(
  /// A purchasable variant of a product (one SKU).
  VariantId
);
id_newtype!(CategoryId);
id_newtype!(BrandId);
id_newtype!(ProductTypeId);
id_newtype!(
  /// A dynamically-defined custom property ("Material", "Season", ...).
  PropertyId
);
id_newtype!(
  /// A single selectable value of an attribute.
  ValueId
);
id_newtype!(WarehouseId);
