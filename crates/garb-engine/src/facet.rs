//! Facet availability: for every filterable attribute, which of its values
//! would still yield at least one result if selected next.
//!
//! The availability pass for an attribute deliberately drops that
//! attribute's own selection before scanning (self-exclusion). Without it,
//! selecting "Red" makes every sibling colour read as unavailable — the
//! naive rendition this engine exists to forbid.

use std::{
  collections::{BTreeMap, BTreeSet},
  sync::Arc,
};

use garb_core::{
  attribute::{AttributeCatalog, AttributeKey},
  criteria::FilterCriteria,
  facet::{FacetResult, FacetValue},
  ids::ValueId,
  index::{FacetProbe, VariantIndex},
};

use crate::{
  Error, Result,
  predicate::{criteria_filter, type_restriction},
};

#[derive(Debug, Clone)]
pub struct FacetAvailabilityEngine<I> {
  index: Arc<I>,
}

impl<I> FacetAvailabilityEngine<I>
where
  I: VariantIndex,
{
  pub fn new(index: Arc<I>) -> Self { Self { index } }

  /// Compute the sidebar model for `criteria`.
  ///
  /// One probe per catalog attribute, answered by the index in a single
  /// batched pass. Every defined value of each attribute appears in the
  /// result, available or not; values sort by priority (ties by value id)
  /// and duplicate raw values collapse to the first entry.
  pub async fn compute_facets(
    &self,
    criteria: &FilterCriteria,
    catalog: &AttributeCatalog,
  ) -> Result<Vec<FacetResult>> {
    if catalog.is_empty() {
      return Ok(Vec::new());
    }

    let restriction =
      type_restriction(self.index.as_ref(), criteria).await?;
    let probes: Vec<FacetProbe> = catalog
      .attributes()
      .iter()
      .map(|def| FacetProbe {
        attribute: def.key,
        filter:    criteria_filter(
          criteria,
          Some(def.key),
          restriction.clone(),
        ),
      })
      .collect();

    let hits =
      self.index.facet_values(&probes).await.map_err(Error::index)?;
    let mut counts: BTreeMap<(AttributeKey, ValueId), u64> = BTreeMap::new();
    for hit in hits {
      *counts.entry((hit.attribute, hit.value_id)).or_insert(0) +=
        hit.variant_count;
    }

    Ok(
      catalog
        .attributes()
        .iter()
        .map(|def| {
          let mut ordered: Vec<_> = def.values.iter().collect();
          ordered.sort_by(|a, b| {
            a.priority.cmp(&b.priority).then(a.id.cmp(&b.id))
          });

          let mut seen: BTreeSet<&str> = BTreeSet::new();
          let values = ordered
            .into_iter()
            .filter(|value| seen.insert(value.raw_value.as_str()))
            .map(|value| {
              let count = counts.get(&(def.key, value.id)).copied();
              FacetValue {
                value_id:    value.id,
                raw_value:   value.raw_value.clone(),
                label:       value.display_label().to_owned(),
                available:   count.is_some(),
                match_count: count,
              }
            })
            .collect();

          FacetResult {
            attribute:    def.key,
            slug:         def.slug.clone(),
            display_name: def.display_name.clone(),
            unit_symbol:  def.unit_symbol.clone(),
            values,
          }
        })
        .collect(),
    )
  }
}
