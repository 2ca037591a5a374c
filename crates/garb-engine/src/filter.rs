//! The filter engine: which products match the current criteria.

use std::{
  collections::BTreeSet,
  sync::Arc,
};

use garb_core::{
  criteria::FilterCriteria,
  ids::{BrandId, ProductId, VariantId},
  index::VariantIndex,
};

use crate::{
  Error, Result,
  predicate::{criteria_filter, type_restriction},
};

/// Distinct projections of the facts matching a criteria scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSet {
  pub product_ids: BTreeSet<ProductId>,
  pub variant_ids: BTreeSet<VariantId>,
  /// Brands represented among the matching facts; feeds the brand list of
  /// the catalog view.
  pub brand_ids:   BTreeSet<BrandId>,
}

impl MatchSet {
  pub fn is_empty(&self) -> bool { self.product_ids.is_empty() }
}

/// Stateless per request; the index snapshot is the only state.
#[derive(Debug, Clone)]
pub struct FilterEngine<I> {
  index: Arc<I>,
}

impl<I> FilterEngine<I>
where
  I: VariantIndex,
{
  pub fn new(index: Arc<I>) -> Self { Self { index } }

  /// Scan the eligible facts under `criteria` and project the distinct
  /// variant, product, and brand ids.
  pub async fn find_matches(
    &self,
    criteria: &FilterCriteria,
  ) -> Result<MatchSet> {
    let products = type_restriction(self.index.as_ref(), criteria).await?;
    let filter = criteria_filter(criteria, None, products);

    let facts =
      self.index.scan(&filter).await.map_err(Error::index)?;

    let mut matches = MatchSet::default();
    for fact in facts {
      matches.variant_ids.insert(fact.variant_id);
      matches.product_ids.insert(fact.product_id);
      matches.brand_ids.insert(fact.brand_id);
    }
    Ok(matches)
  }

  /// The distinct products matching `criteria`. Empty criteria yield every
  /// eligible product in the category.
  pub async fn find_matching_product_ids(
    &self,
    criteria: &FilterCriteria,
  ) -> Result<BTreeSet<ProductId>> {
    Ok(self.find_matches(criteria).await?.product_ids)
  }
}
