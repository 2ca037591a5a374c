//! Per-request composition: base product set, filtered grid, sidebar
//! facets, price range. A pure read path — no side effects beyond cache
//! fills.

use std::{
  cmp::Reverse,
  collections::{BTreeMap, BTreeSet},
  sync::Arc,
  time::Duration,
};

use chrono::{DateTime, Utc};
use garb_core::{
  attribute::AttributeCatalog,
  criteria::{FilterCriteria, PageRequest, SortOrder},
  facet::FacetResult,
  ids::{BrandId, CategoryId, ProductId},
  index::{FactFilter, ProductQuery, VariantIndex},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  cache::TtlCache,
  facet::FacetAvailabilityEngine,
  filter::FilterEngine,
  payload::{CriteriaPayload, ResolvedQuery, resolve_criteria},
};

// ─── View types ──────────────────────────────────────────────────────────────

/// One product of the catalog grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
  pub product_id: ProductId,
  pub title:      String,
  pub slug:       String,
  pub brand_id:   BrandId,
  /// Minimum eligible retail price across the product's variants; absent
  /// when no eligible variant carries a price entry.
  pub min_price:  Option<Decimal>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
  pub items:    Vec<T>,
  pub page:     u32,
  pub per_page: u32,
  pub total:    u64,
}

#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct PriceRange {
  pub min: Decimal,
  pub max: Decimal,
}

/// The full response model for one catalog request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogView {
  pub products:    Page<ProductSummary>,
  pub filters:     Vec<FacetResult>,
  pub price_range: PriceRange,
  pub brands:      Vec<BrandId>,
}

impl CatalogView {
  /// The well-defined "nothing to show" view. Returned when a category has
  /// no eligible products at all (including mid-rebuild emptiness); never
  /// an error.
  pub fn empty(page: PageRequest) -> Self {
    let page = page.normalised();
    Self {
      products:    Page {
        items:    Vec::new(),
        page:     page.page,
        per_page: page.per_page,
        total:    0,
      },
      filters:     Vec::new(),
      price_range: PriceRange::default(),
      brands:      Vec::new(),
    }
  }
}

// ─── Configuration ───────────────────────────────────────────────────────────

/// Cache lifetimes. The base product set turns over with stock, so it stays
/// short; the price range and attribute metadata move only when the catalog
/// composition changes.
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorConfig {
  pub base_set_ttl:    Duration,
  pub price_range_ttl: Duration,
  pub catalog_ttl:     Duration,
}

impl Default for OrchestratorConfig {
  fn default() -> Self {
    Self {
      base_set_ttl:    Duration::from_secs(60),
      price_range_ttl: Duration::from_secs(600),
      catalog_ttl:     Duration::from_secs(3600),
    }
  }
}

// ─── Orchestrator ────────────────────────────────────────────────────────────

/// Composes the engines for one incoming request.
pub struct CatalogQueryOrchestrator<I> {
  index:        Arc<I>,
  filter:       FilterEngine<I>,
  facets:       FacetAvailabilityEngine<I>,
  config:       OrchestratorConfig,
  base_sets:    TtlCache<CategoryId, Arc<BTreeSet<ProductId>>>,
  price_ranges: TtlCache<CategoryId, PriceRange>,
  catalogs:     TtlCache<CategoryId, Arc<AttributeCatalog>>,
}

impl<I> CatalogQueryOrchestrator<I>
where
  I: VariantIndex,
{
  pub fn new(index: Arc<I>, config: OrchestratorConfig) -> Self {
    Self {
      filter: FilterEngine::new(index.clone()),
      facets: FacetAvailabilityEngine::new(index.clone()),
      index,
      config,
      base_sets: TtlCache::new(),
      price_ranges: TtlCache::new(),
      catalogs: TtlCache::new(),
    }
  }

  /// Resolve a raw boundary payload against the category's (cached)
  /// attribute catalog.
  pub async fn resolve(
    &self,
    category: CategoryId,
    payload: &CriteriaPayload,
  ) -> Result<ResolvedQuery> {
    let catalog = self.cached_catalog(category).await?;
    Ok(resolve_criteria(payload, category, &catalog))
  }

  /// Build the complete catalog view for one request.
  pub async fn build_catalog_view(
    &self,
    category: CategoryId,
    criteria: &FilterCriteria,
    sort: SortOrder,
    page: PageRequest,
  ) -> Result<CatalogView> {
    let page = page.normalised();

    let base = self.cached_base_set(category).await?;
    if base.is_empty() {
      tracing::debug!(%category, "no eligible products; returning empty view");
      return Ok(CatalogView::empty(page));
    }

    let matches = self.filter.find_matches(criteria).await?;

    // Minimum eligible price per matching product, computed once per
    // request. Feeds both the price sorts and the grid summaries.
    let min_prices = if matches.is_empty() {
      BTreeMap::new()
    } else {
      self
        .min_eligible_prices(category, &matches.product_ids)
        .await?
    };

    let mut infos = if matches.is_empty() {
      Vec::new()
    } else {
      self
        .index
        .products(&ProductQuery {
          ids: Some(matches.product_ids.clone()),
          ..ProductQuery::default()
        })
        .await
        .map_err(Error::index)?
    };

    match sort {
      SortOrder::Newest => infos.sort_by(|a, b| {
        b.created_at
          .cmp(&a.created_at)
          .then(b.product_id.cmp(&a.product_id))
      }),
      SortOrder::PriceAsc => infos.sort_by_key(|info| {
        let price = min_prices.get(&info.product_id).copied();
        (price.is_none(), price.unwrap_or_default(), info.product_id)
      }),
      SortOrder::PriceDesc => infos.sort_by_key(|info| {
        let price = min_prices.get(&info.product_id).copied();
        (
          price.is_none(),
          Reverse(price.unwrap_or_default()),
          info.product_id,
        )
      }),
    }

    let total = infos.len() as u64;
    let items = infos
      .into_iter()
      .skip(page.offset())
      .take(page.per_page as usize)
      .map(|info| ProductSummary {
        min_price:  min_prices.get(&info.product_id).copied(),
        product_id: info.product_id,
        title:      info.title,
        slug:       info.slug,
        brand_id:   info.brand_id,
        created_at: info.created_at,
      })
      .collect();

    let catalog = self.cached_catalog(category).await?;
    let filters = self.facets.compute_facets(criteria, &catalog).await?;
    let price_range = self.cached_price_range(category).await?;

    Ok(CatalogView {
      products: Page {
        items,
        page: page.page,
        per_page: page.per_page,
        total,
      },
      filters,
      price_range,
      brands: matches.brand_ids.into_iter().collect(),
    })
  }

  /// Drop every cached value for `category`, e.g. after a rebuild.
  pub fn invalidate(&self, category: CategoryId) {
    self.base_sets.invalidate(&category);
    self.price_ranges.invalidate(&category);
    self.catalogs.invalidate(&category);
  }

  // ── Cached building blocks ────────────────────────────────────────────────

  async fn cached_base_set(
    &self,
    category: CategoryId,
  ) -> Result<Arc<BTreeSet<ProductId>>> {
    self
      .base_sets
      .remember(category, self.config.base_set_ttl, || async {
        let filter = FactFilter::eligible_in(category);
        let facts =
          self.index.scan(&filter).await.map_err(Error::index)?;
        Ok(Arc::new(
          facts.into_iter().map(|fact| fact.product_id).collect(),
        ))
      })
      .await
  }

  async fn cached_catalog(
    &self,
    category: CategoryId,
  ) -> Result<Arc<AttributeCatalog>> {
    self
      .catalogs
      .remember(category, self.config.catalog_ttl, || async {
        self
          .index
          .attribute_catalog(category)
          .await
          .map(Arc::new)
          .map_err(Error::index)
      })
      .await
  }

  async fn cached_price_range(
    &self,
    category: CategoryId,
  ) -> Result<PriceRange> {
    self
      .price_ranges
      .remember(category, self.config.price_range_ttl, || async {
        let filter = FactFilter::eligible_in(category);
        let facts =
          self.index.scan(&filter).await.map_err(Error::index)?;

        let mut bounds: Option<(Decimal, Decimal)> = None;
        for fact in facts {
          bounds = Some(match bounds {
            None => (fact.price, fact.price),
            Some((min, max)) => {
              (min.min(fact.price), max.max(fact.price))
            }
          });
        }
        Ok(match bounds {
          Some((min, max)) => {
            PriceRange { min: min.floor(), max: max.ceil() }
          }
          None => PriceRange::default(),
        })
      })
      .await
  }

  async fn min_eligible_prices(
    &self,
    category: CategoryId,
    products: &BTreeSet<ProductId>,
  ) -> Result<BTreeMap<ProductId, Decimal>> {
    let filter = FactFilter {
      products: Some(products.clone()),
      ..FactFilter::eligible_in(category)
    };
    let facts = self.index.scan(&filter).await.map_err(Error::index)?;

    let mut prices: BTreeMap<ProductId, Decimal> = BTreeMap::new();
    for fact in facts {
      prices
        .entry(fact.product_id)
        .and_modify(|min| *min = (*min).min(fact.price))
        .or_insert(fact.price);
    }
    Ok(prices)
  }
}
