use super::{stale, Storefront, MIN_BARCODE_LEN};
use crate::api::params::ProductsListParams;
use crate::api::types::{
  AdjustmentKind, BarcodeLookup, Category, InventoryResponse, InventoryUpdate, PriceResponse,
  PriceUpdate, Product, ProductDetail, ProductsPage, ProductsStats, StatusToggleResponse,
};
use crate::cache::{Family, InfiniteQuery, Operation, Query, QueryKey, QueryOptions};
use crate::error::ApiError;

/// Product reads and writes.
pub struct Products<'a> {
  sf: &'a Storefront,
}

impl<'a> Products<'a> {
  pub(super) fn new(sf: &'a Storefront) -> Self {
    Self { sf }
  }

  pub fn list_key(params: &ProductsListParams) -> QueryKey {
    QueryKey::new(Family::Products, Operation::List).with_params(params)
  }

  pub fn infinite_key(params: &ProductsListParams) -> QueryKey {
    QueryKey::new(Family::Products, Operation::Infinite).with_params(params)
  }

  pub fn detail_key(product_id: &str) -> QueryKey {
    QueryKey::new(Family::Products, Operation::Detail(product_id.to_string()))
  }

  pub fn barcode_key(barcode: &str) -> QueryKey {
    QueryKey::new(Family::Products, Operation::Barcode(barcode.to_string()))
  }

  pub fn categories_key() -> QueryKey {
    QueryKey::new(Family::Products, Operation::Categories)
  }

  pub async fn list(&self, params: &ProductsListParams) -> Result<ProductsPage, ApiError> {
    let key = self.sf.queries.with_epoch(Self::list_key(params));
    let api = self.sf.api.clone();
    let params = params.clone();
    let result = self
      .sf
      .queries
      .fetch(&key, stale::LIST, false, move || {
        let api = api.clone();
        let params = params.clone();
        async move { api.get_products(&params).await }
      })
      .await?;
    Ok(result.data)
  }

  pub fn list_query(&self, params: &ProductsListParams) -> Query<ProductsPage> {
    let api = self.sf.api.clone();
    let request = params.clone();
    Query::new(
      self.sf.queries.clone(),
      Self::list_key(params),
      QueryOptions::stale_after(stale::LIST),
      move || {
        let api = api.clone();
        let params = request.clone();
        async move { api.get_products(&params).await }
      },
    )
    .epoch_bound()
  }

  pub fn infinite(&self, params: &ProductsListParams) -> InfiniteQuery<Product, ProductsStats> {
    let mut base = params.clone();
    base.page = None;
    let key = Self::infinite_key(&base);
    let api = self.sf.api.clone();
    InfiniteQuery::new(self.sf.queries.clone(), key, stale::LIST, move |page| {
      let api = api.clone();
      let mut params = base.clone();
      params.page = Some(page);
      async move { api.get_products(&params).await }
    })
  }

  pub async fn detail(&self, product_id: &str) -> Result<ProductDetail, ApiError> {
    let key = Self::detail_key(product_id);
    let api = self.sf.api.clone();
    let id = product_id.to_string();
    let result = self
      .sf
      .queries
      .fetch(&key, stale::PRODUCT_DETAIL, false, move || {
        let api = api.clone();
        let id = id.clone();
        async move { api.get_product(&id).await }
      })
      .await?;
    Ok(result.data)
  }

  pub fn detail_query(&self, product_id: &str) -> Query<ProductDetail> {
    let api = self.sf.api.clone();
    let id = product_id.to_string();
    Query::new(
      self.sf.queries.clone(),
      Self::detail_key(product_id),
      QueryOptions::stale_after(stale::PRODUCT_DETAIL).enabled(!product_id.is_empty()),
      move || {
        let api = api.clone();
        let id = id.clone();
        async move { api.get_product(&id).await }
      },
    )
  }

  /// Look a scanned or typed code up. Codes shorter than
  /// [`MIN_BARCODE_LEN`] are not looked up and yield `None`.
  pub async fn barcode(&self, barcode: &str) -> Result<Option<BarcodeLookup>, ApiError> {
    if barcode.chars().count() < MIN_BARCODE_LEN {
      return Ok(None);
    }
    let key = Self::barcode_key(barcode);
    let api = self.sf.api.clone();
    let code = barcode.to_string();
    let result = self
      .sf
      .queries
      .fetch(&key, stale::BARCODE, false, move || {
        let api = api.clone();
        let code = code.clone();
        async move { api.search_by_barcode(&code).await }
      })
      .await?;
    Ok(Some(result.data))
  }

  pub fn barcode_query(&self, barcode: &str) -> Query<BarcodeLookup> {
    let api = self.sf.api.clone();
    let code = barcode.to_string();
    Query::new(
      self.sf.queries.clone(),
      Self::barcode_key(barcode),
      QueryOptions::stale_after(stale::BARCODE)
        .enabled(barcode.chars().count() >= MIN_BARCODE_LEN),
      move || {
        let api = api.clone();
        let code = code.clone();
        async move { api.search_by_barcode(&code).await }
      },
    )
  }

  pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
    let api = self.sf.api.clone();
    let result = self
      .sf
      .queries
      .fetch(&Self::categories_key(), stale::CATEGORIES, false, move || {
        let api = api.clone();
        async move { api.get_categories().await }
      })
      .await?;
    Ok(result.data)
  }

  pub async fn update_inventory(
    &self,
    product_id: &str,
    update: &InventoryUpdate,
  ) -> Result<InventoryResponse, ApiError> {
    let api = &self.sf.api;
    self
      .sf
      .queries
      .mutate_optimistic(
        &Self::detail_key(product_id),
        |detail: &mut ProductDetail| apply_inventory(update, detail),
        move || api.update_inventory(product_id, update),
        |response: &InventoryResponse, detail: &mut ProductDetail| {
          if let Some(state) = &response.product {
            detail.product.inventory = state.inventory;
            for confirmed in &state.variants {
              if let Some(variant) = detail.variants.iter_mut().find(|v| v.id == confirmed.id) {
                variant.inventory = confirmed.inventory;
              }
            }
          }
        },
      )
      .await
  }

  pub async fn update_price(
    &self,
    product_id: &str,
    update: &PriceUpdate,
  ) -> Result<PriceResponse, ApiError> {
    let api = &self.sf.api;
    self
      .sf
      .queries
      .mutate_optimistic(
        &Self::detail_key(product_id),
        |detail: &mut ProductDetail| apply_price(update, detail),
        move || api.update_price(product_id, update),
        |response: &PriceResponse, detail: &mut ProductDetail| {
          if update.variant_id.is_some() {
            return;
          }
          if let Some(state) = &response.product {
            detail.product.price = state.price;
            detail.product.compare_price = state.compare_price;
          }
        },
      )
      .await
  }

  pub async fn set_active(
    &self,
    product_id: &str,
    is_active: bool,
  ) -> Result<StatusToggleResponse, ApiError> {
    let api = &self.sf.api;
    self
      .sf
      .queries
      .mutate_optimistic(
        &Self::detail_key(product_id),
        |detail: &mut ProductDetail| detail.product.is_active = is_active,
        move || api.toggle_product_status(product_id, is_active),
        |response: &StatusToggleResponse, detail: &mut ProductDetail| {
          if let Some(confirmed) = response.is_active {
            detail.product.is_active = confirmed;
          }
        },
      )
      .await
  }
}

fn adjust(current: Option<i64>, kind: AdjustmentKind, value: i64) -> Option<i64> {
  let current = current.unwrap_or(0);
  Some(match kind {
    AdjustmentKind::Add => current + value,
    AdjustmentKind::Subtract => current - value,
    AdjustmentKind::Set => value,
  })
}

fn apply_inventory(update: &InventoryUpdate, detail: &mut ProductDetail) {
  if let Some(inventory) = update.inventory {
    detail.product.inventory = Some(inventory);
  }
  for target in update.variants.iter().flatten() {
    if let Some(variant) = detail.variants.iter_mut().find(|v| v.id == target.id) {
      variant.inventory = target.inventory;
    }
  }
  if let Some(adjustment) = &update.adjustment {
    match &adjustment.variant_id {
      Some(variant_id) => {
        if let Some(variant) = detail.variants.iter_mut().find(|v| &v.id == variant_id) {
          variant.inventory = adjust(variant.inventory, adjustment.kind, adjustment.value);
        }
      }
      None => {
        detail.product.inventory =
          adjust(detail.product.inventory, adjustment.kind, adjustment.value);
      }
    }
  }
}

fn apply_price(update: &PriceUpdate, detail: &mut ProductDetail) {
  match &update.variant_id {
    Some(variant_id) => {
      if let Some(variant) = detail.variants.iter_mut().find(|v| &v.id == variant_id) {
        if let Some(price) = update.price {
          variant.price = price;
        }
        if let Some(compare) = update.compare_price {
          variant.compare_price = compare;
        }
      }
    }
    None => {
      if let Some(price) = update.price {
        detail.product.price = Some(price);
      }
      if let Some(compare) = update.compare_price {
        detail.product.compare_price = compare;
      }
    }
  }
}
