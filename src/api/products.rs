use serde_json::json;

use super::client::ApiClient;
use super::params::{with_query, ProductsListParams};
use super::segment;
use super::types::{
  BarcodeLookup, Category, InventoryResponse, InventoryUpdate, PriceResponse, PriceUpdate,
  ProductDetail, ProductsPage, StatusToggleResponse,
};
use crate::error::ApiError;

impl ApiClient {
  pub async fn get_products(&self, params: &ProductsListParams) -> Result<ProductsPage, ApiError> {
    self.get(&with_query("/mobile/products", params)).await
  }

  pub async fn get_product(&self, product_id: &str) -> Result<ProductDetail, ApiError> {
    self
      .get(&format!("/mobile/products/{}", segment(product_id)))
      .await
  }

  /// Set absolute stock, per-variant stock, or apply a relative adjustment.
  pub async fn update_inventory(
    &self,
    product_id: &str,
    update: &InventoryUpdate,
  ) -> Result<InventoryResponse, ApiError> {
    self
      .patch(
        &format!("/mobile/products/{}/inventory", segment(product_id)),
        update,
      )
      .await
  }

  pub async fn update_price(
    &self,
    product_id: &str,
    update: &PriceUpdate,
  ) -> Result<PriceResponse, ApiError> {
    self
      .patch(&format!("/mobile/products/{}", segment(product_id)), update)
      .await
  }

  pub async fn search_by_barcode(&self, barcode: &str) -> Result<BarcodeLookup, ApiError> {
    self
      .get(&format!("/mobile/products/barcode/{}", segment(barcode)))
      .await
  }

  pub async fn toggle_product_status(
    &self,
    product_id: &str,
    is_active: bool,
  ) -> Result<StatusToggleResponse, ApiError> {
    self
      .patch(
        &format!("/mobile/products/{}", segment(product_id)),
        &json!({ "isActive": is_active }),
      )
      .await
  }

  pub async fn get_categories(&self) -> Result<Vec<Category>, ApiError> {
    self.get("/mobile/categories").await
  }
}
