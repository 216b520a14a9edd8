//! Serde types matching the storefront API.
//!
//! Field names follow the server's camelCase JSON. Accessors declare these
//! shapes but do not validate them beyond deserialization.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::cache::Cacheable;

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: String,
  pub name: String,
  pub email: String,
  #[serde(default)]
  pub avatar_url: Option<String>,
  /// "admin" or "merchant"
  pub role: String,
}

/// A tenant the user can act on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
  pub id: String,
  pub name: String,
  pub slug: String,
  #[serde(default)]
  pub logo_url: Option<String>,
  /// "owner", "manager", "marketing" or "developer"
  pub role: String,
  #[serde(default)]
  pub permissions: HashMap<String, bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
  pub email: String,
  pub password: String,
  pub device_id: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub push_token: Option<String>,
  pub platform: String,
  pub app_version: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
  #[serde(default)]
  pub success: bool,
  #[serde(default)]
  pub token: String,
  #[serde(default)]
  pub refresh_token: Option<String>,
  #[serde(default)]
  pub expires_at: Option<String>,
  pub user: Option<User>,
  #[serde(default)]
  pub stores: Vec<Store>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
  #[serde(default)]
  pub success: bool,
  #[serde(default)]
  pub token: String,
  #[serde(default)]
  pub refresh_token: Option<String>,
  #[serde(default)]
  pub expires_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentStoreResponse {
  pub store: Store,
  pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwitchStoreResponse {
  #[serde(default)]
  pub success: bool,
  pub store: Store,
}

/// Body of write endpoints that only acknowledge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ack {
  #[serde(default)]
  pub success: bool,
}

// ============================================================================
// Pagination
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
  pub page: u32,
  pub limit: u32,
  pub total: u64,
  pub total_pages: u32,
}

impl Pagination {
  pub fn has_next(&self) -> bool {
    self.page < self.total_pages
  }
}

/// One page of a list endpoint.
///
/// The server names the collection after the resource; `items` is accepted
/// too and is what the cache stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListPage<T, S = serde_json::Value> {
  #[serde(alias = "orders", alias = "products", alias = "customers")]
  pub items: Vec<T>,
  pub pagination: Pagination,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub stats: Option<S>,
}

// ============================================================================
// Orders
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
  Pending,
  Confirmed,
  Processing,
  Shipped,
  Delivered,
  Cancelled,
  Refunded,
  /// A status this client doesn't know yet
  #[serde(other)]
  Unknown,
}

impl OrderStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Confirmed => "confirmed",
      OrderStatus::Processing => "processing",
      OrderStatus::Shipped => "shipped",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Cancelled => "cancelled",
      OrderStatus::Refunded => "refunded",
      OrderStatus::Unknown => "unknown",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancialStatus {
  Pending,
  Paid,
  PartiallyPaid,
  Refunded,
  PartiallyRefunded,
  #[serde(other)]
  Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
  Unfulfilled,
  Partial,
  Fulfilled,
  #[serde(other)]
  Unknown,
}

impl FulfillmentStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      FulfillmentStatus::Unfulfilled => "unfulfilled",
      FulfillmentStatus::Partial => "partial",
      FulfillmentStatus::Fulfilled => "fulfilled",
      FulfillmentStatus::Unknown => "unknown",
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub first_name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub last_name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub company: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub address: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub street: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub house_number: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub apartment: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub floor: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub city: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub zip_code: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub phone: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
  pub id: String,
  #[serde(default)]
  pub product_id: Option<String>,
  pub name: String,
  #[serde(default)]
  pub variant_title: Option<String>,
  #[serde(default)]
  pub sku: Option<String>,
  pub quantity: u32,
  pub price: f64,
  pub total: f64,
  #[serde(default)]
  pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: String,
  pub order_number: String,
  pub status: OrderStatus,
  pub financial_status: FinancialStatus,
  pub fulfillment_status: FulfillmentStatus,
  #[serde(default)]
  pub subtotal: f64,
  #[serde(default)]
  pub discount_code: Option<String>,
  #[serde(default)]
  pub discount_amount: f64,
  #[serde(default)]
  pub shipping_amount: f64,
  #[serde(default)]
  pub tax_amount: f64,
  #[serde(default)]
  pub credit_used: f64,
  pub total: f64,
  #[serde(default)]
  pub currency: String,
  #[serde(default)]
  pub customer_id: Option<String>,
  #[serde(default)]
  pub customer_email: String,
  #[serde(default)]
  pub customer_name: String,
  #[serde(default)]
  pub customer_phone: String,
  #[serde(default)]
  pub shipping_address: Address,
  #[serde(default)]
  pub billing_address: Option<Address>,
  #[serde(default)]
  pub shipping_method: Option<String>,
  #[serde(default)]
  pub note: Option<String>,
  #[serde(default)]
  pub internal_note: Option<String>,
  #[serde(default)]
  pub is_read: bool,
  pub created_at: String,
  #[serde(default)]
  pub updated_at: String,
}

impl Cacheable for Order {
  fn cache_key(&self) -> String {
    self.id.clone()
  }

  fn entity_type() -> &'static str {
    "order"
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTransaction {
  pub id: String,
  /// "charge" or "refund"
  #[serde(rename = "type")]
  pub kind: String,
  /// "pending", "success" or "failed"
  pub status: String,
  pub amount: f64,
  #[serde(default)]
  pub provider: String,
  pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
  pub action: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub user_id: Option<String>,
  pub created_at: String,
}

/// An order with everything the detail screen shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetail {
  pub order: Order,
  #[serde(default)]
  pub items: Vec<OrderItem>,
  #[serde(default)]
  pub customer: Option<Customer>,
  #[serde(default)]
  pub transactions: Vec<OrderTransaction>,
  #[serde(default)]
  pub timeline: Vec<TimelineEvent>,
}

/// Counts by status attached to the first page of the orders list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrdersListStats {
  #[serde(default)]
  pub pending: u64,
  #[serde(default)]
  pub processing: u64,
  #[serde(default)]
  pub shipped: u64,
  #[serde(default)]
  pub delivered: u64,
  #[serde(default)]
  pub cancelled: u64,
}

pub type OrdersPage = ListPage<Order, OrdersListStats>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodTotals {
  pub orders: u64,
  pub revenue: f64,
}

/// Response of the dedicated order stats endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrdersStats {
  #[serde(default)]
  pub today: PeriodTotals,
  #[serde(default)]
  pub week: PeriodTotals,
  #[serde(default)]
  pub month: PeriodTotals,
  #[serde(default)]
  pub pending: u64,
  #[serde(default)]
  pub processing: u64,
}

/// Field set changed by the order status mutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status: Option<OrderStatus>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub fulfillment_status: Option<FulfillmentStatus>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub internal_note: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub tracking_number: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub tracking_url: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notify_customer: Option<bool>,
}

impl OrderStatusUpdate {
  /// Apply the locally visible part of the update.
  pub fn apply_to(&self, order: &mut Order) {
    if let Some(status) = self.status {
      order.status = status;
    }
    if let Some(fulfillment) = self.fulfillment_status {
      order.fulfillment_status = fulfillment;
    }
    if let Some(note) = &self.internal_note {
      order.internal_note = Some(note.clone());
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderUpdateResponse {
  #[serde(default)]
  pub success: bool,
  pub order: Option<Order>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveResponse {
  #[serde(default)]
  pub success: bool,
  #[serde(default)]
  pub archived_count: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub amount: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub reason: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub restock_items: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notify_customer: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Refund {
  pub id: String,
  pub amount: f64,
  /// "pending", "completed" or "failed"
  pub status: String,
  #[serde(default)]
  pub transaction_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefundResponse {
  #[serde(default)]
  pub success: bool,
  pub refund: Option<Refund>,
}

// ============================================================================
// Products
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
  pub id: String,
  pub url: String,
  #[serde(default)]
  pub alt: Option<String>,
  #[serde(default)]
  pub sort_order: i32,
  #[serde(default)]
  pub is_primary: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
  pub id: String,
  #[serde(default)]
  pub product_id: String,
  pub title: String,
  #[serde(default)]
  pub sku: Option<String>,
  #[serde(default)]
  pub barcode: Option<String>,
  pub price: f64,
  #[serde(default)]
  pub compare_price: Option<f64>,
  #[serde(default)]
  pub inventory: Option<i64>,
  #[serde(default)]
  pub image_url: Option<String>,
  #[serde(default)]
  pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRef {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  pub id: String,
  #[serde(default)]
  pub store_id: String,
  #[serde(default)]
  pub category_id: Option<String>,
  pub name: String,
  #[serde(default)]
  pub slug: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub price: Option<f64>,
  #[serde(default)]
  pub compare_price: Option<f64>,
  #[serde(default)]
  pub cost: Option<f64>,
  #[serde(default)]
  pub sku: Option<String>,
  #[serde(default)]
  pub barcode: Option<String>,
  #[serde(default)]
  pub has_variants: bool,
  #[serde(default)]
  pub track_inventory: bool,
  #[serde(default)]
  pub inventory: Option<i64>,
  #[serde(default)]
  pub allow_backorder: bool,
  #[serde(default)]
  pub is_active: bool,
  #[serde(default)]
  pub is_featured: bool,
  #[serde(default)]
  pub image_url: Option<String>,
  #[serde(default)]
  pub created_at: String,
  #[serde(default)]
  pub updated_at: String,
}

impl Cacheable for Product {
  fn cache_key(&self) -> String {
    self.id.clone()
  }

  fn entity_type() -> &'static str {
    "product"
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductOptionValue {
  pub id: String,
  pub value: String,
  #[serde(default)]
  pub sort_order: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductOption {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub sort_order: i32,
  #[serde(default)]
  pub values: Vec<ProductOptionValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetail {
  pub product: Product,
  #[serde(default)]
  pub images: Vec<ProductImage>,
  #[serde(default)]
  pub options: Vec<ProductOption>,
  #[serde(default)]
  pub variants: Vec<ProductVariant>,
  #[serde(default)]
  pub category: Option<CategoryRef>,
  #[serde(default)]
  pub categories: Vec<CategoryRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductsStats {
  #[serde(default)]
  pub total: u64,
  #[serde(default)]
  pub active: u64,
  #[serde(default)]
  pub draft: u64,
  #[serde(default)]
  pub low_stock: u64,
  #[serde(default)]
  pub out_of_stock: u64,
}

pub type ProductsPage = ListPage<Product, ProductsStats>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentKind {
  Add,
  Subtract,
  Set,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryAdjustment {
  #[serde(rename = "type")]
  pub kind: AdjustmentKind,
  pub value: i64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub variant_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantInventory {
  pub id: String,
  pub inventory: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InventoryUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub inventory: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub variants: Option<Vec<VariantInventory>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub adjustment: Option<InventoryAdjustment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InventoryState {
  pub id: String,
  pub inventory: Option<i64>,
  #[serde(default)]
  pub variants: Vec<VariantInventory>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InventoryResponse {
  #[serde(default)]
  pub success: bool,
  pub product: Option<InventoryState>,
}

/// `compare_price: Some(None)` clears the compare-at price.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub price: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub compare_price: Option<Option<f64>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub variant_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceState {
  pub id: String,
  pub price: Option<f64>,
  pub compare_price: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceResponse {
  #[serde(default)]
  pub success: bool,
  pub product: Option<PriceState>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusToggleResponse {
  #[serde(default)]
  pub success: bool,
  pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarcodeProduct {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub price: Option<f64>,
  #[serde(default)]
  pub inventory: Option<i64>,
  #[serde(default)]
  pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarcodeVariant {
  pub id: String,
  pub title: String,
  pub price: f64,
  #[serde(default)]
  pub inventory: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarcodeLookup {
  #[serde(default)]
  pub found: bool,
  #[serde(default)]
  pub product: Option<BarcodeProduct>,
  #[serde(default)]
  pub variant: Option<BarcodeVariant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub slug: String,
  #[serde(default)]
  pub products_count: u64,
  #[serde(default)]
  pub parent_id: Option<String>,
}

// ============================================================================
// Customers
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
  pub id: String,
  pub email: String,
  #[serde(default)]
  pub first_name: Option<String>,
  #[serde(default)]
  pub last_name: Option<String>,
  #[serde(default)]
  pub phone: Option<String>,
  #[serde(default)]
  pub default_address: Option<Address>,
  #[serde(default)]
  pub notes: Option<String>,
  #[serde(default)]
  pub total_orders: u64,
  #[serde(default)]
  pub total_spent: f64,
  #[serde(default)]
  pub credit_balance: f64,
  #[serde(default)]
  pub accepts_marketing: bool,
  #[serde(default)]
  pub last_order_at: Option<String>,
  #[serde(default)]
  pub created_at: String,
  #[serde(default)]
  pub updated_at: String,
}

impl Cacheable for Customer {
  fn cache_key(&self) -> String {
    self.id.clone()
  }

  fn entity_type() -> &'static str {
    "customer"
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerOrder {
  pub id: String,
  pub order_number: String,
  pub total: f64,
  pub status: OrderStatus,
  pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditEntry {
  pub id: String,
  /// "credit", "debit" or "refund"
  #[serde(rename = "type")]
  pub kind: String,
  pub amount: f64,
  pub balance_after: f64,
  #[serde(default)]
  pub reason: Option<String>,
  pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetail {
  pub customer: Customer,
  #[serde(default)]
  pub orders: Vec<CustomerOrder>,
  #[serde(default)]
  pub credit_history: Vec<CreditEntry>,
}

pub type CustomersPage = ListPage<Customer>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomersStats {
  #[serde(default)]
  pub total: u64,
  #[serde(default)]
  pub new: u64,
  #[serde(default)]
  pub returning: u64,
  #[serde(default)]
  pub avg_spent: f64,
}

/// Editable customer fields; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub first_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub last_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub phone: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub accepts_marketing: Option<bool>,
}

impl CustomerUpdate {
  pub fn apply_to(&self, customer: &mut Customer) {
    if let Some(v) = &self.first_name {
      customer.first_name = Some(v.clone());
    }
    if let Some(v) = &self.last_name {
      customer.last_name = Some(v.clone());
    }
    if let Some(v) = &self.phone {
      customer.phone = Some(v.clone());
    }
    if let Some(v) = &self.notes {
      customer.notes = Some(v.clone());
    }
    if let Some(v) = self.accepts_marketing {
      customer.accepts_marketing = v;
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerUpdateResponse {
  #[serde(default)]
  pub success: bool,
  pub customer: Option<Customer>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreditRequest {
  pub amount: f64,
  pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditBalance {
  pub id: String,
  pub credit_balance: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreditResponse {
  #[serde(default)]
  pub success: bool,
  pub customer: Option<CreditBalance>,
}

// ============================================================================
// Analytics
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
  Today,
  Yesterday,
  Week,
  Month,
  Year,
}

impl Period {
  pub fn as_str(self) -> &'static str {
    match self {
      Period::Today => "today",
      Period::Yesterday => "yesterday",
      Period::Week => "week",
      Period::Month => "month",
      Period::Year => "year",
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSummary {
  pub total: f64,
  #[serde(default)]
  pub change: f64,
  #[serde(default)]
  pub orders: u64,
  #[serde(default)]
  pub avg_order_value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrdersSummary {
  pub total: u64,
  #[serde(default)]
  pub pending: u64,
  #[serde(default)]
  pub processing: u64,
  #[serde(default)]
  pub shipped: u64,
  #[serde(default)]
  pub delivered: u64,
  #[serde(default)]
  pub cancelled: u64,
  #[serde(default)]
  pub change: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductsSummary {
  pub total: u64,
  #[serde(default)]
  pub active: u64,
  #[serde(default)]
  pub low_stock: u64,
  #[serde(default)]
  pub out_of_stock: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomersSummary {
  pub total: u64,
  #[serde(default)]
  pub new: u64,
  #[serde(default)]
  pub returning: u64,
  #[serde(default)]
  pub change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub image_url: Option<String>,
  pub revenue: f64,
  pub quantity: u64,
  #[serde(default)]
  pub orders_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentOrder {
  pub id: String,
  pub order_number: String,
  pub customer_name: String,
  pub total: f64,
  pub status: OrderStatus,
  pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenuePoint {
  pub date: String,
  pub revenue: f64,
  pub orders: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
  #[serde(default)]
  pub revenue: RevenueSummary,
  #[serde(default)]
  pub orders: OrdersSummary,
  #[serde(default)]
  pub products: ProductsSummary,
  #[serde(default)]
  pub customers: CustomersSummary,
  #[serde(default)]
  pub top_products: Vec<TopProduct>,
  #[serde(default)]
  pub recent_orders: Vec<RecentOrder>,
  #[serde(default)]
  pub revenue_chart: Vec<RevenuePoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
  Day,
  Week,
  Month,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesPoint {
  pub date: String,
  pub revenue: f64,
  pub orders: u64,
  pub avg_order_value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesTotals {
  pub revenue: f64,
  pub orders: u64,
  pub avg_order_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesReport {
  #[serde(default)]
  pub data: Vec<SalesPoint>,
  #[serde(default)]
  pub totals: SalesTotals,
}
