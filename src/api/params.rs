//! List filters and their query-string encoding.
//!
//! Only parameters the caller actually set are sent. Empty strings, zero
//! page numbers and unset booleans are omitted entirely.

use chrono::NaiveDate;
use serde::Serialize;

use super::types::{FulfillmentStatus, GroupBy, OrderStatus, Period};

/// Query parameters of a list endpoint.
pub trait QueryParams {
  fn to_pairs(&self) -> Vec<(&'static str, String)>;
}

/// Append the encoded parameters to `path`, or return it unchanged.
pub fn with_query(path: &str, params: &impl QueryParams) -> String {
  let pairs = params.to_pairs();
  if pairs.is_empty() {
    return path.to_string();
  }
  let mut serializer = url::form_urlencoded::Serializer::new(String::new());
  for (key, value) in &pairs {
    serializer.append_pair(key, value);
  }
  format!("{}?{}", path, serializer.finish())
}

fn push_number(pairs: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<u32>) {
  if let Some(v) = value.filter(|v| *v > 0) {
    pairs.push((key, v.to_string()));
  }
}

fn push_text(pairs: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<&str>) {
  if let Some(v) = value.filter(|v| !v.is_empty()) {
    pairs.push((key, v.to_string()));
  }
}

fn push_date(pairs: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<NaiveDate>) {
  if let Some(d) = value {
    pairs.push((key, d.format("%Y-%m-%d").to_string()));
  }
}

fn push_flag(pairs: &mut Vec<(&'static str, String)>, key: &'static str, value: bool) {
  if value {
    pairs.push((key, "true".to_string()));
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
  Asc,
  Desc,
}

impl SortOrder {
  pub fn as_str(self) -> &'static str {
    match self {
      SortOrder::Asc => "asc",
      SortOrder::Desc => "desc",
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrdersListParams {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub page: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub limit: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status: Option<OrderStatus>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub fulfillment_status: Option<FulfillmentStatus>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub search: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub date_from: Option<NaiveDate>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub date_to: Option<NaiveDate>,
}

impl QueryParams for OrdersListParams {
  fn to_pairs(&self) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    push_number(&mut pairs, "page", self.page);
    push_number(&mut pairs, "limit", self.limit);
    push_text(&mut pairs, "status", self.status.map(OrderStatus::as_str));
    push_text(
      &mut pairs,
      "fulfillmentStatus",
      self.fulfillment_status.map(FulfillmentStatus::as_str),
    );
    push_text(&mut pairs, "search", self.search.as_deref());
    push_date(&mut pairs, "dateFrom", self.date_from);
    push_date(&mut pairs, "dateTo", self.date_to);
    pairs
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatusFilter {
  Active,
  Draft,
  All,
}

impl ProductStatusFilter {
  pub fn as_str(self) -> &'static str {
    match self {
      ProductStatusFilter::Active => "active",
      ProductStatusFilter::Draft => "draft",
      ProductStatusFilter::All => "all",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ProductSort {
  Name,
  Price,
  Inventory,
  CreatedAt,
}

impl ProductSort {
  pub fn as_str(self) -> &'static str {
    match self {
      ProductSort::Name => "name",
      ProductSort::Price => "price",
      ProductSort::Inventory => "inventory",
      ProductSort::CreatedAt => "createdAt",
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductsListParams {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub page: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub limit: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub search: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub category_id: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status: Option<ProductStatusFilter>,
  #[serde(skip_serializing_if = "std::ops::Not::not")]
  pub low_stock: bool,
  #[serde(skip_serializing_if = "std::ops::Not::not")]
  pub out_of_stock: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub sort_by: Option<ProductSort>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub sort_order: Option<SortOrder>,
}

impl QueryParams for ProductsListParams {
  fn to_pairs(&self) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    push_number(&mut pairs, "page", self.page);
    push_number(&mut pairs, "limit", self.limit);
    push_text(&mut pairs, "search", self.search.as_deref());
    push_text(&mut pairs, "categoryId", self.category_id.as_deref());
    push_text(&mut pairs, "status", self.status.map(ProductStatusFilter::as_str));
    push_flag(&mut pairs, "lowStock", self.low_stock);
    push_flag(&mut pairs, "outOfStock", self.out_of_stock);
    push_text(&mut pairs, "sortBy", self.sort_by.map(ProductSort::as_str));
    push_text(&mut pairs, "sortOrder", self.sort_order.map(SortOrder::as_str));
    pairs
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CustomerSort {
  Name,
  TotalSpent,
  TotalOrders,
  CreatedAt,
}

impl CustomerSort {
  pub fn as_str(self) -> &'static str {
    match self {
      CustomerSort::Name => "name",
      CustomerSort::TotalSpent => "totalSpent",
      CustomerSort::TotalOrders => "totalOrders",
      CustomerSort::CreatedAt => "createdAt",
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomersListParams {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub page: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub limit: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub search: Option<String>,
  /// Unlike the other flags, `Some(false)` is sent.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub has_orders: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub sort_by: Option<CustomerSort>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub sort_order: Option<SortOrder>,
}

impl QueryParams for CustomersListParams {
  fn to_pairs(&self) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    push_number(&mut pairs, "page", self.page);
    push_number(&mut pairs, "limit", self.limit);
    push_text(&mut pairs, "search", self.search.as_deref());
    if let Some(has_orders) = self.has_orders {
      pairs.push(("hasOrders", has_orders.to_string()));
    }
    push_text(&mut pairs, "sortBy", self.sort_by.map(CustomerSort::as_str));
    push_text(&mut pairs, "sortOrder", self.sort_order.map(SortOrder::as_str));
    pairs
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryParams {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub period: Option<Period>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub date_from: Option<NaiveDate>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub date_to: Option<NaiveDate>,
}

impl QueryParams for SummaryParams {
  fn to_pairs(&self) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    push_text(&mut pairs, "period", self.period.map(Period::as_str));
    push_date(&mut pairs, "dateFrom", self.date_from);
    push_date(&mut pairs, "dateTo", self.date_to);
    pairs
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct TopProductsParams {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub period: Option<Period>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub limit: Option<u32>,
}

impl QueryParams for TopProductsParams {
  fn to_pairs(&self) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    push_text(&mut pairs, "period", self.period.map(Period::as_str));
    push_number(&mut pairs, "limit", self.limit);
    pairs
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReportParams {
  pub date_from: NaiveDate,
  pub date_to: NaiveDate,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub group_by: Option<GroupBy>,
}

impl QueryParams for SalesReportParams {
  fn to_pairs(&self) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    push_date(&mut pairs, "dateFrom", Some(self.date_from));
    push_date(&mut pairs, "dateTo", Some(self.date_to));
    let group_by = self.group_by.map(|g| match g {
      GroupBy::Day => "day",
      GroupBy::Week => "week",
      GroupBy::Month => "month",
    });
    push_text(&mut pairs, "groupBy", group_by);
    pairs
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_params_leave_path_untouched() {
    assert_eq!(
      with_query("/mobile/orders", &OrdersListParams::default()),
      "/mobile/orders"
    );
  }

  #[test]
  fn test_unset_and_empty_values_are_omitted() {
    let params = OrdersListParams {
      page: Some(2),
      status: Some(OrderStatus::Pending),
      search: Some(String::new()),
      ..Default::default()
    };
    assert_eq!(
      with_query("/mobile/orders", &params),
      "/mobile/orders?page=2&status=pending"
    );
  }

  #[test]
  fn test_product_flags_only_sent_when_true() {
    let params = ProductsListParams {
      low_stock: true,
      out_of_stock: false,
      sort_by: Some(ProductSort::CreatedAt),
      ..Default::default()
    };
    assert_eq!(
      with_query("/mobile/products", &params),
      "/mobile/products?lowStock=true&sortBy=createdAt"
    );
  }

  #[test]
  fn test_has_orders_false_is_sent() {
    let params = CustomersListParams {
      has_orders: Some(false),
      ..Default::default()
    };
    assert_eq!(
      with_query("/mobile/customers", &params),
      "/mobile/customers?hasOrders=false"
    );
  }

  #[test]
  fn test_search_is_url_encoded() {
    let params = CustomersListParams {
      search: Some("dana & co".to_string()),
      ..Default::default()
    };
    assert_eq!(
      with_query("/mobile/customers", &params),
      "/mobile/customers?search=dana+%26+co"
    );
  }

  #[test]
  fn test_dates_use_iso_format() {
    let params = SalesReportParams {
      date_from: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
      date_to: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
      group_by: Some(GroupBy::Week),
    };
    assert_eq!(
      with_query("/mobile/analytics/sales", &params),
      "/mobile/analytics/sales?dateFrom=2024-01-05&dateTo=2024-02-01&groupBy=week"
    );
  }
}
