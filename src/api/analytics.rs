use super::client::ApiClient;
use super::params::{with_query, SalesReportParams, SummaryParams, TopProductsParams};
use super::types::{DashboardSummary, SalesReport, TopProduct};
use crate::error::ApiError;

impl ApiClient {
  pub async fn get_dashboard_summary(
    &self,
    params: &SummaryParams,
  ) -> Result<DashboardSummary, ApiError> {
    self
      .get(&with_query("/mobile/analytics/summary", params))
      .await
  }

  pub async fn get_top_products(
    &self,
    params: &TopProductsParams,
  ) -> Result<Vec<TopProduct>, ApiError> {
    self
      .get(&with_query("/mobile/analytics/top-products", params))
      .await
  }

  pub async fn get_sales_report(
    &self,
    params: &SalesReportParams,
  ) -> Result<SalesReport, ApiError> {
    self
      .get(&with_query("/mobile/analytics/sales", params))
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::super::test_support::client_for;
  use super::super::types::{GroupBy, Period};
  use super::*;
  use chrono::NaiveDate;
  use serde_json::json;
  use wiremock::matchers::{method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  #[tokio::test]
  async fn test_summary_for_period() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/mobile/analytics/summary"))
      .and(query_param("period", "week"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "revenue": { "total": 1250.5, "change": 12.0, "orders": 30, "avgOrderValue": 41.68 },
        "orders": { "total": 30, "pending": 4 },
        "topProducts": [{ "id": "p1", "name": "Mug", "revenue": 300.0, "quantity": 25 }]
      })))
      .expect(1)
      .mount(&server)
      .await;

    let params = SummaryParams {
      period: Some(Period::Week),
      ..Default::default()
    };
    let summary = client_for(&server)
      .get_dashboard_summary(&params)
      .await
      .unwrap();
    assert_eq!(summary.revenue.orders, 30);
    assert_eq!(summary.orders.pending, 4);
    assert_eq!(summary.top_products[0].quantity, 25);
    assert!(summary.recent_orders.is_empty());
  }

  #[tokio::test]
  async fn test_sales_report_always_sends_date_range() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/mobile/analytics/sales"))
      .and(query_param("dateFrom", "2024-01-01"))
      .and(query_param("dateTo", "2024-01-31"))
      .and(query_param("groupBy", "week"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "data": [{ "date": "2024-01-01", "revenue": 100.0, "orders": 2, "avgOrderValue": 50.0 }],
        "totals": { "revenue": 100.0, "orders": 2, "avgOrderValue": 50.0 }
      })))
      .expect(1)
      .mount(&server)
      .await;

    let params = SalesReportParams {
      date_from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
      date_to: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
      group_by: Some(GroupBy::Week),
    };
    let report = client_for(&server).get_sales_report(&params).await.unwrap();
    assert_eq!(report.totals.orders, 2);
    assert_eq!(report.data.len(), 1);
  }

  #[tokio::test]
  async fn test_top_products_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/mobile/analytics/top-products"))
      .and(query_param("limit", "5"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([
        { "id": "p1", "name": "Mug", "revenue": 300.0, "quantity": 25, "ordersCount": 20 }
      ])))
      .mount(&server)
      .await;

    let params = TopProductsParams {
      limit: Some(5),
      ..Default::default()
    };
    let top = client_for(&server).get_top_products(&params).await.unwrap();
    assert_eq!(top[0].orders_count, Some(20));
  }
}
