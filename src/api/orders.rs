use serde::de::IgnoredAny;
use serde_json::json;

use super::client::ApiClient;
use super::params::{with_query, OrdersListParams};
use super::segment;
use super::types::{
  Ack, ArchiveResponse, OrderDetail, OrderStatusUpdate, OrderUpdateResponse, OrdersPage,
  OrdersStats, RefundRequest, RefundResponse,
};
use crate::error::ApiError;

impl ApiClient {
  pub async fn get_orders(&self, params: &OrdersListParams) -> Result<OrdersPage, ApiError> {
    self.get(&with_query("/mobile/orders", params)).await
  }

  /// Order with its items, customer, transactions and timeline.
  pub async fn get_order(&self, order_id: &str) -> Result<OrderDetail, ApiError> {
    self.get(&format!("/mobile/orders/{}", segment(order_id))).await
  }

  pub async fn update_order_status(
    &self,
    order_id: &str,
    update: &OrderStatusUpdate,
  ) -> Result<OrderUpdateResponse, ApiError> {
    self
      .patch(&format!("/mobile/orders/{}", segment(order_id)), update)
      .await
  }

  pub async fn mark_order_as_read(&self, order_id: &str) -> Result<(), ApiError> {
    let _: IgnoredAny = self
      .patch(&format!("/mobile/orders/{}/read", segment(order_id)), &())
      .await?;
    Ok(())
  }

  pub async fn archive_orders(&self, order_ids: &[String]) -> Result<ArchiveResponse, ApiError> {
    self
      .post("/mobile/orders/archive", &json!({ "orderIds": order_ids }))
      .await
  }

  pub async fn refund_order(
    &self,
    order_id: &str,
    request: &RefundRequest,
  ) -> Result<RefundResponse, ApiError> {
    self
      .post(&format!("/mobile/orders/{}/refund", segment(order_id)), request)
      .await
  }

  pub async fn add_order_note(&self, order_id: &str, note: &str) -> Result<Ack, ApiError> {
    self
      .post(
        &format!("/mobile/orders/{}/notes", segment(order_id)),
        &json!({ "note": note }),
      )
      .await
  }

  pub async fn get_orders_stats(&self) -> Result<OrdersStats, ApiError> {
    self.get("/mobile/orders/stats").await
  }
}

#[cfg(test)]
mod tests {
  use super::super::test_support::client_for;
  use super::super::types::{OrderStatus, RefundRequest};
  use super::*;
  use chrono::NaiveDate;
  use wiremock::matchers::{body_json, method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn empty_page() -> serde_json::Value {
    json!({
      "orders": [],
      "pagination": { "page": 2, "limit": 20, "total": 21, "totalPages": 2 }
    })
  }

  #[tokio::test]
  async fn test_list_sends_only_supplied_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/mobile/orders"))
      .and(query_param("page", "2"))
      .and(query_param("status", "pending"))
      .and(query_param("dateFrom", "2024-03-01"))
      .respond_with(ResponseTemplate::new(200).set_body_json(empty_page()))
      .expect(1)
      .mount(&server)
      .await;

    let client = client_for(&server);
    let params = OrdersListParams {
      page: Some(2),
      status: Some(OrderStatus::Pending),
      search: Some(String::new()),
      date_from: NaiveDate::from_ymd_opt(2024, 3, 1),
      ..Default::default()
    };
    let page = client.get_orders(&params).await.unwrap();
    assert_eq!(page.pagination.total, 21);

    let requests = server.received_requests().await.unwrap();
    let query = requests[0].url.query().unwrap_or_default().to_string();
    assert!(!query.contains("search"));
    assert!(!query.contains("limit"));
  }

  #[tokio::test]
  async fn test_list_without_filters_has_no_query_string() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/mobile/orders"))
      .respond_with(ResponseTemplate::new(200).set_body_json(empty_page()))
      .mount(&server)
      .await;

    let client = client_for(&server);
    client.get_orders(&OrdersListParams::default()).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), None);
  }

  #[tokio::test]
  async fn test_status_update_sends_only_set_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
      .and(path("/mobile/orders/o1"))
      .and(body_json(json!({ "status": "processing", "notifyCustomer": true })))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
      .expect(1)
      .mount(&server)
      .await;

    let client = client_for(&server);
    let update = OrderStatusUpdate {
      status: Some(OrderStatus::Processing),
      notify_customer: Some(true),
      ..Default::default()
    };
    let response = client.update_order_status("o1", &update).await.unwrap();
    assert!(response.success);
    assert!(response.order.is_none());
  }

  #[tokio::test]
  async fn test_mark_as_read_accepts_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
      .and(path("/mobile/orders/o1/read"))
      .respond_with(ResponseTemplate::new(204))
      .expect(1)
      .mount(&server)
      .await;

    client_for(&server).mark_order_as_read("o1").await.unwrap();
  }

  #[tokio::test]
  async fn test_archive_and_refund_bodies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/mobile/orders/archive"))
      .and(body_json(json!({ "orderIds": ["o1", "o2"] })))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(json!({ "success": true, "archivedCount": 2 })),
      )
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("POST"))
      .and(path("/mobile/orders/o1/refund"))
      .and(body_json(json!({ "amount": 10.5, "reason": "damaged" })))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "success": true,
        "refund": { "id": "r1", "amount": 10.5, "status": "completed", "transactionId": null }
      })))
      .expect(1)
      .mount(&server)
      .await;

    let client = client_for(&server);
    let archived = client
      .archive_orders(&["o1".to_string(), "o2".to_string()])
      .await
      .unwrap();
    assert_eq!(archived.archived_count, 2);

    let refund = client
      .refund_order(
        "o1",
        &RefundRequest {
          amount: Some(10.5),
          reason: Some("damaged".into()),
          ..Default::default()
        },
      )
      .await
      .unwrap();
    assert_eq!(refund.refund.unwrap().id, "r1");
  }
}
