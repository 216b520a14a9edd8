use tracing::debug;

use super::{stale, Storefront};
use crate::api::params::OrdersListParams;
use crate::api::types::{
  Ack, ArchiveResponse, Order, OrderDetail, OrderStatusUpdate, OrderUpdateResponse,
  OrdersListStats, OrdersPage, OrdersStats, RefundRequest, RefundResponse,
};
use crate::cache::{Family, InfiniteQuery, Operation, Query, QueryKey, QueryOptions};
use crate::error::ApiError;

/// Order reads and writes.
pub struct Orders<'a> {
  sf: &'a Storefront,
}

impl<'a> Orders<'a> {
  pub(super) fn new(sf: &'a Storefront) -> Self {
    Self { sf }
  }

  pub fn list_key(params: &OrdersListParams) -> QueryKey {
    QueryKey::new(Family::Orders, Operation::List).with_params(params)
  }

  pub fn infinite_key(params: &OrdersListParams) -> QueryKey {
    QueryKey::new(Family::Orders, Operation::Infinite).with_params(params)
  }

  pub fn detail_key(order_id: &str) -> QueryKey {
    QueryKey::new(Family::Orders, Operation::Detail(order_id.to_string()))
  }

  pub fn stats_key() -> QueryKey {
    QueryKey::new(Family::Orders, Operation::Stats)
  }

  pub async fn list(&self, params: &OrdersListParams) -> Result<OrdersPage, ApiError> {
    let key = self.sf.queries.with_epoch(Self::list_key(params));
    let api = self.sf.api.clone();
    let params = params.clone();
    let result = self
      .sf
      .queries
      .fetch(&key, stale::LIST, false, move || {
        let api = api.clone();
        let params = params.clone();
        async move { api.get_orders(&params).await }
      })
      .await?;
    Ok(result.data)
  }

  pub fn list_query(&self, params: &OrdersListParams) -> Query<OrdersPage> {
    let api = self.sf.api.clone();
    let request = params.clone();
    Query::new(
      self.sf.queries.clone(),
      Self::list_key(params),
      QueryOptions::stale_after(stale::LIST),
      move || {
        let api = api.clone();
        let params = request.clone();
        async move { api.get_orders(&params).await }
      },
    )
    .epoch_bound()
  }

  /// Page-by-page order list. `params.page` is ignored; pages start at 1.
  pub fn infinite(&self, params: &OrdersListParams) -> InfiniteQuery<Order, OrdersListStats> {
    let mut base = params.clone();
    base.page = None;
    let key = Self::infinite_key(&base);
    let api = self.sf.api.clone();
    InfiniteQuery::new(self.sf.queries.clone(), key, stale::LIST, move |page| {
      let api = api.clone();
      let mut params = base.clone();
      params.page = Some(page);
      async move { api.get_orders(&params).await }
    })
  }

  pub async fn detail(&self, order_id: &str) -> Result<OrderDetail, ApiError> {
    let key = Self::detail_key(order_id);
    let api = self.sf.api.clone();
    let id = order_id.to_string();
    let result = self
      .sf
      .queries
      .fetch(&key, stale::ORDER_DETAIL, false, move || {
        let api = api.clone();
        let id = id.clone();
        async move { api.get_order(&id).await }
      })
      .await?;
    Ok(result.data)
  }

  /// Disabled for an empty id.
  pub fn detail_query(&self, order_id: &str) -> Query<OrderDetail> {
    let api = self.sf.api.clone();
    let id = order_id.to_string();
    Query::new(
      self.sf.queries.clone(),
      Self::detail_key(order_id),
      QueryOptions::stale_after(stale::ORDER_DETAIL).enabled(!order_id.is_empty()),
      move || {
        let api = api.clone();
        let id = id.clone();
        async move { api.get_order(&id).await }
      },
    )
  }

  pub async fn stats(&self) -> Result<OrdersStats, ApiError> {
    let key = self.sf.queries.with_epoch(Self::stats_key());
    let api = self.sf.api.clone();
    let result = self
      .sf
      .queries
      .fetch(&key, stale::STATS, false, move || {
        let api = api.clone();
        async move { api.get_orders_stats().await }
      })
      .await?;
    Ok(result.data)
  }

  pub fn stats_query(&self) -> Query<OrdersStats> {
    let api = self.sf.api.clone();
    Query::new(
      self.sf.queries.clone(),
      Self::stats_key(),
      QueryOptions::stale_after(stale::STATS),
      move || {
        let api = api.clone();
        async move { api.get_orders_stats().await }
      },
    )
    .epoch_bound()
  }

  /// Optimistic status change on the cached detail.
  pub async fn update_status(
    &self,
    order_id: &str,
    update: &OrderStatusUpdate,
  ) -> Result<OrderUpdateResponse, ApiError> {
    let api = &self.sf.api;
    self
      .sf
      .queries
      .mutate_optimistic(
        &Self::detail_key(order_id),
        |detail: &mut OrderDetail| update.apply_to(&mut detail.order),
        move || api.update_order_status(order_id, update),
        |response: &OrderUpdateResponse, detail: &mut OrderDetail| {
          if let Some(order) = &response.order {
            detail.order = order.clone();
          }
        },
      )
      .await
  }

  pub async fn mark_as_read(&self, order_id: &str) -> Result<(), ApiError> {
    let api = &self.sf.api;
    self
      .sf
      .queries
      .mutate_optimistic(
        &Self::detail_key(order_id),
        |detail: &mut OrderDetail| detail.order.is_read = true,
        move || api.mark_order_as_read(order_id),
        |_: &(), _: &mut OrderDetail| {},
      )
      .await
  }

  /// Archive several orders; every order list refetches afterwards.
  pub async fn archive(&self, order_ids: &[String]) -> Result<ArchiveResponse, ApiError> {
    let api = &self.sf.api;
    let response = self
      .sf
      .queries
      .mutate(move || api.archive_orders(order_ids))
      .await?;
    let epoch = self.sf.session.trigger_orders_refresh();
    debug!(count = response.archived_count, epoch, "orders archived");
    Ok(response)
  }

  pub async fn refund(
    &self,
    order_id: &str,
    request: &RefundRequest,
  ) -> Result<RefundResponse, ApiError> {
    let api = &self.sf.api;
    let response = self
      .sf
      .queries
      .mutate(move || api.refund_order(order_id, request))
      .await?;
    self.sf.queries.cache().invalidate(&Self::detail_key(order_id));
    self.sf.session.trigger_orders_refresh();
    Ok(response)
  }

  pub async fn add_note(&self, order_id: &str, note: &str) -> Result<Ack, ApiError> {
    let api = &self.sf.api;
    let response = self
      .sf
      .queries
      .mutate(move || api.add_order_note(order_id, note))
      .await?;
    self.sf.queries.cache().invalidate(&Self::detail_key(order_id));
    Ok(response)
  }
}

#[cfg(test)]
mod tests {
  use super::super::test_support::{order_json, orders_page, storefront_for};
  use super::*;
  use crate::api::types::OrderStatus;
  use crate::cache::Family;
  use serde_json::json;
  use wiremock::matchers::{method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn detail_body(status: &str) -> serde_json::Value {
    json!({ "order": order_json("o1", status), "items": [], "timeline": [] })
  }

  async fn mount_detail(server: &MockServer, status: &str) {
    Mock::given(method("GET"))
      .and(path("/mobile/orders/o1"))
      .respond_with(ResponseTemplate::new(200).set_body_json(detail_body(status)))
      .mount(server)
      .await;
  }

  async fn request_count(server: &MockServer, route: &str) -> usize {
    server
      .received_requests()
      .await
      .unwrap()
      .iter()
      .filter(|r| r.url.path() == route)
      .count()
  }

  #[tokio::test]
  async fn test_refresh_trigger_refetches_only_that_family() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/mobile/orders"))
      .respond_with(ResponseTemplate::new(200).set_body_json(orders_page(&["o1"], 1, 1)))
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/mobile/orders/stats"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "pending": 1 })))
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/mobile/customers/stats"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "total": 3 })))
      .mount(&server)
      .await;

    let sf = storefront_for(&server);
    let params = OrdersListParams::default();
    sf.orders().list(&params).await.unwrap();
    sf.orders().stats().await.unwrap();
    sf.customers().stats().await.unwrap();

    // Within the staleness window nothing is refetched.
    sf.orders().list(&params).await.unwrap();
    sf.customers().stats().await.unwrap();
    assert_eq!(request_count(&server, "/mobile/orders").await, 1);

    sf.session().trigger_orders_refresh();

    sf.orders().list(&params).await.unwrap();
    sf.orders().stats().await.unwrap();
    sf.customers().stats().await.unwrap();
    assert_eq!(request_count(&server, "/mobile/orders").await, 2);
    assert_eq!(request_count(&server, "/mobile/orders/stats").await, 2);
    assert_eq!(request_count(&server, "/mobile/customers/stats").await, 1);
  }

  #[tokio::test]
  async fn test_failed_status_update_restores_detail() {
    let server = MockServer::start().await;
    mount_detail(&server, "pending").await;
    Mock::given(method("PATCH"))
      .and(path("/mobile/orders/o1"))
      .respond_with(ResponseTemplate::new(500))
      .mount(&server)
      .await;

    let sf = storefront_for(&server);
    let before = sf.orders().detail("o1").await.unwrap();

    let update = OrderStatusUpdate {
      status: Some(OrderStatus::Processing),
      ..Default::default()
    };
    let err = sf.orders().update_status("o1", &update).await.unwrap_err();
    assert_eq!(err.status(), Some(500));

    let cached: OrderDetail = sf
      .queries()
      .cache()
      .get_as(&Orders::detail_key("o1"))
      .unwrap();
    assert_eq!(cached, before);
    assert_eq!(cached.order.status, OrderStatus::Pending);
    assert_eq!(sf.session().epoch(Family::Orders), 0);
  }

  #[tokio::test]
  async fn test_status_update_keeps_optimistic_value_and_bumps_epoch() {
    let server = MockServer::start().await;
    mount_detail(&server, "pending").await;
    Mock::given(method("PATCH"))
      .and(path("/mobile/orders/o1"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
      .expect(1)
      .mount(&server)
      .await;

    let sf = storefront_for(&server);
    sf.orders().detail("o1").await.unwrap();

    let update = OrderStatusUpdate {
      status: Some(OrderStatus::Processing),
      ..Default::default()
    };
    sf.orders().update_status("o1", &update).await.unwrap();

    let detail = sf.orders().detail("o1").await.unwrap();
    assert_eq!(detail.order.status, OrderStatus::Processing);
    assert_eq!(sf.session().epoch(Family::Orders), 1);
    assert_eq!(request_count(&server, "/mobile/orders/o1").await, 2);
  }

  #[tokio::test]
  async fn test_confirmed_order_replaces_optimistic_fields() {
    let server = MockServer::start().await;
    mount_detail(&server, "pending").await;
    Mock::given(method("PATCH"))
      .and(path("/mobile/orders/o1"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "success": true,
        "order": order_json("o1", "shipped")
      })))
      .mount(&server)
      .await;

    let sf = storefront_for(&server);
    sf.orders().detail("o1").await.unwrap();

    let update = OrderStatusUpdate {
      status: Some(OrderStatus::Processing),
      ..Default::default()
    };
    sf.orders().update_status("o1", &update).await.unwrap();

    let cached: OrderDetail = sf
      .queries()
      .cache()
      .get_as(&Orders::detail_key("o1"))
      .unwrap();
    assert_eq!(cached.order.status, OrderStatus::Shipped);
  }

  #[tokio::test]
  async fn test_mark_as_read_is_optimistic() {
    let server = MockServer::start().await;
    mount_detail(&server, "pending").await;
    Mock::given(method("PATCH"))
      .and(path("/mobile/orders/o1/read"))
      .respond_with(ResponseTemplate::new(204))
      .mount(&server)
      .await;

    let sf = storefront_for(&server);
    sf.orders().detail("o1").await.unwrap();
    sf.orders().mark_as_read("o1").await.unwrap();

    let cached: OrderDetail = sf
      .queries()
      .cache()
      .get_as(&Orders::detail_key("o1"))
      .unwrap();
    assert!(cached.order.is_read);
  }

  #[tokio::test]
  async fn test_refund_invalidates_detail_and_lists() {
    let server = MockServer::start().await;
    mount_detail(&server, "delivered").await;
    Mock::given(method("POST"))
      .and(path("/mobile/orders/o1/refund"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
      .mount(&server)
      .await;

    let sf = storefront_for(&server);
    sf.orders().detail("o1").await.unwrap();
    sf.orders()
      .refund("o1", &RefundRequest::default())
      .await
      .unwrap();

    let state = sf
      .queries()
      .cache()
      .state(&Orders::detail_key("o1"))
      .unwrap();
    assert!(state.invalidated);
    assert_eq!(sf.session().epoch(Family::Orders), 1);

    sf.orders().detail("o1").await.unwrap();
    assert_eq!(request_count(&server, "/mobile/orders/o1").await, 2);
  }

  #[tokio::test]
  async fn test_failed_archive_leaves_epoch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/mobile/orders/archive"))
      .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "message": "nope" })))
      .mount(&server)
      .await;

    let sf = storefront_for(&server);
    let result = sf.orders().archive(&["o1".to_string()]).await;
    assert!(result.is_err());
    assert_eq!(sf.session().epoch(Family::Orders), 0);
  }

  #[tokio::test]
  async fn test_infinite_list_loads_pages_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/mobile/orders"))
      .and(query_param("page", "1"))
      .respond_with(ResponseTemplate::new(200).set_body_json(orders_page(&["o1", "o2"], 1, 2)))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/mobile/orders"))
      .and(query_param("page", "2"))
      .respond_with(ResponseTemplate::new(200).set_body_json(orders_page(&["o3"], 2, 2)))
      .expect(1)
      .mount(&server)
      .await;

    let sf = storefront_for(&server);
    let list = sf.orders().infinite(&OrdersListParams {
      page: Some(7),
      ..Default::default()
    });
    list.fetch().await.unwrap();
    assert!(list.fetch_next_page().await.unwrap());
    assert!(!list.fetch_next_page().await.unwrap());

    let ids: Vec<String> = list.items().into_iter().map(|o| o.id).collect();
    assert_eq!(ids, vec!["o1", "o2", "o3"]);
  }
}
