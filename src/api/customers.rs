use serde_json::json;

use super::client::ApiClient;
use super::params::{with_query, CustomersListParams};
use super::segment;
use super::types::{
  Ack, CreditRequest, CreditResponse, CustomerDetail, CustomerUpdate, CustomerUpdateResponse,
  CustomersPage, CustomersStats,
};
use crate::error::ApiError;

impl ApiClient {
  pub async fn get_customers(
    &self,
    params: &CustomersListParams,
  ) -> Result<CustomersPage, ApiError> {
    self.get(&with_query("/mobile/customers", params)).await
  }

  /// Customer with order history and credit ledger.
  pub async fn get_customer(&self, customer_id: &str) -> Result<CustomerDetail, ApiError> {
    self
      .get(&format!("/mobile/customers/{}", segment(customer_id)))
      .await
  }

  pub async fn update_customer(
    &self,
    customer_id: &str,
    update: &CustomerUpdate,
  ) -> Result<CustomerUpdateResponse, ApiError> {
    self
      .patch(&format!("/mobile/customers/{}", segment(customer_id)), update)
      .await
  }

  pub async fn add_customer_credit(
    &self,
    customer_id: &str,
    request: &CreditRequest,
  ) -> Result<CreditResponse, ApiError> {
    self
      .post(
        &format!("/mobile/customers/{}/credit", segment(customer_id)),
        request,
      )
      .await
  }

  pub async fn add_customer_note(&self, customer_id: &str, note: &str) -> Result<Ack, ApiError> {
    self
      .post(
        &format!("/mobile/customers/{}/notes", segment(customer_id)),
        &json!({ "note": note }),
      )
      .await
  }

  pub async fn get_customers_stats(&self) -> Result<CustomersStats, ApiError> {
    self.get("/mobile/customers/stats").await
  }
}
