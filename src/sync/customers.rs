use tracing::{debug, warn};

use super::{stale, Storefront};
use crate::api::params::CustomersListParams;
use crate::api::types::{
  Ack, CreditRequest, CreditResponse, Customer, CustomerDetail, CustomerUpdate,
  CustomerUpdateResponse, CustomersPage, CustomersStats,
};
use crate::cache::{Family, InfiniteQuery, Operation, Query, QueryKey, QueryOptions};
use crate::error::ApiError;

/// Customer reads and writes.
pub struct Customers<'a> {
  sf: &'a Storefront,
}

impl<'a> Customers<'a> {
  pub(super) fn new(sf: &'a Storefront) -> Self {
    Self { sf }
  }

  pub fn list_key(params: &CustomersListParams) -> QueryKey {
    QueryKey::new(Family::Customers, Operation::List).with_params(params)
  }

  pub fn infinite_key(params: &CustomersListParams) -> QueryKey {
    QueryKey::new(Family::Customers, Operation::Infinite).with_params(params)
  }

  pub fn detail_key(customer_id: &str) -> QueryKey {
    QueryKey::new(Family::Customers, Operation::Detail(customer_id.to_string()))
  }

  pub fn stats_key() -> QueryKey {
    QueryKey::new(Family::Customers, Operation::Stats)
  }

  pub async fn list(&self, params: &CustomersListParams) -> Result<CustomersPage, ApiError> {
    let key = self.sf.queries.with_epoch(Self::list_key(params));
    let api = self.sf.api.clone();
    let params = params.clone();
    let result = self
      .sf
      .queries
      .fetch(&key, stale::LIST, false, move || {
        let api = api.clone();
        let params = params.clone();
        async move { api.get_customers(&params).await }
      })
      .await?;
    Ok(result.data)
  }

  pub fn list_query(&self, params: &CustomersListParams) -> Query<CustomersPage> {
    let api = self.sf.api.clone();
    let request = params.clone();
    Query::new(
      self.sf.queries.clone(),
      Self::list_key(params),
      QueryOptions::stale_after(stale::LIST),
      move || {
        let api = api.clone();
        let params = request.clone();
        async move { api.get_customers(&params).await }
      },
    )
    .epoch_bound()
  }

  pub fn infinite(&self, params: &CustomersListParams) -> InfiniteQuery<Customer, serde_json::Value> {
    let mut base = params.clone();
    base.page = None;
    let key = Self::infinite_key(&base);
    let api = self.sf.api.clone();
    InfiniteQuery::new(self.sf.queries.clone(), key, stale::LIST, move |page| {
      let api = api.clone();
      let mut params = base.clone();
      params.page = Some(page);
      async move { api.get_customers(&params).await }
    })
  }

  pub async fn detail(&self, customer_id: &str) -> Result<CustomerDetail, ApiError> {
    let key = Self::detail_key(customer_id);
    let api = self.sf.api.clone();
    let id = customer_id.to_string();
    let result = self
      .sf
      .queries
      .fetch(&key, stale::CUSTOMER_DETAIL, false, move || {
        let api = api.clone();
        let id = id.clone();
        async move { api.get_customer(&id).await }
      })
      .await?;
    Ok(result.data)
  }

  pub fn detail_query(&self, customer_id: &str) -> Query<CustomerDetail> {
    let api = self.sf.api.clone();
    let id = customer_id.to_string();
    Query::new(
      self.sf.queries.clone(),
      Self::detail_key(customer_id),
      QueryOptions::stale_after(stale::CUSTOMER_DETAIL).enabled(!customer_id.is_empty()),
      move || {
        let api = api.clone();
        let id = id.clone();
        async move { api.get_customer(&id).await }
      },
    )
  }

  pub async fn stats(&self) -> Result<CustomersStats, ApiError> {
    let key = self.sf.queries.with_epoch(Self::stats_key());
    let api = self.sf.api.clone();
    let result = self
      .sf
      .queries
      .fetch(&key, stale::STATS, false, move || {
        let api = api.clone();
        async move { api.get_customers_stats().await }
      })
      .await?;
    Ok(result.data)
  }

  pub fn stats_query(&self) -> Query<CustomersStats> {
    let api = self.sf.api.clone();
    Query::new(
      self.sf.queries.clone(),
      Self::stats_key(),
      QueryOptions::stale_after(stale::STATS),
      move || {
        let api = api.clone();
        async move { api.get_customers_stats().await }
      },
    )
    .epoch_bound()
  }

  pub async fn update(
    &self,
    customer_id: &str,
    update: &CustomerUpdate,
  ) -> Result<CustomerUpdateResponse, ApiError> {
    let api = &self.sf.api;
    self
      .sf
      .queries
      .mutate_optimistic(
        &Self::detail_key(customer_id),
        |detail: &mut CustomerDetail| update.apply_to(&mut detail.customer),
        move || api.update_customer(customer_id, update),
        |response: &CustomerUpdateResponse, detail: &mut CustomerDetail| {
          if let Some(customer) = &response.customer {
            detail.customer = customer.clone();
          }
        },
      )
      .await
  }

  /// Add store credit. The cached balance takes the server's figure, then
  /// the detail refetches for the new ledger entry.
  pub async fn add_credit(
    &self,
    customer_id: &str,
    request: &CreditRequest,
  ) -> Result<CreditResponse, ApiError> {
    let api = &self.sf.api;
    let response = self
      .sf
      .queries
      .mutate(move || api.add_customer_credit(customer_id, request))
      .await?;

    let key = Self::detail_key(customer_id);
    if let Some(balance) = &response.customer {
      let credit_balance = balance.credit_balance;
      match self
        .sf
        .queries
        .cache()
        .update(&key, |detail: &mut CustomerDetail| {
          detail.customer.credit_balance = credit_balance
        }) {
        Ok(patched) => debug!(customer = %customer_id, patched, "credit balance updated"),
        Err(e) => warn!(customer = %customer_id, error = %e, "could not patch credit balance"),
      }
    }
    self.sf.queries.cache().invalidate(&key);
    Ok(response)
  }

  pub async fn add_note(&self, customer_id: &str, note: &str) -> Result<Ack, ApiError> {
    let api = &self.sf.api;
    let response = self
      .sf
      .queries
      .mutate(move || api.add_customer_note(customer_id, note))
      .await?;
    self
      .sf
      .queries
      .cache()
      .invalidate(&Self::detail_key(customer_id));
    Ok(response)
  }
}
