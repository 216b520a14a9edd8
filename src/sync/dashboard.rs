use super::{stale, Storefront};
use crate::api::params::{SalesReportParams, SummaryParams, TopProductsParams};
use crate::api::types::{DashboardSummary, SalesReport, TopProduct};
use crate::cache::{Family, Operation, Query, QueryKey, QueryOptions};
use crate::error::ApiError;

/// Analytics reads. All of them follow the dashboard refresh epoch.
pub struct Dashboard<'a> {
  sf: &'a Storefront,
}

impl<'a> Dashboard<'a> {
  pub(super) fn new(sf: &'a Storefront) -> Self {
    Self { sf }
  }

  pub fn summary_key(params: &SummaryParams) -> QueryKey {
    QueryKey::new(Family::Dashboard, Operation::Summary).with_params(params)
  }

  pub fn top_products_key(params: &TopProductsParams) -> QueryKey {
    QueryKey::new(Family::Dashboard, Operation::TopProducts).with_params(params)
  }

  pub fn sales_report_key(params: &SalesReportParams) -> QueryKey {
    QueryKey::new(Family::Dashboard, Operation::SalesReport).with_params(params)
  }

  pub async fn summary(&self, params: &SummaryParams) -> Result<DashboardSummary, ApiError> {
    let key = self.sf.queries.with_epoch(Self::summary_key(params));
    let api = self.sf.api.clone();
    let params = params.clone();
    let result = self
      .sf
      .queries
      .fetch(&key, stale::DASHBOARD, false, move || {
        let api = api.clone();
        let params = params.clone();
        async move { api.get_dashboard_summary(&params).await }
      })
      .await?;
    Ok(result.data)
  }

  /// Summary query that also refetches on a fixed interval.
  pub fn summary_query(&self, params: &SummaryParams) -> Query<DashboardSummary> {
    let api = self.sf.api.clone();
    let request = params.clone();
    Query::new(
      self.sf.queries.clone(),
      Self::summary_key(params),
      QueryOptions::stale_after(stale::DASHBOARD).refetch_every(stale::DASHBOARD_REFETCH),
      move || {
        let api = api.clone();
        let params = request.clone();
        async move { api.get_dashboard_summary(&params).await }
      },
    )
    .epoch_bound()
  }

  pub async fn top_products(
    &self,
    params: &TopProductsParams,
  ) -> Result<Vec<TopProduct>, ApiError> {
    let key = self.sf.queries.with_epoch(Self::top_products_key(params));
    let api = self.sf.api.clone();
    let params = params.clone();
    let result = self
      .sf
      .queries
      .fetch(&key, stale::REPORTS, false, move || {
        let api = api.clone();
        let params = params.clone();
        async move { api.get_top_products(&params).await }
      })
      .await?;
    Ok(result.data)
  }

  pub async fn sales_report(&self, params: &SalesReportParams) -> Result<SalesReport, ApiError> {
    let key = self.sf.queries.with_epoch(Self::sales_report_key(params));
    let api = self.sf.api.clone();
    let params = params.clone();
    let result = self
      .sf
      .queries
      .fetch(&key, stale::REPORTS, false, move || {
        let api = api.clone();
        let params = params.clone();
        async move { api.get_sales_report(&params).await }
      })
      .await?;
    Ok(result.data)
  }
}
