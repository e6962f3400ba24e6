//! Grant data store.
//!
//! The engine computes over stored state plus an as-of date; the store is
//! the only stateful collaborator. [`EquityStore`] defines the contract,
//! [`MemoryStore`] is the bundled implementation. Every lookup is scoped by
//! company: referencing another company's rows reports [`NotFound`], never a
//! permission error, so foreign ids are indistinguishable from absent ones.
//!
//! [`NotFound`]: crate::EquityError::NotFound

pub mod memory;

pub use memory::MemoryStore;

use serde::{Deserialize, Serialize};

use crate::model::{
    Company, CompanyDraft, Employee, EquityGrant, GrantDraft, Series, ShareType, StockClass,
};
use crate::types::{CompanyId, GrantId, SeriesId, ShareCount, StockClassId};
use crate::EquityResult;

/// Rows removed by a cascading delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeSummary {
    pub classes_deleted: usize,
    pub grants_deleted: usize,
}

/// Company-scoped CRUD over the equity data model.
///
/// Mutations that consume capacity (stock-class sizing against the company
/// cap, grants against class headroom) must validate and write atomically:
/// two concurrent writers may not both pass a capacity check computed from
/// the same snapshot.
pub trait EquityStore {
    // companies
    fn create_company(&self, draft: &CompanyDraft) -> EquityResult<Company>;
    fn company(&self, company_id: CompanyId) -> EquityResult<Company>;

    // employees
    fn register_employee(
        &self,
        company_id: CompanyId,
        unique_id: &str,
        name: &str,
    ) -> EquityResult<Employee>;
    fn employee(&self, company_id: CompanyId, unique_id: &str) -> EquityResult<Employee>;
    fn employees(&self, company_id: CompanyId) -> EquityResult<Vec<Employee>>;

    // series
    fn create_series(
        &self,
        company_id: CompanyId,
        name: &str,
        share_type: ShareType,
    ) -> EquityResult<Series>;
    fn series(&self, company_id: CompanyId, series_id: SeriesId) -> EquityResult<Series>;
    fn list_series(&self, company_id: CompanyId) -> EquityResult<Vec<Series>>;
    /// Deletes the series and everything under it: its stock classes and
    /// their grants.
    fn delete_series(
        &self,
        company_id: CompanyId,
        series_id: SeriesId,
    ) -> EquityResult<CascadeSummary>;

    // stock classes
    fn create_stock_class(
        &self,
        company_id: CompanyId,
        series_id: SeriesId,
        name: &str,
        total_class_shares: ShareCount,
    ) -> EquityResult<StockClass>;
    /// Resizes the class. Re-runs the company-cap check with this class
    /// excluded from the existing-allocation sum.
    fn update_stock_class(
        &self,
        company_id: CompanyId,
        class_id: StockClassId,
        total_class_shares: ShareCount,
    ) -> EquityResult<StockClass>;
    fn stock_class(&self, company_id: CompanyId, class_id: StockClassId)
        -> EquityResult<StockClass>;
    fn stock_classes(&self, company_id: CompanyId) -> EquityResult<Vec<StockClass>>;
    fn delete_stock_class(
        &self,
        company_id: CompanyId,
        class_id: StockClassId,
    ) -> EquityResult<CascadeSummary>;

    // grants
    fn create_grant(&self, company_id: CompanyId, draft: &GrantDraft) -> EquityResult<EquityGrant>;
    /// Replaces the grant from a fresh draft. Headroom is re-checked with the
    /// existing grant excluded from the allocated sum.
    fn update_grant(
        &self,
        company_id: CompanyId,
        grant_id: GrantId,
        draft: &GrantDraft,
    ) -> EquityResult<EquityGrant>;
    fn grant(&self, company_id: CompanyId, grant_id: GrantId) -> EquityResult<EquityGrant>;
    fn grants(&self, company_id: CompanyId) -> EquityResult<Vec<EquityGrant>>;
    fn grants_for_employee(
        &self,
        company_id: CompanyId,
        unique_id: &str,
    ) -> EquityResult<Vec<EquityGrant>>;
    fn delete_grant(&self, company_id: CompanyId, grant_id: GrantId) -> EquityResult<()>;
    /// Removes every grant held by the employee, returning how many were
    /// deleted.
    fn delete_grants_for_employee(
        &self,
        company_id: CompanyId,
        unique_id: &str,
    ) -> EquityResult<usize>;
}
