//! In-memory [`EquityStore`].
//!
//! State sits behind one `RwLock`; every mutating method validates and
//! writes under a single write guard, so a capacity check can never be
//! computed from a snapshot that another writer has since invalidated.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::EquityError;
use crate::model::{
    Company, CompanyDraft, Employee, EquityGrant, GrantDraft, GrantKind, Series, ShareType,
    StockClass,
};
use crate::store::{CascadeSummary, EquityStore};
use crate::types::{CompanyId, GrantId, SeriesId, ShareCount, StockClassId};
use crate::EquityResult;

#[derive(Debug, Default)]
struct State {
    companies: BTreeMap<CompanyId, Company>,
    /// Keyed by the employee's external `unique_id`.
    employees: BTreeMap<String, Employee>,
    series: BTreeMap<SeriesId, Series>,
    classes: BTreeMap<StockClassId, StockClass>,
    grants: BTreeMap<GrantId, EquityGrant>,
    next_company_id: CompanyId,
    next_series_id: SeriesId,
    next_class_id: StockClassId,
    next_grant_id: GrantId,
}

impl State {
    fn company(&self, company_id: CompanyId) -> EquityResult<&Company> {
        self.companies
            .get(&company_id)
            .ok_or_else(|| EquityError::NotFound { entity: format!("company {company_id}") })
    }

    fn employee(&self, company_id: CompanyId, unique_id: &str) -> EquityResult<&Employee> {
        self.employees
            .get(unique_id)
            .filter(|e| e.company_id == company_id)
            .ok_or_else(|| EquityError::NotFound { entity: format!("employee {unique_id}") })
    }

    fn series(&self, company_id: CompanyId, series_id: SeriesId) -> EquityResult<&Series> {
        self.series
            .get(&series_id)
            .filter(|s| s.company_id == company_id)
            .ok_or_else(|| EquityError::NotFound { entity: format!("series {series_id}") })
    }

    fn class(&self, company_id: CompanyId, class_id: StockClassId) -> EquityResult<&StockClass> {
        self.classes
            .get(&class_id)
            .filter(|c| c.company_id == company_id)
            .ok_or_else(|| EquityError::NotFound { entity: format!("stock class {class_id}") })
    }

    fn class_by_name(&self, company_id: CompanyId, name: &str) -> EquityResult<&StockClass> {
        self.classes
            .values()
            .find(|c| c.company_id == company_id && c.name == name)
            .ok_or_else(|| EquityError::NotFound { entity: format!("stock class '{name}'") })
    }

    /// A grant belongs to whichever company owns its stock class.
    fn grant(&self, company_id: CompanyId, grant_id: GrantId) -> EquityResult<&EquityGrant> {
        self.grants
            .get(&grant_id)
            .filter(|g| self.grant_in_company(g, company_id))
            .ok_or_else(|| EquityError::NotFound { entity: format!("grant {grant_id}") })
    }

    fn grant_in_company(&self, grant: &EquityGrant, company_id: CompanyId) -> bool {
        self.classes
            .get(&grant.stock_class_id)
            .is_some_and(|c| c.company_id == company_id)
    }

    /// Sum of class sizes against the company cap. A zero cap means the
    /// company has not set one and nothing is enforced.
    fn check_company_cap(
        &self,
        company: &Company,
        new_shares: ShareCount,
        exclude: Option<StockClassId>,
    ) -> EquityResult<()> {
        let cap = company.total_authorized_shares;
        if cap == 0 {
            return Ok(());
        }
        let other_total: ShareCount = self
            .classes
            .values()
            .filter(|c| c.company_id == company.id && Some(c.id) != exclude)
            .map(|c| c.total_class_shares)
            .sum();
        if other_total + new_shares > cap {
            let remaining = cap.saturating_sub(other_total);
            return Err(EquityError::InvalidInput {
                field: "total_class_shares".into(),
                reason: format!(
                    "Allocation exceeds company Total Authorized Shares ({cap}). \
                     You can allocate at most {remaining} shares to this class."
                ),
            });
        }
        Ok(())
    }

    /// Sum of granted shares against the class size.
    fn check_class_headroom(
        &self,
        class: &StockClass,
        requested: ShareCount,
        exclude: Option<GrantId>,
    ) -> EquityResult<()> {
        let already: ShareCount = self
            .grants
            .values()
            .filter(|g| g.stock_class_id == class.id && Some(g.id) != exclude)
            .map(|g| g.num_shares())
            .sum();
        if already + requested > class.total_class_shares {
            let remaining = class.total_class_shares.saturating_sub(already);
            return Err(EquityError::InvalidInput {
                field: "num_shares".into(),
                reason: format!(
                    "Insufficient shares in class '{}'. \
                     Remaining: {remaining}; requested: {requested}.",
                    class.name
                ),
            });
        }
        Ok(())
    }
}

fn check_class_compat(class: &StockClass, kind: &GrantKind) -> EquityResult<()> {
    if class.share_type == kind.required_share_type() {
        return Ok(());
    }
    let reason = if kind.is_preferred() {
        "Preferred grants must use Preferred class/series."
    } else {
        "ISO/NQO/RSU/Common grants must use Common class/series."
    };
    Err(EquityError::InvalidInput { field: "stock_class".into(), reason: reason.into() })
}

/// Thread-safe in-memory store with auto-incrementing ids.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EquityStore for MemoryStore {
    fn create_company(&self, draft: &CompanyDraft) -> EquityResult<Company> {
        let mut state = self.state.write().unwrap();
        state.next_company_id += 1;
        let company = Company {
            id: state.next_company_id,
            name: draft.name.clone(),
            total_authorized_shares: draft.total_authorized_shares,
            current_share_price: draft.current_share_price,
            risk_free_rate: draft.risk_free_rate,
            volatility: draft.volatility,
        };
        state.companies.insert(company.id, company.clone());
        Ok(company)
    }

    fn company(&self, company_id: CompanyId) -> EquityResult<Company> {
        let state = self.state.read().unwrap();
        Ok(state.company(company_id)?.clone())
    }

    fn register_employee(
        &self,
        company_id: CompanyId,
        unique_id: &str,
        name: &str,
    ) -> EquityResult<Employee> {
        let mut state = self.state.write().unwrap();
        state.company(company_id)?;
        if state.employees.contains_key(unique_id) {
            return Err(EquityError::InvalidInput {
                field: "unique_id".into(),
                reason: format!("unique_id '{unique_id}' is already registered."),
            });
        }
        let employee = Employee {
            unique_id: unique_id.to_string(),
            name: name.to_string(),
            company_id,
        };
        state.employees.insert(unique_id.to_string(), employee.clone());
        Ok(employee)
    }

    fn employee(&self, company_id: CompanyId, unique_id: &str) -> EquityResult<Employee> {
        let state = self.state.read().unwrap();
        Ok(state.employee(company_id, unique_id)?.clone())
    }

    fn employees(&self, company_id: CompanyId) -> EquityResult<Vec<Employee>> {
        let state = self.state.read().unwrap();
        state.company(company_id)?;
        Ok(state
            .employees
            .values()
            .filter(|e| e.company_id == company_id)
            .cloned()
            .collect())
    }

    fn create_series(
        &self,
        company_id: CompanyId,
        name: &str,
        share_type: ShareType,
    ) -> EquityResult<Series> {
        let mut state = self.state.write().unwrap();
        state.company(company_id)?;
        if state
            .series
            .values()
            .any(|s| s.company_id == company_id && s.name == name)
        {
            return Err(EquityError::InvalidInput {
                field: "name".into(),
                reason: format!("Series '{name}' already exists for this company."),
            });
        }
        state.next_series_id += 1;
        let series = Series {
            id: state.next_series_id,
            company_id,
            name: name.to_string(),
            share_type,
        };
        state.series.insert(series.id, series.clone());
        Ok(series)
    }

    fn series(&self, company_id: CompanyId, series_id: SeriesId) -> EquityResult<Series> {
        let state = self.state.read().unwrap();
        Ok(state.series(company_id, series_id)?.clone())
    }

    fn list_series(&self, company_id: CompanyId) -> EquityResult<Vec<Series>> {
        let state = self.state.read().unwrap();
        state.company(company_id)?;
        let mut rows: Vec<Series> = state
            .series
            .values()
            .filter(|s| s.company_id == company_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    fn delete_series(
        &self,
        company_id: CompanyId,
        series_id: SeriesId,
    ) -> EquityResult<CascadeSummary> {
        let mut state = self.state.write().unwrap();
        state.series(company_id, series_id)?;
        let class_ids: Vec<StockClassId> = state
            .classes
            .values()
            .filter(|c| c.series_id == series_id)
            .map(|c| c.id)
            .collect();
        let grant_ids: Vec<GrantId> = state
            .grants
            .values()
            .filter(|g| class_ids.contains(&g.stock_class_id))
            .map(|g| g.id)
            .collect();
        for id in &class_ids {
            state.classes.remove(id);
        }
        for id in &grant_ids {
            state.grants.remove(id);
        }
        state.series.remove(&series_id);
        Ok(CascadeSummary {
            classes_deleted: class_ids.len(),
            grants_deleted: grant_ids.len(),
        })
    }

    fn create_stock_class(
        &self,
        company_id: CompanyId,
        series_id: SeriesId,
        name: &str,
        total_class_shares: ShareCount,
    ) -> EquityResult<StockClass> {
        let mut state = self.state.write().unwrap();
        let company = state.company(company_id)?.clone();
        let series = state.series(company_id, series_id)?.clone();
        if state
            .classes
            .values()
            .any(|c| c.company_id == company_id && c.name == name)
        {
            return Err(EquityError::InvalidInput {
                field: "name".into(),
                reason: format!("Stock class '{name}' already exists for this company."),
            });
        }
        state.check_company_cap(&company, total_class_shares, None)?;
        state.next_class_id += 1;
        let class = StockClass {
            id: state.next_class_id,
            company_id,
            series_id,
            name: name.to_string(),
            // class type always mirrors the linked series
            share_type: series.share_type,
            total_class_shares,
        };
        state.classes.insert(class.id, class.clone());
        Ok(class)
    }

    fn update_stock_class(
        &self,
        company_id: CompanyId,
        class_id: StockClassId,
        total_class_shares: ShareCount,
    ) -> EquityResult<StockClass> {
        let mut state = self.state.write().unwrap();
        let company = state.company(company_id)?.clone();
        let class = state.class(company_id, class_id)?.clone();
        state.check_company_cap(&company, total_class_shares, Some(class_id))?;
        let updated = StockClass { total_class_shares, ..class };
        state.classes.insert(class_id, updated.clone());
        Ok(updated)
    }

    fn stock_class(
        &self,
        company_id: CompanyId,
        class_id: StockClassId,
    ) -> EquityResult<StockClass> {
        let state = self.state.read().unwrap();
        Ok(state.class(company_id, class_id)?.clone())
    }

    fn stock_classes(&self, company_id: CompanyId) -> EquityResult<Vec<StockClass>> {
        let state = self.state.read().unwrap();
        state.company(company_id)?;
        let mut rows: Vec<StockClass> = state
            .classes
            .values()
            .filter(|c| c.company_id == company_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    fn delete_stock_class(
        &self,
        company_id: CompanyId,
        class_id: StockClassId,
    ) -> EquityResult<CascadeSummary> {
        let mut state = self.state.write().unwrap();
        state.class(company_id, class_id)?;
        let grant_ids: Vec<GrantId> = state
            .grants
            .values()
            .filter(|g| g.stock_class_id == class_id)
            .map(|g| g.id)
            .collect();
        for id in &grant_ids {
            state.grants.remove(id);
        }
        state.classes.remove(&class_id);
        Ok(CascadeSummary {
            classes_deleted: 1,
            grants_deleted: grant_ids.len(),
        })
    }

    fn create_grant(&self, company_id: CompanyId, draft: &GrantDraft) -> EquityResult<EquityGrant> {
        let kind = draft.validate()?;
        let mut state = self.state.write().unwrap();
        state.company(company_id)?;
        state.employee(company_id, &draft.employee_id)?;
        let class = state.class_by_name(company_id, &draft.stock_class)?.clone();
        check_class_compat(&class, &kind)?;
        state.check_class_headroom(&class, draft.num_shares, None)?;
        state.next_grant_id += 1;
        let grant = EquityGrant {
            id: state.next_grant_id,
            employee_id: draft.employee_id.clone(),
            stock_class_id: class.id,
            kind,
            grant_date: draft.grant_date,
            vesting_start: draft.vesting_start,
            vesting_end: draft.vesting_end,
            vesting_frequency: draft.vesting_frequency,
            cliff_months: draft.cliff_months,
        };
        state.grants.insert(grant.id, grant.clone());
        Ok(grant)
    }

    fn update_grant(
        &self,
        company_id: CompanyId,
        grant_id: GrantId,
        draft: &GrantDraft,
    ) -> EquityResult<EquityGrant> {
        let kind = draft.validate()?;
        let mut state = self.state.write().unwrap();
        state.grant(company_id, grant_id)?;
        state.employee(company_id, &draft.employee_id)?;
        let class = state.class_by_name(company_id, &draft.stock_class)?.clone();
        check_class_compat(&class, &kind)?;
        state.check_class_headroom(&class, draft.num_shares, Some(grant_id))?;
        let grant = EquityGrant {
            id: grant_id,
            employee_id: draft.employee_id.clone(),
            stock_class_id: class.id,
            kind,
            grant_date: draft.grant_date,
            vesting_start: draft.vesting_start,
            vesting_end: draft.vesting_end,
            vesting_frequency: draft.vesting_frequency,
            cliff_months: draft.cliff_months,
        };
        state.grants.insert(grant_id, grant.clone());
        Ok(grant)
    }

    fn grant(&self, company_id: CompanyId, grant_id: GrantId) -> EquityResult<EquityGrant> {
        let state = self.state.read().unwrap();
        Ok(state.grant(company_id, grant_id)?.clone())
    }

    fn grants(&self, company_id: CompanyId) -> EquityResult<Vec<EquityGrant>> {
        let state = self.state.read().unwrap();
        state.company(company_id)?;
        Ok(state
            .grants
            .values()
            .filter(|g| state.grant_in_company(g, company_id))
            .cloned()
            .collect())
    }

    fn grants_for_employee(
        &self,
        company_id: CompanyId,
        unique_id: &str,
    ) -> EquityResult<Vec<EquityGrant>> {
        let state = self.state.read().unwrap();
        state.employee(company_id, unique_id)?;
        Ok(state
            .grants
            .values()
            .filter(|g| g.employee_id == unique_id)
            .cloned()
            .collect())
    }

    fn delete_grant(&self, company_id: CompanyId, grant_id: GrantId) -> EquityResult<()> {
        let mut state = self.state.write().unwrap();
        state.grant(company_id, grant_id)?;
        state.grants.remove(&grant_id);
        Ok(())
    }

    fn delete_grants_for_employee(
        &self,
        company_id: CompanyId,
        unique_id: &str,
    ) -> EquityResult<usize> {
        let mut state = self.state.write().unwrap();
        state.employee(company_id, unique_id)?;
        let grant_ids: Vec<GrantId> = state
            .grants
            .values()
            .filter(|g| g.employee_id == unique_id)
            .map(|g| g.id)
            .collect();
        for id in &grant_ids {
            state.grants.remove(id);
        }
        Ok(grant_ids.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use crate::model::VestingFrequency;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn company_draft(cap: ShareCount) -> CompanyDraft {
        CompanyDraft {
            name: "Acme".into(),
            total_authorized_shares: cap,
            current_share_price: dec!(10.00),
            risk_free_rate: dec!(0.05),
            volatility: dec!(0.40),
        }
    }

    fn rsu_draft(shares: ShareCount, class: &str) -> GrantDraft {
        GrantDraft {
            employee_id: "EMP-1".into(),
            stock_class: class.into(),
            num_shares: shares,
            iso_shares: 0,
            nqo_shares: 0,
            rsu_shares: shares,
            common_shares: 0,
            preferred_shares: 0,
            strike_price: None,
            purchase_price: None,
            grant_date: d(2024, 1, 1),
            vesting_start: Some(d(2024, 1, 1)),
            vesting_end: Some(d(2026, 1, 1)),
            vesting_frequency: VestingFrequency::Monthly,
            cliff_months: 0,
        }
    }

    /// Company with one common class of 1000 shares and one employee.
    fn seeded() -> (MemoryStore, CompanyId) {
        let store = MemoryStore::new();
        let company = store.create_company(&company_draft(2_000_000)).unwrap();
        let series = store
            .create_series(company.id, "Common", ShareType::Common)
            .unwrap();
        store
            .create_stock_class(company.id, series.id, "Class A Common", 1000)
            .unwrap();
        store
            .register_employee(company.id, "EMP-1", "Dana")
            .unwrap();
        (store, company.id)
    }

    #[test]
    fn test_ids_auto_increment_from_one() {
        let (store, company_id) = seeded();
        let g1 = store.create_grant(company_id, &rsu_draft(100, "Class A Common")).unwrap();
        let g2 = store.create_grant(company_id, &rsu_draft(100, "Class A Common")).unwrap();
        assert_eq!(g1.id, 1);
        assert_eq!(g2.id, 2);
        assert_eq!(store.grants(company_id).unwrap().len(), 2);
    }

    #[test]
    fn test_class_headroom_reports_exact_remaining() {
        let (store, company_id) = seeded();
        store.create_grant(company_id, &rsu_draft(900, "Class A Common")).unwrap();
        // 1000-share class with 900 allocated leaves 100
        let err = store
            .create_grant(company_id, &rsu_draft(150, "Class A Common"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid input: num_shares — Insufficient shares in class 'Class A Common'. \
             Remaining: 100; requested: 150."
        );
    }

    #[test]
    fn test_company_cap_reports_exact_headroom() {
        let store = MemoryStore::new();
        let company = store.create_company(&company_draft(1000)).unwrap();
        let series = store
            .create_series(company.id, "Common", ShareType::Common)
            .unwrap();
        store
            .create_stock_class(company.id, series.id, "Class A", 800)
            .unwrap();
        let err = store
            .create_stock_class(company.id, series.id, "Class B", 300)
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Total Authorized Shares (1000)"), "{message}");
        assert!(message.contains("at most 200 shares"), "{message}");
    }

    #[test]
    fn test_resize_excludes_own_allocation() {
        let store = MemoryStore::new();
        let company = store.create_company(&company_draft(1000)).unwrap();
        let series = store
            .create_series(company.id, "Common", ShareType::Common)
            .unwrap();
        let class = store
            .create_stock_class(company.id, series.id, "Class A", 800)
            .unwrap();
        // growing 800 -> 1000 only works if the old 800 is not double counted
        let resized = store.update_stock_class(company.id, class.id, 1000).unwrap();
        assert_eq!(resized.total_class_shares, 1000);
        assert!(store.update_stock_class(company.id, class.id, 1001).is_err());
    }

    #[test]
    fn test_grant_update_excludes_itself_from_allocation() {
        let (store, company_id) = seeded();
        let grant = store.create_grant(company_id, &rsu_draft(900, "Class A Common")).unwrap();
        // same grant grown to the full class size; its old 900 must not count
        let updated = store
            .update_grant(company_id, grant.id, &rsu_draft(1000, "Class A Common"))
            .unwrap();
        assert_eq!(updated.num_shares(), 1000);
        assert_eq!(updated.id, grant.id);
        assert!(store
            .update_grant(company_id, grant.id, &rsu_draft(1001, "Class A Common"))
            .is_err());
    }

    #[test]
    fn test_preferred_grants_need_preferred_class() {
        let (store, company_id) = seeded();
        let mut draft = rsu_draft(100, "Class A Common");
        draft.rsu_shares = 0;
        draft.preferred_shares = 100;
        draft.purchase_price = Some(dec!(5.00));
        draft.vesting_start = None;
        draft.vesting_end = None;
        let err = store.create_grant(company_id, &draft).unwrap_err();
        assert!(err
            .to_string()
            .contains("Preferred grants must use Preferred class/series."));
    }

    #[test]
    fn test_class_type_mirrors_series() {
        let store = MemoryStore::new();
        let company = store.create_company(&company_draft(1_000_000)).unwrap();
        let series = store
            .create_series(company.id, "Series A", ShareType::Preferred)
            .unwrap();
        let class = store
            .create_stock_class(company.id, series.id, "Series A Preferred", 500)
            .unwrap();
        assert_eq!(class.share_type, ShareType::Preferred);
    }

    #[test]
    fn test_duplicate_names_rejected_per_company() {
        let (store, company_id) = seeded();
        let err = store
            .create_series(company_id, "Common", ShareType::Common)
            .unwrap_err();
        assert!(err.to_string().contains("already exists"));

        // same name in a different company is fine
        let other = store.create_company(&company_draft(1000)).unwrap();
        assert!(store
            .create_series(other.id, "Common", ShareType::Common)
            .is_ok());
    }

    #[test]
    fn test_cross_company_lookups_are_not_found() {
        let (store, company_id) = seeded();
        let grant = store.create_grant(company_id, &rsu_draft(100, "Class A Common")).unwrap();
        let other = store.create_company(&company_draft(1000)).unwrap();

        let err = store.grant(other.id, grant.id).unwrap_err();
        assert!(matches!(err, EquityError::NotFound { .. }));
        let err = store.employee(other.id, "EMP-1").unwrap_err();
        assert!(matches!(err, EquityError::NotFound { .. }));
    }

    #[test]
    fn test_series_delete_cascades_with_counts() {
        let (store, company_id) = seeded();
        store.create_grant(company_id, &rsu_draft(100, "Class A Common")).unwrap();
        store.create_grant(company_id, &rsu_draft(200, "Class A Common")).unwrap();

        let summary = store.delete_series(company_id, 1).unwrap();
        assert_eq!(summary, CascadeSummary { classes_deleted: 1, grants_deleted: 2 });
        assert!(store.stock_classes(company_id).unwrap().is_empty());
        assert!(store.grants(company_id).unwrap().is_empty());
    }

    #[test]
    fn test_bulk_delete_by_employee_counts_rows() {
        let (store, company_id) = seeded();
        store.create_grant(company_id, &rsu_draft(100, "Class A Common")).unwrap();
        store.create_grant(company_id, &rsu_draft(200, "Class A Common")).unwrap();
        assert_eq!(store.delete_grants_for_employee(company_id, "EMP-1").unwrap(), 2);
        assert!(store.grants_for_employee(company_id, "EMP-1").unwrap().is_empty());
        assert!(store
            .delete_grants_for_employee(company_id, "EMP-404")
            .is_err());
    }
}
