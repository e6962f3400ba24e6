//! Company snapshot files.
//!
//! A snapshot is one company and everything granted under it, in the shape
//! the store validates: employees, series, stock classes (each naming its
//! series), and grant drafts (each naming its class and holder). Money
//! fields are strings, matching the engine's decimal serialization:
//!
//! ```yaml
//! company:
//!   name: Acme
//!   total_authorized_shares: 1000000
//!   current_share_price: "10.00"
//!   risk_free_rate: "0.05"
//!   volatility: "0.40"
//! employees:
//!   - unique_id: EMP-1
//!     name: Dana
//! series:
//!   - name: Common
//!     share_type: COMMON
//! stock_classes:
//!   - series: Common
//!     name: Class A Common
//!     total_class_shares: 600000
//! grants:
//!   - employee_id: EMP-1
//!     stock_class: Class A Common
//!     num_shares: 1200
//!     iso_shares: 1200
//!     strike_price: "2.50"
//!     grant_date: 2024-01-01
//!     vesting_start: 2024-01-01
//!     vesting_end: 2026-01-01
//! ```
//!
//! Loading replays the snapshot through [`MemoryStore`], so a file that
//! oversubscribes a class or mismatches share types fails with the same
//! errors a live store would raise.

use std::collections::HashMap;
use std::error::Error;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use equity_comp_core::model::{
    Company, CompanyDraft, Employee, EquityGrant, GrantDraft, Series, ShareType, StockClass,
};
use equity_comp_core::store::{EquityStore, MemoryStore};
use equity_comp_core::types::{GrantId, SeriesId, ShareCount, StockClassId};

use crate::input::{file, stdin};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyFixture {
    pub company: CompanyDraft,
    #[serde(default)]
    pub employees: Vec<EmployeeFixture>,
    #[serde(default)]
    pub series: Vec<SeriesFixture>,
    #[serde(default)]
    pub stock_classes: Vec<StockClassFixture>,
    #[serde(default)]
    pub grants: Vec<GrantDraft>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeFixture {
    pub unique_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesFixture {
    pub name: String,
    pub share_type: ShareType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockClassFixture {
    /// Name of the series this class belongs to.
    pub series: String,
    pub name: String,
    pub total_class_shares: ShareCount,
}

/// A snapshot replayed into a store and read back with assigned ids.
#[derive(Debug)]
pub struct LoadedCompany {
    pub company: Company,
    pub series: Vec<Series>,
    pub stock_classes: Vec<StockClass>,
    pub employees: Vec<Employee>,
    pub grants: Vec<EquityGrant>,
}

impl LoadedCompany {
    pub fn grant(&self, grant_id: GrantId) -> Result<&EquityGrant, Box<dyn Error>> {
        self.grants.iter().find(|g| g.id == grant_id).ok_or_else(|| {
            format!(
                "grant {grant_id} not found; the snapshot holds {} grants numbered from 1",
                self.grants.len()
            )
            .into()
        })
    }

    pub fn stock_class_name(&self, class_id: StockClassId) -> Result<&str, Box<dyn Error>> {
        self.stock_classes
            .iter()
            .find(|c| c.id == class_id)
            .map(|c| c.name.as_str())
            .ok_or_else(|| format!("stock class {class_id} not found in snapshot").into())
    }

    /// Joined references for one grant row.
    pub fn join(
        &self,
        grant: &EquityGrant,
    ) -> Result<(&Employee, &StockClass, &Series), Box<dyn Error>> {
        let employee = self
            .employees
            .iter()
            .find(|e| e.unique_id == grant.employee_id)
            .ok_or_else(|| format!("employee {} not found in snapshot", grant.employee_id))?;
        let stock_class = self
            .stock_classes
            .iter()
            .find(|c| c.id == grant.stock_class_id)
            .ok_or_else(|| format!("stock class {} not found in snapshot", grant.stock_class_id))?;
        let series = self
            .series
            .iter()
            .find(|s| s.id == stock_class.series_id)
            .ok_or_else(|| format!("series {} not found in snapshot", stock_class.series_id))?;
        Ok((employee, stock_class, series))
    }
}

/// Read a snapshot from `path` (or piped stdin) and replay it through a
/// store. `share_price_override` swaps the company FMV after loading, for
/// price sensitivity runs.
pub fn load(
    path: Option<&str>,
    share_price_override: Option<Decimal>,
) -> Result<LoadedCompany, Box<dyn Error>> {
    let snapshot: CompanyFixture = match path {
        Some(path) => file::read_typed(path)?,
        None => match stdin::read_stdin()? {
            Some(value) => serde_json::from_value(value)?,
            None => return Err("--input file is required (or pipe a snapshot on stdin)".into()),
        },
    };
    let mut loaded = hydrate(&snapshot)?;
    if let Some(price) = share_price_override {
        loaded.company.current_share_price = price;
    }
    Ok(loaded)
}

/// Replay a snapshot through a fresh [`MemoryStore`] and read every table
/// back. Ids are assigned in file order, starting at 1 per table.
pub fn hydrate(snapshot: &CompanyFixture) -> Result<LoadedCompany, Box<dyn Error>> {
    let store = MemoryStore::new();
    let company = store.create_company(&snapshot.company)?;
    for employee in &snapshot.employees {
        store.register_employee(company.id, &employee.unique_id, &employee.name)?;
    }
    let mut series_ids: HashMap<&str, SeriesId> = HashMap::new();
    for series in &snapshot.series {
        let created = store.create_series(company.id, &series.name, series.share_type)?;
        series_ids.insert(series.name.as_str(), created.id);
    }
    for class in &snapshot.stock_classes {
        let series_id = *series_ids.get(class.series.as_str()).ok_or_else(|| {
            format!(
                "stock class '{}' references unknown series '{}'",
                class.name, class.series
            )
        })?;
        store.create_stock_class(company.id, series_id, &class.name, class.total_class_shares)?;
    }
    for draft in &snapshot.grants {
        store.create_grant(company.id, draft)?;
    }
    Ok(LoadedCompany {
        company: store.company(company.id)?,
        series: store.list_series(company.id)?,
        stock_classes: store.stock_classes(company.id)?,
        employees: store.employees(company.id)?,
        grants: store.grants(company.id)?,
    })
}
