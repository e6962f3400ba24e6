pub mod aggregate;
pub mod options;

pub use aggregate::{build_cap_table, CapTableOutput, CapTableRow, ClassAllocation};
pub use options::{build_options_cap_table, OptionsCapTableOutput, OptionsCapTableRow};

use crate::model::{Employee, EquityGrant, Series, StockClass};
use crate::{EquityError, EquityResult};

/// Resolved references for one grant row.
pub(crate) struct GrantJoin<'a> {
    pub employee: &'a Employee,
    pub stock_class: &'a StockClass,
    pub series: &'a Series,
}

/// Join a grant to its employee, stock class, and series. Dangling
/// references mean corrupted input, not an empty report.
pub(crate) fn join_grant<'a>(
    grant: &EquityGrant,
    series: &'a [Series],
    classes: &'a [StockClass],
    employees: &'a [Employee],
) -> EquityResult<GrantJoin<'a>> {
    let employee = employees
        .iter()
        .find(|e| e.unique_id == grant.employee_id)
        .ok_or_else(|| EquityError::NotFound {
            entity: format!("employee {}", grant.employee_id),
        })?;
    let stock_class = classes
        .iter()
        .find(|c| c.id == grant.stock_class_id)
        .ok_or_else(|| EquityError::NotFound {
            entity: format!("stock class {}", grant.stock_class_id),
        })?;
    let series = series
        .iter()
        .find(|s| s.id == stock_class.series_id)
        .ok_or_else(|| EquityError::NotFound {
            entity: format!("series {}", stock_class.series_id),
        })?;
    Ok(GrantJoin { employee, stock_class, series })
}
