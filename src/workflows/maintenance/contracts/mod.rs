//! Recurring maintenance contracts and the classified dashboard built from them.

pub mod domain;
mod import;
pub mod registry;
pub mod router;

pub use domain::{
    ContractId, EquipmentId, MaintenanceContract, MaintenanceFrequency, MaintenanceType,
    MaintenanceTypeId,
};
pub use import::{ContractCsvImporter, ContractImportError, MaintenanceTypeCsvImporter};
pub use registry::{
    ContractDashboardEntry, ContractRegistry, ContractRepository, ReminderDue, UrgencySummary,
};
pub use router::{contract_router, contract_router_with_clock};
