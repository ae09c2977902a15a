use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::workflows::maintenance::identity::{ClientId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContractId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaintenanceTypeId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EquipmentId(pub String);

/// Recurrence of a maintenance obligation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceFrequency {
    Monthly,
    Bimonthly,
    Quarterly,
    Semiannual,
    Annual,
}

impl MaintenanceFrequency {
    pub const fn months(self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::Bimonthly => 2,
            Self::Quarterly => 3,
            Self::Semiannual => 6,
            Self::Annual => 12,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Monthly => "Monthly",
            Self::Bimonthly => "Every 2 months",
            Self::Quarterly => "Quarterly",
            Self::Semiannual => "Every 6 months",
            Self::Annual => "Annual",
        }
    }
}

/// Catalog entry maintained by staff; read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceType {
    pub id: MaintenanceTypeId,
    pub name: String,
    pub color: String,
    pub description: Option<String>,
    pub default_frequency: MaintenanceFrequency,
}

/// Recurring obligation for one client, optionally tied to a single equipment asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceContract {
    pub id: ContractId,
    pub client_id: ClientId,
    pub equipment_id: Option<EquipmentId>,
    pub title: String,
    pub frequency: MaintenanceFrequency,
    pub last_completed_date: Option<NaiveDate>,
    pub next_due_date: NaiveDate,
    pub maintenance_type_id: Option<MaintenanceTypeId>,
    pub requested_by: Option<UserId>,
}

impl MaintenanceContract {
    /// Due date implied by the last completed visit. The stored `next_due_date` is advanced
    /// by the scheduling back office and stays authoritative.
    pub fn projected_next_due(&self) -> Option<NaiveDate> {
        self.last_completed_date
            .and_then(|completed| completed.checked_add_months(Months::new(self.frequency.months())))
    }
}
