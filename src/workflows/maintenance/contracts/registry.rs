use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{
    ContractId, MaintenanceContract, MaintenanceFrequency, MaintenanceType, MaintenanceTypeId,
};
use crate::workflows::maintenance::identity::ClientId;
use crate::workflows::maintenance::store::RepositoryError;
use crate::workflows::maintenance::urgency::{classify, reminder_mark, Urgency, UrgencyTier};

/// Read-only port over the contract store.
pub trait ContractRepository: Send + Sync {
    fn list_by_client(&self, client_id: &ClientId)
        -> Result<Vec<MaintenanceContract>, RepositoryError>;
    fn maintenance_types(&self) -> Result<Vec<MaintenanceType>, RepositoryError>;
}

/// One classified dashboard row.
#[derive(Debug, Clone, Serialize)]
pub struct ContractDashboardEntry {
    pub contract_id: ContractId,
    pub title: String,
    pub frequency: MaintenanceFrequency,
    pub frequency_label: &'static str,
    pub last_completed_date: Option<NaiveDate>,
    pub next_due_date: NaiveDate,
    pub urgency: Urgency,
    pub tier_label: &'static str,
    pub tier_color: &'static str,
    pub urgency_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance_type_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder_mark: Option<i64>,
}

/// Tier counts for the dashboard header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UrgencySummary {
    pub overdue: usize,
    pub urgent: usize,
    pub upcoming: usize,
    pub future: usize,
}

impl UrgencySummary {
    fn record(&mut self, tier: UrgencyTier) {
        match tier {
            UrgencyTier::Overdue => self.overdue += 1,
            UrgencyTier::Urgent => self.urgent += 1,
            UrgencyTier::Upcoming => self.upcoming += 1,
            UrgencyTier::Future => self.future += 1,
        }
    }

    pub fn count(&self, tier: UrgencyTier) -> usize {
        match tier {
            UrgencyTier::Overdue => self.overdue,
            UrgencyTier::Urgent => self.urgent,
            UrgencyTier::Upcoming => self.upcoming,
            UrgencyTier::Future => self.future,
        }
    }

    pub fn total(&self) -> usize {
        self.overdue + self.urgent + self.upcoming + self.future
    }
}

/// A contract that reached one of the reminder marks on the evaluation day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderDue {
    pub contract_id: ContractId,
    pub client_id: ClientId,
    pub title: String,
    pub next_due_date: NaiveDate,
    pub days_before_due: i64,
}

/// Classifies and orders a client's contracts for the maintenance dashboard.
pub struct ContractRegistry<C> {
    repository: Arc<C>,
    reminder_marks: Vec<i64>,
}

impl<C> ContractRegistry<C>
where
    C: ContractRepository + 'static,
{
    pub fn new(repository: Arc<C>, reminder_marks: Vec<i64>) -> Self {
        Self {
            repository,
            reminder_marks,
        }
    }

    pub fn reminder_marks(&self) -> &[i64] {
        &self.reminder_marks
    }

    /// Contracts sorted most urgent first; equal offsets fall back to the contract id.
    pub fn dashboard(
        &self,
        client_id: &ClientId,
        today: NaiveDate,
    ) -> Result<Vec<ContractDashboardEntry>, RepositoryError> {
        let contracts = self.repository.list_by_client(client_id)?;
        let types: HashMap<MaintenanceTypeId, MaintenanceType> = self
            .repository
            .maintenance_types()?
            .into_iter()
            .map(|kind| (kind.id.clone(), kind))
            .collect();

        let mut entries: Vec<ContractDashboardEntry> = contracts
            .into_iter()
            .map(|contract| {
                let urgency = classify(contract.next_due_date, today);
                let kind = contract
                    .maintenance_type_id
                    .as_ref()
                    .and_then(|id| types.get(id));
                ContractDashboardEntry {
                    frequency: contract.frequency,
                    frequency_label: contract.frequency.label(),
                    last_completed_date: contract.last_completed_date,
                    next_due_date: contract.next_due_date,
                    tier_label: urgency.tier.label(),
                    tier_color: urgency.tier.color(),
                    urgency_label: urgency.label(),
                    maintenance_type: kind.map(|kind| kind.name.clone()),
                    maintenance_type_color: kind.map(|kind| kind.color.clone()),
                    reminder_mark: reminder_mark(&urgency, &self.reminder_marks),
                    urgency,
                    contract_id: contract.id,
                    title: contract.title,
                }
            })
            .collect();

        entries.sort_by(|a, b| {
            a.urgency
                .days_offset
                .cmp(&b.urgency.days_offset)
                .then_with(|| a.contract_id.cmp(&b.contract_id))
        });

        Ok(entries)
    }

    pub fn summary(
        &self,
        client_id: &ClientId,
        today: NaiveDate,
    ) -> Result<UrgencySummary, RepositoryError> {
        let mut summary = UrgencySummary::default();
        for contract in self.repository.list_by_client(client_id)? {
            summary.record(classify(contract.next_due_date, today).tier);
        }
        Ok(summary)
    }

    /// Contracts the external reminder scheduler should notify about today.
    pub fn reminders_due(
        &self,
        client_id: &ClientId,
        today: NaiveDate,
    ) -> Result<Vec<ReminderDue>, RepositoryError> {
        let mut due: Vec<ReminderDue> = self
            .repository
            .list_by_client(client_id)?
            .into_iter()
            .filter_map(|contract| {
                let urgency = classify(contract.next_due_date, today);
                reminder_mark(&urgency, &self.reminder_marks).map(|mark| ReminderDue {
                    contract_id: contract.id,
                    client_id: contract.client_id,
                    title: contract.title,
                    next_due_date: contract.next_due_date,
                    days_before_due: mark,
                })
            })
            .collect();

        due.sort_by(|a, b| {
            a.days_before_due
                .cmp(&b.days_before_due)
                .then_with(|| a.contract_id.cmp(&b.contract_id))
        });
        Ok(due)
    }
}
