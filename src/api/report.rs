use crate::config::AppConfig;
use crate::error::AppError;
use crate::infra::InMemoryContractStore;
use crate::workflows::maintenance::contracts::{
    ContractCsvImporter, ContractDashboardEntry, ContractRegistry, MaintenanceTypeCsvImporter,
    ReminderDue, UrgencySummary,
};
use crate::workflows::maintenance::clock::{Clock, SystemClock};
use crate::workflows::maintenance::identity::ClientId;
use crate::workflows::maintenance::urgency::UrgencyTier;
use chrono::NaiveDate;
use clap::Args;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ContractReportArgs {
    /// Contract export (CSV) to classify
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Maintenance type catalog (CSV); falls back to APP_MAINTENANCE_TYPES_CSV
    #[arg(long)]
    pub(crate) types: Option<PathBuf>,
    /// Client whose contracts are reported
    #[arg(long)]
    pub(crate) client: String,
    /// Evaluation date (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Also list contracts that hit a reminder mark today
    #[arg(long)]
    pub(crate) reminders: bool,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn run_contract_report(args: ContractReportArgs) -> Result<(), AppError> {
    let ContractReportArgs {
        csv,
        types,
        client,
        today,
        reminders,
    } = args;

    let config = AppConfig::load()?;
    let today = today.unwrap_or_else(|| SystemClock.today());
    let contracts = ContractCsvImporter::from_path(&csv)?;
    let types = match types.or(config.maintenance.maintenance_types_csv) {
        Some(path) => MaintenanceTypeCsvImporter::from_path(path)?,
        None => Vec::new(),
    };
    let store = InMemoryContractStore::new(contracts, types);
    let registry = ContractRegistry::new(Arc::new(store), config.maintenance.reminder_marks);

    let client_id = ClientId(client);
    let entries = registry.dashboard(&client_id, today)?;
    let summary = registry.summary(&client_id, today)?;
    let due = if reminders {
        Some(registry.reminders_due(&client_id, today)?)
    } else {
        None
    };

    print!(
        "{}",
        render_contract_report(&client_id, today, &entries, &summary, due.as_deref())
    );
    Ok(())
}

pub(crate) fn render_contract_report(
    client_id: &ClientId,
    today: NaiveDate,
    entries: &[ContractDashboardEntry],
    summary: &UrgencySummary,
    reminders: Option<&[ReminderDue]>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Maintenance contracts for {client_id} (evaluated {today})");

    let _ = writeln!(out, "\nUrgency summary");
    for tier in UrgencyTier::ordered() {
        let _ = writeln!(out, "- {}: {}", tier.label(), summary.count(tier));
    }

    if entries.is_empty() {
        let _ = writeln!(out, "\nContracts: none");
    } else {
        let _ = writeln!(out, "\nContracts by urgency");
        for entry in entries {
            let _ = write!(out, "- [{}] {}", entry.tier_label, entry.title);
            if let Some(kind) = &entry.maintenance_type {
                let _ = write!(out, " ({kind})");
            }
            let _ = writeln!(
                out,
                " | {} | due {} | {}",
                entry.frequency_label, entry.next_due_date, entry.urgency_label
            );
        }
    }

    if let Some(reminders) = reminders {
        if reminders.is_empty() {
            let _ = writeln!(out, "\nReminders due today: none");
        } else {
            let _ = writeln!(out, "\nReminders due today");
            for reminder in reminders {
                let _ = writeln!(
                    out,
                    "- {} ({} days before {})",
                    reminder.title, reminder.days_before_due, reminder.next_due_date
                );
            }
        }
    }

    out
}
