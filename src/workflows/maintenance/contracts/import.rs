use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use super::domain::{
    ContractId, EquipmentId, MaintenanceContract, MaintenanceFrequency, MaintenanceType,
    MaintenanceTypeId,
};
use crate::workflows::maintenance::identity::{ClientId, UserId};

#[derive(Debug)]
pub enum ContractImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidDate {
        contract: String,
        field: &'static str,
        value: String,
    },
}

impl std::fmt::Display for ContractImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContractImportError::Io(err) => write!(f, "failed to read contract export: {}", err),
            ContractImportError::Csv(err) => write!(f, "invalid contract CSV data: {}", err),
            ContractImportError::InvalidDate {
                contract,
                field,
                value,
            } => write!(
                f,
                "contract {} has an invalid {} '{}' (expected YYYY-MM-DD)",
                contract, field, value
            ),
        }
    }
}

impl std::error::Error for ContractImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ContractImportError::Io(err) => Some(err),
            ContractImportError::Csv(err) => Some(err),
            ContractImportError::InvalidDate { .. } => None,
        }
    }
}

impl From<std::io::Error> for ContractImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ContractImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Loads contracts from the back-office CSV export.
pub struct ContractCsvImporter;

impl ContractCsvImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<Vec<MaintenanceContract>, ContractImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<MaintenanceContract>, ContractImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut contracts = Vec::new();
        for row in csv_reader.deserialize::<ContractRow>() {
            contracts.push(row?.into_contract()?);
        }

        Ok(contracts)
    }
}

/// Loads the maintenance type catalog (`id,name,color,description,default_frequency`).
pub struct MaintenanceTypeCsvImporter;

impl MaintenanceTypeCsvImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<MaintenanceType>, ContractImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<MaintenanceType>, ContractImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut types = Vec::new();
        for row in csv_reader.deserialize::<MaintenanceTypeRow>() {
            let row = row?;
            types.push(MaintenanceType {
                id: MaintenanceTypeId(row.id),
                name: row.name,
                color: row.color,
                description: row.description,
                default_frequency: row.default_frequency,
            });
        }

        Ok(types)
    }
}

#[derive(Debug, Deserialize)]
struct MaintenanceTypeRow {
    id: String,
    name: String,
    color: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    description: Option<String>,
    default_frequency: MaintenanceFrequency,
}

#[derive(Debug, Deserialize)]
struct ContractRow {
    id: String,
    client_id: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    equipment_id: Option<String>,
    title: String,
    frequency: MaintenanceFrequency,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    last_completed_date: Option<String>,
    next_due_date: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    maintenance_type_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    requested_by: Option<String>,
}

impl ContractRow {
    fn into_contract(self) -> Result<MaintenanceContract, ContractImportError> {
        let next_due_date = parse_date(&self.id, "next_due_date", &self.next_due_date)?;
        let last_completed_date = self
            .last_completed_date
            .as_deref()
            .map(|value| parse_date(&self.id, "last_completed_date", value))
            .transpose()?;

        Ok(MaintenanceContract {
            id: ContractId(self.id),
            client_id: ClientId(self.client_id),
            equipment_id: self.equipment_id.map(EquipmentId),
            title: self.title,
            frequency: self.frequency,
            last_completed_date,
            next_due_date,
            maintenance_type_id: self.maintenance_type_id.map(MaintenanceTypeId),
            requested_by: self.requested_by.map(UserId),
        })
    }
}

fn parse_date(
    contract: &str,
    field: &'static str,
    value: &str,
) -> Result<NaiveDate, ContractImportError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ContractImportError::InvalidDate {
            contract: contract.to_string(),
            field,
            value: value.to_string(),
        }
    })
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
