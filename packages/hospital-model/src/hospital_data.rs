use crate::{Collection, Entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BloodBankEntry {
    pub blood_group: String,
    pub units: u32,
    pub status: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct HospitalStats {
    pub total_patients: u64,
    pub today_appointments: u64,
    pub active_doctors: u64,
    pub emergency_cases: u64,
    pub total_revenue: f64,
    pub pending_invoices: u64,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct AppointmentsPerDay {
    pub date: String,
    pub count: u64,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct MonthlyRevenue {
    pub month: String,
    pub amount: f64,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct PatientGrowth {
    pub month: String,
    pub total: u64,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct SpecialtyShare {
    pub name: String,
    pub value: u64,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct HospitalAnalytics {
    pub appointments_per_day: Vec<AppointmentsPerDay>,
    pub revenue_monthly: Vec<MonthlyRevenue>,
    pub patient_growth: Vec<PatientGrowth>,
    pub specialty_distribution: Vec<SpecialtyShare>,
}

///
/// Singleton aggregate of blood bank inventory, headline stats and chart
/// series. Seeded with `HospitalData::seed` on first read.
///
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HospitalData {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,

    #[serde(default)]
    pub blood_bank: Vec<BloodBankEntry>,

    #[serde(default)]
    pub stats: HospitalStats,

    #[serde(default)]
    pub analytics: HospitalAnalytics,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl HospitalData {
    pub fn seed() -> Self {
        let blood_bank = [
            ("A+", 45, "Available"),
            ("A-", 12, "Low"),
            ("B+", 38, "Available"),
            ("B-", 8, "Critical"),
            ("O+", 52, "Available"),
            ("O-", 15, "Low"),
            ("AB+", 22, "Available"),
            ("AB-", 6, "Critical"),
        ]
        .into_iter()
        .map(|(blood_group, units, status)| BloodBankEntry {
            blood_group: blood_group.to_string(),
            units,
            status: status.to_string(),
        })
        .collect();

        let appointments_per_day = [
            ("2025-12-01", 8),
            ("2025-12-02", 15),
            ("2025-12-03", 12),
            ("2025-12-04", 18),
            ("2025-12-05", 22),
            ("2025-12-06", 10),
            ("2025-12-07", 7),
        ]
        .into_iter()
        .map(|(date, count)| AppointmentsPerDay {
            date: date.to_string(),
            count,
        })
        .collect();

        let revenue_monthly = [
            ("Jul", 32000.0),
            ("Aug", 35000.0),
            ("Sep", 28000.0),
            ("Oct", 42000.0),
            ("Nov", 38000.0),
            ("Dec", 45000.0),
        ]
        .into_iter()
        .map(|(month, amount)| MonthlyRevenue {
            month: month.to_string(),
            amount,
        })
        .collect();

        let patient_growth = [
            ("Jul", 180),
            ("Aug", 195),
            ("Sep", 210),
            ("Oct", 230),
            ("Nov", 240),
            ("Dec", 248),
        ]
        .into_iter()
        .map(|(month, total)| PatientGrowth {
            month: month.to_string(),
            total,
        })
        .collect();

        let specialty_distribution = [
            ("Cardiology", 35),
            ("Pediatrics", 25),
            ("Surgery", 20),
            ("General", 40),
            ("Neurology", 15),
        ]
        .into_iter()
        .map(|(name, value)| SpecialtyShare {
            name: name.to_string(),
            value,
        })
        .collect();

        HospitalData {
            id: None,
            blood_bank,
            stats: HospitalStats {
                total_patients: 248,
                today_appointments: 12,
                active_doctors: 50,
                emergency_cases: 3,
                total_revenue: 45200.0,
                pending_invoices: 18,
            },
            analytics: HospitalAnalytics {
                appointments_per_day,
                revenue_monthly,
                patient_growth,
                specialty_distribution,
            },
            created_at: None,
            updated_at: None,
        }
    }
}

impl Entity for HospitalData {
    const COLLECTION: Collection = Collection::HospitalData;

    fn id(&self) -> Option<Uuid> {
        self.id
    }
}
