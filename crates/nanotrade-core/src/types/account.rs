//! Accounts, businesses, shops and staff.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::roles::UserRole;

// =============================================================================
// Record Status
// =============================================================================

/// Active/inactive flag shared by users, shops and warehouses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    #[default]
    Active,
    Inactive,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Active => "active",
            RecordStatus::Inactive => "inactive",
        }
    }
}

// =============================================================================
// Location
// =============================================================================

/// Country reference inside a [`Location`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Country {
    pub name: String,
    /// ISO 3166-1 alpha-2 code ("CM").
    pub code: String,
}

impl Default for Country {
    fn default() -> Self {
        Country {
            name: "Cameroon".to_string(),
            code: "CM".to_string(),
        }
    }
}

/// Where a user lives. Stored as JSON on the user row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[ts(export)]
pub struct Location {
    pub address: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Country,
}

// =============================================================================
// User
// =============================================================================

/// A person who can sign in.
///
/// `password_hash` never leaves the server: it is skipped on serialization
/// and omitted from the TypeScript bindings.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    pub is_staff: bool,
    pub role: UserRole,
    pub profile_image: Option<String>,
    pub phone_number: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub location: Location,
    pub status: RecordStatus,
    #[ts(as = "Option<String>")]
    pub last_login: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Inactive users cannot sign in.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == RecordStatus::Active
    }
}

// =============================================================================
// Business Information
// =============================================================================

/// Postal address of a business or shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[ts(export)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
}

/// How to reach a business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[ts(export)]
pub struct BusinessContact {
    pub phone: String,
    pub email: String,
    pub website: Option<String>,
}

/// Legal and commercial profile of a shop owner's business.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct BusinessInformation {
    pub id: String,
    pub owner_id: String,
    pub full_business_name: String,
    pub business_type: String,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub address: Address,
    pub number_of_employees: i64,
    pub tax_id_number: String,
    pub shop_logo: Option<String>,
    pub taxation_documents: Option<String>,
    pub national_id_card: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub contact_info: BusinessContact,
    pub legal_structure: String,
    pub year_established: i64,
    pub industry_category: String,
    pub annual_revenue_cents: Option<i64>,
    pub business_description: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Shop
// =============================================================================

/// Physical location of a shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[ts(export)]
pub struct ShopLocation {
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
}

/// Phone and email shown for a shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[ts(export)]
pub struct ShopContact {
    pub phone: String,
    pub email: String,
}

/// Opening hours per weekday, free text such as `"08:00-18:00"` or `"closed"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OperatingHours {
    pub monday: String,
    pub tuesday: String,
    pub wednesday: String,
    pub thursday: String,
    pub friday: String,
    pub saturday: String,
    pub sunday: String,
}

impl Default for OperatingHours {
    fn default() -> Self {
        let weekday = "08:00-18:00".to_string();
        OperatingHours {
            monday: weekday.clone(),
            tuesday: weekday.clone(),
            wednesday: weekday.clone(),
            thursday: weekday.clone(),
            friday: weekday,
            saturday: "09:00-14:00".to_string(),
            sunday: "closed".to_string(),
        }
    }
}

/// A point of sale belonging to a business.
///
/// Every catalog, stock and sales record is scoped to exactly one shop.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Shop {
    pub id: String,
    pub name: String,
    pub description: String,
    pub business_id: String,
    pub owner_id: String,
    pub status: RecordStatus,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub location: ShopLocation,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub contact_info: ShopContact,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub operating_hours: OperatingHours,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Employee
// =============================================================================

/// Contract type of an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentStatus {
    FullTime,
    PartTime,
    Contract,
    Intern,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[ts(export)]
pub struct EmergencyContact {
    pub name: String,
    pub relationship: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[ts(export)]
pub struct Education {
    pub degree: String,
    pub institution: String,
    pub graduation_year: i64,
}

/// Links a user to the shop they work at.
///
/// Employment is what gives managers and sellers access to a shop they do
/// not own.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Employee {
    pub id: String,
    pub user_id: String,
    pub shop_id: String,
    pub national_id: String,
    #[ts(as = "String")]
    pub date_of_birth: NaiveDate,
    #[ts(as = "String")]
    pub hire_date: NaiveDate,
    pub employment_status: EmploymentStatus,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub emergency_contact: EmergencyContact,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub education: Education,
    pub salary_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_serialization_hides_password_hash() {
        let now = Utc::now();
        let user = User {
            id: "u1".to_string(),
            username: "amina".to_string(),
            email: "amina@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            is_staff: false,
            role: UserRole::ShopOwner,
            profile_image: None,
            phone_number: None,
            location: Location::default(),
            status: RecordStatus::Active,
            last_login: None,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"role\":\"shop_owner\""));
        assert!(json.contains("\"code\":\"CM\""));
    }

    #[test]
    fn test_operating_hours_default_closes_sunday() {
        let hours = OperatingHours::default();
        assert_eq!(hours.monday, "08:00-18:00");
        assert_eq!(hours.sunday, "closed");
    }

    #[test]
    fn test_employment_status_wire_format() {
        let json = serde_json::to_string(&EmploymentStatus::PartTime).unwrap();
        assert_eq!(json, "\"part_time\"");
    }
}
