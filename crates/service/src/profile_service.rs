//! Self-service profile read and edit for every role.
//!
//! Account fields (`name`, `phone`) live on `app_user`; the role profile
//! holds the rest. Availability is not editable here, it belongs to the
//! request lifecycle.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use models::user::{self, Role};
use models::{customer_profile, professional};
use crate::errors::ServiceError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerDetails {
    pub address: Option<String>,
    pub pincode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfessionalDetails {
    pub service_type: String,
    pub experience: Option<String>,
    pub status: String,
    pub verified: bool,
    pub available: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professional: Option<ProfessionalDetails>,
}

/// Partial update. Absent fields are left alone; unknown fields such as
/// `email`, `role` or `available` are rejected at deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub pincode: Option<String>,
    pub service_type: Option<String>,
    pub experience: Option<String>,
}

impl ProfileUpdate {
    fn touches_account(&self) -> bool {
        self.name.is_some() || self.phone.is_some()
    }

    fn touches_customer(&self) -> bool {
        self.address.is_some() || self.pincode.is_some()
    }

    fn touches_professional(&self) -> bool {
        self.service_type.is_some() || self.experience.is_some()
    }
}

/// Reject fields that belong to another role's profile, then run the
/// per-field validators.
pub fn check_update(role: Role, update: &ProfileUpdate) -> Result<(), ServiceError> {
    if role != Role::Customer && update.touches_customer() {
        return Err(ServiceError::Validation(format!("address and pincode do not apply to {role} accounts")));
    }
    if role != Role::Professional && update.touches_professional() {
        return Err(ServiceError::Validation(format!("service_type and experience do not apply to {role} accounts")));
    }
    if let Some(name) = update.name.as_deref() {
        user::validate_name(name)?;
    }
    if let Some(pincode) = update.pincode.as_deref() {
        customer_profile::validate_pincode(pincode)?;
    }
    if let Some(t) = update.service_type.as_deref() {
        professional::validate_service_type(t)?;
    }
    Ok(())
}

fn trimmed(v: String) -> Option<String> {
    let v = v.trim();
    (!v.is_empty()).then(|| v.to_string())
}

pub async fn get_profile(db: &DatabaseConnection, user_id: Uuid) -> Result<Profile, ServiceError> {
    let u = user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("user"))?;
    let role = u.role()?;
    let customer = match role {
        Role::Customer => customer_profile::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .map(|c| CustomerDetails { address: c.address, pincode: c.pincode })
            .or(Some(CustomerDetails { address: None, pincode: None })),
        _ => None,
    };
    let professional = match role {
        Role::Professional => professional::Entity::find_by_id(user_id).one(db).await?.map(|p| ProfessionalDetails {
            service_type: p.service_type,
            experience: p.experience,
            status: p.status,
            verified: p.verified,
            available: p.available,
        }),
        _ => None,
    };
    Ok(Profile {
        id: u.id,
        email: u.email,
        name: u.name,
        phone: u.phone,
        role,
        active: u.active,
        customer,
        professional,
    })
}

/// Apply `update` to the caller's own account and role profile in one
/// transaction, then return the fresh profile.
pub async fn update_profile(db: &DatabaseConnection, user_id: Uuid, update: ProfileUpdate) -> Result<Profile, ServiceError> {
    let found = user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("user"))?;
    let role = found.role()?;
    check_update(role, &update)?;

    let txn = db.begin().await?;
    if update.touches_account() {
        let mut am: user::ActiveModel = found.into();
        if let Some(name) = update.name.clone() {
            am.name = Set(name.trim().to_string());
        }
        if let Some(phone) = update.phone.clone() {
            am.phone = Set(trimmed(phone));
        }
        am.updated_at = Set(Utc::now().into());
        am.update(&txn).await?;
    }
    if update.touches_customer() {
        match customer_profile::Entity::find_by_id(user_id).one(&txn).await? {
            Some(row) => {
                let mut am: customer_profile::ActiveModel = row.into();
                if let Some(address) = update.address.clone() {
                    am.address = Set(trimmed(address));
                }
                if let Some(pincode) = update.pincode.clone() {
                    am.pincode = Set(Some(pincode.trim().to_string()));
                }
                am.update(&txn).await?;
            }
            None => {
                customer_profile::create(&txn, user_id, update.address.as_deref(), update.pincode.as_deref()).await?;
            }
        }
    }
    if update.touches_professional() {
        let row = professional::Entity::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("professional"))?;
        let mut am: professional::ActiveModel = row.into();
        if let Some(t) = update.service_type.as_deref() {
            am.service_type = Set(professional::validate_service_type(t)?);
        }
        if let Some(experience) = update.experience.clone() {
            am.experience = Set(trimmed(experience));
        }
        am.update(&txn).await?;
    }
    txn.commit().await?;
    info!(user_id = %user_id, role = %role, "profile_updated");
    get_profile(db, user_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;

    #[test]
    fn fields_of_other_roles_are_rejected() {
        let address = ProfileUpdate { address: Some("1 Main St".into()), ..Default::default() };
        let skill = ProfileUpdate { service_type: Some("plumbing".into()), ..Default::default() };
        assert!(check_update(Role::Customer, &address).is_ok());
        assert!(matches!(check_update(Role::Professional, &address), Err(ServiceError::Validation(_))));
        assert!(matches!(check_update(Role::Admin, &address), Err(ServiceError::Validation(_))));
        assert!(check_update(Role::Professional, &skill).is_ok());
        assert!(matches!(check_update(Role::Customer, &skill), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn field_values_are_validated() {
        let bad_pin = ProfileUpdate { pincode: Some("12ab".into()), ..Default::default() };
        let blank_name = ProfileUpdate { name: Some("  ".into()), ..Default::default() };
        let blank_type = ProfileUpdate { service_type: Some(" ".into()), ..Default::default() };
        assert!(check_update(Role::Customer, &bad_pin).is_err());
        assert!(check_update(Role::Admin, &blank_name).is_err());
        assert!(check_update(Role::Professional, &blank_type).is_err());
    }

    #[test]
    fn availability_and_identity_are_not_editable() {
        for body in [r#"{"available":false}"#, r#"{"email":"x@y.z"}"#, r#"{"role":"admin"}"#] {
            assert!(serde_json::from_str::<ProfileUpdate>(body).is_err(), "{body}");
        }
        let ok: ProfileUpdate = serde_json::from_str(r#"{"phone":"555"}"#).unwrap();
        assert_eq!(ok.phone.as_deref(), Some("555"));
    }

    #[tokio::test]
    async fn customer_and_professional_profiles_round_trip() -> anyhow::Result<()> {
        let Some(db) = get_db().await else { return Ok(()) };
        let c = user::create(&db, &format!("pc_{}@example.com", Uuid::new_v4()), "Cleo", None, Role::Customer).await?;
        customer_profile::create(&db, c.id, None, None).await?;
        let updated = update_profile(&db, c.id, ProfileUpdate {
            name: Some(" Cleo B ".into()),
            address: Some("4 Elm Rd".into()),
            pincode: Some("560001".into()),
            ..Default::default()
        }).await?;
        assert_eq!(updated.name, "Cleo B");
        assert_eq!(updated.customer, Some(CustomerDetails { address: Some("4 Elm Rd".into()), pincode: Some("560001".into()) }));
        assert!(updated.professional.is_none());

        let p = user::create(&db, &format!("pp_{}@example.com", Uuid::new_v4()), "Pat", None, Role::Professional).await?;
        professional::create(&db, p.id, "painting", None).await?;
        let updated = update_profile(&db, p.id, ProfileUpdate {
            service_type: Some("Carpentry".into()),
            experience: Some("5 years".into()),
            ..Default::default()
        }).await?;
        let details = updated.professional.unwrap();
        assert_eq!(details.service_type, "carpentry");
        assert_eq!(details.experience.as_deref(), Some("5 years"));
        assert!(details.available);
        let stored = professional::Entity::find_by_id(p.id).one(&db).await?.unwrap();
        assert_eq!(stored.version, 0);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() -> anyhow::Result<()> {
        let Some(db) = get_db().await else { return Ok(()) };
        assert!(matches!(get_profile(&db, Uuid::new_v4()).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }
}
