use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, TransactionTrait};
use tracing::info;
use uuid::Uuid;

use models::{customer_profile, professional, user::{self, Role}, user_credentials};

use crate::auth::domain::{AuthUser, Credentials, NewAccount};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

fn to_auth_user(u: user::Model) -> Result<AuthUser, AuthError> {
    let role = u.role()?;
    Ok(AuthUser { id: u.id, email: u.email, name: u.name, role, active: u.active })
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        let res = user::Entity::find()
            .filter(user::Column::Email.eq(email.to_string()))
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        res.map(to_auth_user).transpose()
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
        let res = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        res.map(to_auth_user).transpose()
    }

    async fn create_account(&self, account: NewAccount) -> Result<AuthUser, AuthError> {
        let NewAccount { input, password_hash, password_algorithm } = account;
        let txn = self.db.begin().await.map_err(|e| AuthError::Repository(e.to_string()))?;

        let created = user::create(&txn, &input.email, &input.name, input.phone.as_deref(), input.role).await?;
        match input.role {
            Role::Customer => {
                customer_profile::create(&txn, created.id, input.address.as_deref(), input.pincode.as_deref()).await?;
            }
            Role::Professional => {
                let service_type = input.service_type.as_deref().unwrap_or_default();
                professional::create(&txn, created.id, service_type, input.experience.as_deref()).await?;
            }
            Role::Admin => {}
        }
        user_credentials::set_password(&txn, created.id, password_hash, &password_algorithm).await?;

        txn.commit().await.map_err(|e| AuthError::Repository(e.to_string()))?;
        to_auth_user(created)
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
        let res = user_credentials::find_for_account(&self.db, user_id).await?;
        Ok(res.map(|c| Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm }))
    }

    async fn set_password(&self, user_id: Uuid, password_hash: String, password_algorithm: &str) -> Result<(), AuthError> {
        let saved = user_credentials::set_password(&self.db, user_id, password_hash, password_algorithm).await?;
        info!(user_id = %user_id, algorithm = %saved.password_algorithm, "password_stored");
        Ok(())
    }
}
