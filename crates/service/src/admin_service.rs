//! Admin-side account management: user listings, professional
//! verification and blocking.

use sea_orm::{
    sea_query::Query, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use common::types::Page;
use models::customer_profile;
use models::professional::{self, ProfessionalStatus};
use models::user::{self, Role};
use crate::{errors::ServiceError, pagination::Pagination};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfessionalFilter {
    pub status: Option<String>,
    pub available: Option<bool>,
    pub service_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    /// `customer`, `professional` or `admin`.
    pub role: Option<String>,
    /// `active`, `blocked`, or a professional verification state
    /// (`pending`, `approved`).
    pub status: Option<String>,
    /// Substring of name or email.
    pub q: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerFilter {
    pub active: Option<bool>,
    pub pincode: Option<String>,
    pub q: Option<String>,
}

/// Customer profile joined with its account.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerView {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub active: bool,
    pub address: Option<String>,
    pub pincode: Option<String>,
}

/// Professional profile joined with its account.
#[derive(Debug, Clone, Serialize)]
pub struct ProfessionalView {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub active: bool,
    pub service_type: String,
    pub experience: Option<String>,
    pub status: String,
    pub verified: bool,
    pub rejection_reason: Option<String>,
    pub available: bool,
    pub current_request: Option<Uuid>,
}

impl ProfessionalView {
    fn from_parts(p: professional::Model, u: Option<user::Model>) -> Self {
        let (email, name, active) = u.map(|u| (u.email, u.name, u.active)).unwrap_or_default();
        Self {
            id: p.user_id,
            email,
            name,
            active,
            service_type: p.service_type,
            experience: p.experience,
            status: p.status,
            verified: p.verified,
            rejection_reason: p.rejection_reason,
            available: p.available,
            current_request: p.current_request,
        }
    }
}

fn non_blank(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|v| !v.is_empty())
}

fn text_match(q: &str) -> Condition {
    Condition::any()
        .add(user::Column::Name.contains(q))
        .add(user::Column::Email.contains(q))
}

/// Translate a `status` query value into a condition on `app_user`.
pub fn user_status_condition(status: &str) -> Result<Condition, ServiceError> {
    let verification = |s: ProfessionalStatus| {
        user::Column::Id.in_subquery(
            Query::select()
                .column(professional::Column::UserId)
                .from(professional::Entity)
                .and_where(professional::Column::Status.eq(s.as_str()))
                .to_owned(),
        )
    };
    let cond = match status.trim().to_lowercase().as_str() {
        "active" => Condition::all().add(user::Column::Active.eq(true)),
        "blocked" => Condition::all().add(user::Column::Active.eq(false)),
        "pending" => Condition::all().add(verification(ProfessionalStatus::Pending)),
        "approved" => Condition::all().add(verification(ProfessionalStatus::Approved)),
        other => return Err(ServiceError::Validation(format!("invalid status: {other}"))),
    };
    Ok(cond)
}

pub async fn list_users(
    db: &DatabaseConnection,
    filter: &UserFilter,
    opts: Pagination,
) -> Result<Page<user::Model>, ServiceError> {
    let mut cond = Condition::all();
    if let Some(role) = non_blank(filter.role.as_deref()) {
        let role: Role = role.parse()?;
        cond = cond.add(user::Column::Role.eq(role.as_str()));
    }
    if let Some(status) = non_blank(filter.status.as_deref()) {
        cond = cond.add(user_status_condition(status)?);
    }
    if let Some(q) = non_blank(filter.q.as_deref()) {
        cond = cond.add(text_match(q));
    }
    let (page_idx, per_page) = opts.normalize();
    let paginator = user::Entity::find()
        .filter(cond)
        .order_by_asc(user::Column::Name)
        .order_by_asc(user::Column::Id)
        .paginate(db, per_page);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(page_idx).await?;
    Ok(opts.into_page(items, total))
}

pub async fn list_customers(
    db: &DatabaseConnection,
    filter: &CustomerFilter,
    opts: Pagination,
) -> Result<Page<CustomerView>, ServiceError> {
    let mut cond = Condition::all();
    if let Some(active) = filter.active {
        cond = cond.add(user::Column::Active.eq(active));
    }
    if let Some(pincode) = non_blank(filter.pincode.as_deref()) {
        cond = cond.add(customer_profile::Column::Pincode.eq(pincode));
    }
    if let Some(q) = non_blank(filter.q.as_deref()) {
        cond = cond.add(text_match(q));
    }
    let (page_idx, per_page) = opts.normalize();
    let paginator = customer_profile::Entity::find()
        .find_also_related(user::Entity)
        .filter(cond)
        .order_by_asc(user::Column::Name)
        .order_by_asc(customer_profile::Column::UserId)
        .paginate(db, per_page);
    let total = paginator.num_items().await?;
    let items = paginator
        .fetch_page(page_idx)
        .await?
        .into_iter()
        .filter_map(|(c, u)| {
            u.map(|u| CustomerView {
                id: c.user_id,
                email: u.email,
                name: u.name,
                phone: u.phone,
                active: u.active,
                address: c.address,
                pincode: c.pincode,
            })
        })
        .collect();
    Ok(opts.into_page(items, total))
}

pub async fn list_professionals(
    db: &DatabaseConnection,
    filter: &ProfessionalFilter,
    opts: Pagination,
) -> Result<Page<ProfessionalView>, ServiceError> {
    let mut cond = Condition::all();
    if let Some(s) = filter.status.as_deref().filter(|s| !s.trim().is_empty()) {
        let status: ProfessionalStatus = s.trim().to_lowercase().parse()?;
        cond = cond.add(professional::Column::Status.eq(status.as_str()));
    }
    if let Some(a) = filter.available {
        cond = cond.add(professional::Column::Available.eq(a));
    }
    if let Some(t) = filter.service_type.as_deref().filter(|t| !t.trim().is_empty()) {
        cond = cond.add(professional::Column::ServiceType.eq(t.trim().to_lowercase()));
    }
    let (page_idx, per_page) = opts.normalize();
    let paginator = professional::Entity::find()
        .find_also_related(user::Entity)
        .filter(cond)
        .order_by_asc(professional::Column::UserId)
        .paginate(db, per_page);
    let total = paginator.num_items().await?;
    let items = paginator
        .fetch_page(page_idx)
        .await?
        .into_iter()
        .map(|(p, u)| ProfessionalView::from_parts(p, u))
        .collect();
    Ok(opts.into_page(items, total))
}

/// Approve or reject a professional. Rejection requires a reason.
pub async fn verify_professional(
    db: &DatabaseConnection,
    professional_id: Uuid,
    admin_id: Uuid,
    approve: bool,
    reason: Option<String>,
) -> Result<professional::Model, ServiceError> {
    professional::Entity::find_by_id(professional_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("professional"))?;
    let reason = reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
    if !approve && reason.is_none() {
        return Err(ServiceError::Validation("rejection reason required".into()));
    }
    let updated = professional::set_verification(db, professional_id, approve, admin_id, reason).await?;
    info!(professional_id = %professional_id, admin_id = %admin_id, approve, "professional_verified");
    Ok(updated)
}

/// Block or unblock an account. A blocked professional is also marked
/// `blocked`; unblocking restores approved or pending.
pub async fn set_user_active(
    db: &DatabaseConnection,
    user_id: Uuid,
    active: bool,
    admin_id: Uuid,
) -> Result<user::Model, ServiceError> {
    if user_id == admin_id && !active {
        return Err(ServiceError::Validation("admins cannot block themselves".into()));
    }
    let found = user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("user"))?;

    let txn = db.begin().await?;
    let updated = user::set_active(&txn, user_id, active).await?;
    if found.role()? == Role::Professional {
        if let Some(p) = professional::Entity::find_by_id(user_id).one(&txn).await? {
            let status = match (active, p.verified) {
                (false, _) => ProfessionalStatus::Blocked,
                (true, true) => ProfessionalStatus::Approved,
                (true, false) => ProfessionalStatus::Pending,
            };
            let mut am: professional::ActiveModel = p.into();
            am.status = Set(status.as_str().to_string());
            am.update(&txn).await?;
        }
    }
    txn.commit().await?;
    info!(user_id = %user_id, admin_id = %admin_id, active, "user_status_changed");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;

    #[tokio::test]
    async fn verify_and_block_professional() -> anyhow::Result<()> {
        let Some(db) = get_db().await else { return Ok(()) };
        let admin = Uuid::new_v4();
        let u = user::create(&db, &format!("v_{}@example.com", Uuid::new_v4()), "Val", None, Role::Professional).await?;
        professional::create(&db, u.id, "painting", None).await?;

        let err = verify_professional(&db, u.id, admin, false, Some("  ".into())).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let p = verify_professional(&db, u.id, admin, true, None).await?;
        assert_eq!(p.status, "approved");

        let blocked = set_user_active(&db, u.id, false, admin).await?;
        assert!(!blocked.active);
        let p = professional::Entity::find_by_id(u.id).one(&db).await?.unwrap();
        assert_eq!(p.status, "blocked");

        set_user_active(&db, u.id, true, admin).await?;
        let p = professional::Entity::find_by_id(u.id).one(&db).await?.unwrap();
        assert_eq!(p.status, "approved");

        let page = list_professionals(&db, &ProfessionalFilter { service_type: Some("Painting".into()), ..Default::default() }, Pagination::default()).await?;
        assert!(page.items.iter().any(|v| v.id == u.id && v.name == "Val"));
        Ok(())
    }

    #[test]
    fn user_status_accepts_known_values_only() {
        for s in ["active", "Blocked", "pending", "approved"] {
            assert!(user_status_condition(s).is_ok(), "{s}");
        }
        assert!(matches!(user_status_condition("deleted"), Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn users_and_customers_are_listed_with_filters() -> anyhow::Result<()> {
        let Some(db) = get_db().await else { return Ok(()) };
        let tag = Uuid::new_v4().simple().to_string();
        let c = user::create(&db, &format!("lc_{tag}@example.com"), "Lena", None, Role::Customer).await?;
        customer_profile::create(&db, c.id, Some("9 Oak St"), Some("110001")).await?;
        let p = user::create(&db, &format!("lp_{tag}@example.com"), "Lars", None, Role::Professional).await?;
        professional::create(&db, p.id, "cleaning", None).await?;

        let by_tag = UserFilter { q: Some(tag.clone()), ..Default::default() };
        let page = list_users(&db, &by_tag, Pagination::default()).await?;
        assert_eq!(page.total, 2);

        let pending = UserFilter { status: Some("pending".into()), ..by_tag.clone() };
        let page = list_users(&db, &pending, Pagination::default()).await?;
        assert_eq!(page.items.iter().map(|u| u.id).collect::<Vec<_>>(), vec![p.id]);

        let customers = UserFilter { role: Some("customer".into()), ..by_tag.clone() };
        let page = list_users(&db, &customers, Pagination::default()).await?;
        assert_eq!(page.items.iter().map(|u| u.id).collect::<Vec<_>>(), vec![c.id]);

        let bad_role = UserFilter { role: Some("guest".into()), ..Default::default() };
        assert!(list_users(&db, &bad_role, Pagination::default()).await.is_err());

        let page = list_customers(&db, &CustomerFilter { q: Some(tag.clone()), ..Default::default() }, Pagination::default()).await?;
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].pincode.as_deref(), Some("110001"));

        set_user_active(&db, c.id, false, Uuid::new_v4()).await?;
        let active_only = CustomerFilter { q: Some(tag), active: Some(true), ..Default::default() };
        assert_eq!(list_customers(&db, &active_only, Pagination::default()).await?.total, 0);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() -> anyhow::Result<()> {
        let Some(db) = get_db().await else { return Ok(()) };
        let admin = Uuid::new_v4();
        assert!(matches!(verify_professional(&db, Uuid::new_v4(), admin, true, None).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(set_user_active(&db, Uuid::new_v4(), false, admin).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }
}
