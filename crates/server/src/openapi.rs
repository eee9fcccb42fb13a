//! Request/response shapes for the generated document. The handlers take
//! the service-layer types; these mirror them for schema output only.

use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    /// `customer` or `professional`
    pub role: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub pincode: Option<String>,
    pub service_type: Option<String>,
    pub experience: Option<String>,
}

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct NewServiceDoc {
    pub name: String,
    #[schema(rename = "type")]
    pub service_type: String,
    pub price: f64,
    pub time_required: String,
    pub description: Option<String>,
}

#[derive(ToSchema)]
pub struct ServiceUpdateDoc {
    pub name: Option<String>,
    #[schema(rename = "type")]
    pub service_type: Option<String>,
    pub price: Option<f64>,
    pub time_required: Option<String>,
    pub description: Option<String>,
}

#[derive(ToSchema)]
pub struct CreateRequestDoc { pub service_id: Uuid, pub remarks: Option<String> }

#[derive(ToSchema)]
pub struct CloseRequestDoc {
    /// 1 to 5
    pub rating: f64,
    pub remarks: Option<String>,
}

/// Partial update; fields of another role's profile are rejected.
#[derive(ToSchema)]
pub struct ProfileUpdateDoc {
    pub name: Option<String>,
    pub phone: Option<String>,
    /// Customers only
    pub address: Option<String>,
    /// Customers only
    pub pincode: Option<String>,
    /// Professionals only
    pub service_type: Option<String>,
    /// Professionals only
    pub experience: Option<String>,
}

#[derive(ToSchema)]
pub struct AssignDoc { pub professional_id: Uuid }

#[derive(ToSchema)]
pub struct VerifyDoc { pub approve: bool, pub reason: Option<String> }

#[derive(ToSchema)]
pub struct UserStatusDoc { pub active: bool }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::profile::get,
        crate::routes::profile::update,
        crate::routes::catalog::list,
        crate::routes::catalog::types,
        crate::routes::catalog::get,
        crate::routes::directory::search,
        crate::routes::directory::for_service,
        crate::routes::catalog::create,
        crate::routes::catalog::update,
        crate::routes::catalog::delete,
        crate::routes::customer::list,
        crate::routes::customer::create,
        crate::routes::customer::get,
        crate::routes::customer::close,
        crate::routes::customer::cancel,
        crate::routes::professional::list,
        crate::routes::professional::accept,
        crate::routes::professional::reject,
        crate::routes::professional::complete,
        crate::routes::admin::list_requests,
        crate::routes::admin::assign,
        crate::routes::admin::unassign,
        crate::routes::admin::list_users,
        crate::routes::admin::list_customers,
        crate::routes::admin::list_professionals,
        crate::routes::admin::verify_professional,
        crate::routes::admin::set_user_status,
        crate::routes::stats::admin,
        crate::routes::stats::customer,
        crate::routes::stats::professional,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            NewServiceDoc,
            ServiceUpdateDoc,
            CreateRequestDoc,
            CloseRequestDoc,
            ProfileUpdateDoc,
            AssignDoc,
            VerifyDoc,
            UserStatusDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "catalog"),
        (name = "customer"),
        (name = "professional"),
        (name = "admin"),
        (name = "stats")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_profile_and_directory_paths() {
        let doc = ApiDoc::openapi();
        for p in ["/auth/profile", "/professionals", "/services/{id}/professionals", "/admin/users", "/admin/customers"] {
            assert!(doc.paths.paths.contains_key(p), "missing {p}");
        }
    }

    #[test]
    fn document_lists_lifecycle_paths() {
        let doc = ApiDoc::openapi();
        for p in ["/admin/requests/{id}/assign", "/professional/requests/{id}/accept", "/customer/requests/{id}/close", "/health"] {
            assert!(doc.paths.paths.contains_key(p), "missing {p}");
        }
    }
}
