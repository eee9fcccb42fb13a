pub mod types;
pub mod utils;
pub mod env;
pub mod metrics;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health { status: "ok" };
        assert_eq!(h.status, "ok");
    }

    #[test]
    fn error_body_carries_status_code() {
        let body = types::ErrorBody::new(409, "invalid transition");
        assert_eq!(body.status, 409);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"], "invalid transition");
    }
}
