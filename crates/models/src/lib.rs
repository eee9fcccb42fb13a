pub mod errors;
pub mod db;
pub mod user;
pub mod user_credentials;
pub mod customer_profile;
pub mod professional;
pub mod catalog;
pub mod service_request;

#[cfg(test)]
mod tests;
