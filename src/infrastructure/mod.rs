pub mod rate_limit;
pub mod subscription_store;
