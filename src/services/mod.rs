pub mod byte_source;
pub mod resource_fetcher;
pub mod subscription_manager;
