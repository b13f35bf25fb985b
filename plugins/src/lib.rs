pub mod backend;
pub mod factory;
pub mod provider;
pub mod renderers;
pub mod store;
