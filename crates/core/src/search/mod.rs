//! Search service layer: orchestration over the repository port.

pub mod factory;
pub mod memory;
pub mod repository;
pub mod service;

pub use factory::SearchServiceFactory;
pub use memory::InMemoryRepository;
pub use repository::SearchRepository;
pub use service::{SearchRequest, SearchService};
