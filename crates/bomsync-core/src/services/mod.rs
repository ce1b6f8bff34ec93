//! Service layer shared by the API and offline tooling

mod etl_service;

pub use etl_service::EtlService;
