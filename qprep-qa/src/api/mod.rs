//! HTTP API handlers for qprep-qa

pub mod buildinfo;
pub mod corpus;
pub mod health;
pub mod quiz;

pub use buildinfo::get_build_info;
pub use corpus::get_corpus_summary;
pub use health::health_routes;
pub use quiz::create_quiz;
