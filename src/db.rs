pub mod user_repo;
pub use user_repo::UserRepository;
pub mod client_repo;
pub use client_repo::ClientRepository;
pub mod visit_repo;
pub use visit_repo::VisitRepository;
pub mod seed;
