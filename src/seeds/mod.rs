//! Database seeding functionality
//!
//! Seeds the role groups with their permissions and bootstraps the first
//! administrator account.

pub mod roles;
pub mod superuser;

pub use roles::seed_roles;
pub use superuser::create_superuser;
