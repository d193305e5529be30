//! # Data Models
//!
//! SeaORM entities for the school administration schema.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod address;
pub mod attendance;
pub mod building;
pub mod classroom;
pub mod classtime;
pub mod course;
pub mod department;
pub mod employee;
pub mod enrollment;
pub mod grade;
pub mod group;
pub mod group_permission;
pub mod major;
pub mod office;
pub mod permission;
pub mod school_year;
pub mod section;
pub mod semester;
pub mod student;
pub mod teach;
pub mod teacher;
pub mod user;
pub mod user_group;

pub use address::Entity as Address;
pub use attendance::Entity as Attendance;
pub use building::Entity as Building;
pub use classroom::Entity as Classroom;
pub use classtime::Entity as Classtime;
pub use course::Entity as Course;
pub use department::Entity as Department;
pub use employee::Entity as Employee;
pub use enrollment::Entity as Enrollment;
pub use grade::Entity as Grade;
pub use group::Entity as Group;
pub use major::Entity as Major;
pub use office::Entity as Office;
pub use permission::Entity as Permission;
pub use school_year::Entity as SchoolYear;
pub use section::Entity as Section;
pub use semester::Entity as Semester;
pub use student::Entity as Student;
pub use teach::Entity as Teach;
pub use teacher::Entity as Teacher;
pub use user::Entity as User;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "school-admin".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
