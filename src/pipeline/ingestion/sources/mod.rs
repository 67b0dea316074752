// Native record shapes of each job board
pub mod adzuna;
pub mod jooble;
pub mod usajobs;

pub use adzuna::AdzunaJob;
pub use jooble::JoobleJob;
pub use usajobs::UsaJobsItem;
