pub mod backup;
pub mod core;
pub mod dashboard;
pub mod roster;
pub mod settings;
pub mod students;
