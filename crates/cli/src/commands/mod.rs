pub mod agent;
pub mod doctor;
pub mod run;
pub mod tools;
