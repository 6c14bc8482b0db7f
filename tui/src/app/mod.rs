pub mod run;
pub mod trainer;
