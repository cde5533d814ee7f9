pub mod clean;
pub mod config;
pub mod load;
pub mod model;
pub mod pipeline;
pub mod report;
