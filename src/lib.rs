pub mod chip_profile;
pub mod logging;
pub mod series;
pub mod technical_analysis;
