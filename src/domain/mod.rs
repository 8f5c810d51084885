pub mod detection;
pub mod errors;
pub mod labels;
pub mod model;
