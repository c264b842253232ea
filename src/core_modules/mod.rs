pub mod cloud_coverage;
pub mod direction;
pub mod pixel;
pub mod pixel_grid;
pub mod sampler;
pub mod sky_analysis;
pub mod sky_classifier;
pub mod sky_validator;
pub mod smart_pixel;
pub mod visibility;
pub mod weather_conditions;
pub mod weather_predictor;
