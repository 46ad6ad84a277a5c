pub mod arg_parser;
pub mod config;
pub mod errors;
pub mod fan_curve;
pub mod fan_manager;
pub mod fan_state;
pub mod gpu_device;
pub mod logger;
