pub mod dto;
pub mod ports;
pub mod presets;
pub mod services;
pub mod upload;
