pub mod alignment;
pub mod analysis;
pub mod autonomous;
pub mod camera;
pub mod channel;
pub mod config;
pub mod display;
pub mod extraction;
pub mod geometry;
pub mod input;
pub mod pid;
pub mod pipeline;
pub mod robot;
pub mod sensors;
pub mod sim;
pub mod status;
pub mod teleop;
pub mod traits;
pub mod types;
pub mod udp;
