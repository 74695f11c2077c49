pub mod commands;
pub mod config;
pub mod ffmpeg;
pub mod job;
pub mod manifest;
pub mod scheduler;
pub mod worker;
