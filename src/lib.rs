//! vidsub - video to subtitled video
//!
//! Extracts a video's audio with ffmpeg (cached beside the video), transcribes
//! it with whisper, writes an SRT file and muxes it back into the video as a
//! soft track or burned into the frames.

pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod media;
pub mod paths;
pub mod request;
pub mod subtitle;
pub mod transcribe;
pub mod workflow;
