pub mod matches_service;
pub mod playback;
pub mod poll_service;
