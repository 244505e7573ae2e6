pub mod match_feed;
pub mod poll;
