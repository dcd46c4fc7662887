//! Announces newly published site pages on Bluesky and records the returned
//! record URI inside each page's front matter, so repeated runs never
//! announce the same page twice.
pub mod bluesky;
pub mod candidates;
pub mod compose;
pub mod document;
pub mod marker;
pub mod pipeline;
