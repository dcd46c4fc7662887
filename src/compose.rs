//! Builds the outbound announcement text and its link annotation.
use crate::candidates::Candidate;

pub const POST_PREFIX: &str = "A new post has been published to joshghiloni.me! Read ";
pub const POST_SUFFIX: &str =
    " and reply to this skeet to comment on it and join the conversation";

/// Byte range into the composed text (UTF-8 offsets, the platform's
/// addressing unit) plus the link target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpan {
    pub byte_start: usize,
    pub byte_end: usize,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub text: String,
    pub link: LinkSpan,
}

/// Compose the announcement for a candidate. Pure; no I/O.
pub fn compose(candidate: &Candidate) -> Announcement {
    let text = format!("{POST_PREFIX}{}{POST_SUFFIX}", candidate.title);
    Announcement {
        text,
        link: LinkSpan {
            byte_start: POST_PREFIX.len(),
            byte_end: POST_PREFIX.len() + candidate.title.len(),
            uri: candidate.url.clone(),
        },
    }
}
