// Reply drafting: picks matched threads worth answering and drafts a reply
// for each in the group's learned style.
//
// Drafts are logged and returned; nothing is posted back to the site.

pub mod engine;
pub mod rules;

pub use engine::{Draft, ReplyEngine, ReplyReport};
pub use rules::{check_eligibility, clean_reply, Eligibility, MAX_REPLY_CHARS};
