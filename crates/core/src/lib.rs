pub mod agent;
pub mod composer;
pub mod conversation;
pub mod extraction;
pub mod lexicon;
pub mod llm_client;
pub mod pacing;
pub mod phrases;
pub mod scenario;
pub mod session;
pub mod speech;
pub mod talking_points;
pub mod topic;
pub mod tracker;

/// Speaker label the conversation uses for the practicing user.
pub const USER_LABEL: &str = "You";
