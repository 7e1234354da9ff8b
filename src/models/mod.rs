pub mod choice;
pub mod question;
pub mod user;
pub mod vote;

pub use choice::{Choice, ChoiceTally};
pub use question::{NewQuestion, Question};
pub use user::{AuthenticatedUser, User};
pub use vote::{Vote, VoteWrite};
