mod answer;
mod identity;
mod ids;
mod question;
mod snapshot;

pub use answer::{AnswerCheck, AnswerRecord, TopicStat, percentage};
pub use identity::{Identity, IdentityError};
pub use ids::{ParseIdError, QuestionId};
pub use question::{CatalogEntry, OptionKey, OptionKeyError, Question};
pub use snapshot::{SessionSnapshot, SnapshotError};
