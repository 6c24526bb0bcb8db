pub mod interaction;
pub mod note;
pub mod query;

pub use interaction::{ActorId, CounterField, InteractionKind};
pub use note::Note;
pub use query::{NotePage, NoteQuery, SortMode};
