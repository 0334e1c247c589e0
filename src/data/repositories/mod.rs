pub mod example;
pub mod progress;
pub mod user;
pub mod word;

pub use example::ExampleRepository;
pub use progress::{DieselProgressStore, ProgressStore};
pub use user::UserRepository;
pub use word::WordRepository;
