pub mod task;
pub mod user;

pub use task::{Page, Task, TaskInput, TaskQuery};
pub use user::{NewUser, UserRecord};
