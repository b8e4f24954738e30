pub mod course;
pub mod lesson;
pub mod subject;

pub use course::Course;
pub use lesson::{Lesson, LessonPdf};
pub use subject::Subject;
