//! Timekeeping records: contacts, the projects they own, and the time entries
//! logged against those projects.

pub mod contact;
pub mod project;
pub mod time_entry;

pub use contact::{Contact, ContactDetails};
pub use project::{NewProject, Project, ProjectWithContact};
pub use time_entry::{NewTimeEntry, TIMESTAMP_FORMAT, TimeEntry, TimeEntryWithProject, total_delta};
