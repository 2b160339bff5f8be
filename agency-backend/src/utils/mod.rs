pub mod attachments;
pub mod cv_fields;
