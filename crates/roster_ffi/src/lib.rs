//! Desktop form bindings for the student roster.

pub mod api;
mod table;
