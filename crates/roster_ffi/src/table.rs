//! Table view state for the desktop form.
//!
//! # Invariants
//! - `reload` replaces every row; nothing is merged.
//! - `retain_matching` filters what is currently displayed, so successive
//!   searches narrow the table until the next reload.

use roster_core::{filter_by_name, Student};

/// One display row: ID / Name / Age / Grade as shown in the table.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentRow {
    pub id: String,
    pub name: String,
    pub age: String,
    pub grade: String,
}

impl From<&Student> for StudentRow {
    fn from(student: &Student) -> Self {
        Self {
            id: student.id.clone(),
            name: student.name.clone(),
            age: student.age.map(|age| age.to_string()).unwrap_or_default(),
            grade: student.grade.map(|grade| grade.to_string()).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct RosterTable {
    students: Vec<Student>,
}

impl RosterTable {
    pub(crate) const fn new() -> Self {
        Self {
            students: Vec::new(),
        }
    }

    pub(crate) fn reload(&mut self, students: Vec<Student>) {
        self.students = students;
    }

    pub(crate) fn clear(&mut self) {
        self.students.clear();
    }

    pub(crate) fn retain_matching(&mut self, term: &str) {
        self.students = filter_by_name(std::mem::take(&mut self.students), term);
    }

    pub(crate) fn find(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|student| student.id == id)
    }

    pub(crate) fn rows(&self) -> Vec<StudentRow> {
        self.students.iter().map(StudentRow::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::RosterTable;
    use roster_core::{NewStudent, Student};

    fn student(name: &str) -> Student {
        Student::with_id(name, NewStudent::parse(name, "10", "7,5").unwrap())
    }

    #[test]
    fn successive_searches_narrow_until_reload() {
        let all = vec![student("ana"), student("mariana"), student("juliana"), student("joao")];
        let mut table = RosterTable::new();
        table.reload(all.clone());

        table.retain_matching("ana");
        assert_eq!(table.rows().len(), 3);
        table.retain_matching("ju");
        assert_eq!(table.rows().len(), 1);
        table.retain_matching("joao");
        assert!(table.rows().is_empty());

        table.reload(all);
        assert_eq!(table.rows().len(), 4);
        assert_eq!(table.rows()[0].grade, "7.5");
        assert_eq!(table.rows()[0].age, "10");
    }
}
