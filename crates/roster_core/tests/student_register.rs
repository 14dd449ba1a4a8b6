use roster_core::{
    CellValue, MemoryWorksheet, RepoError, RepoResult, RosterBook, ServiceError,
    StudentService, StudentValidationError, Worksheet,
};
use std::collections::HashSet;

fn service() -> StudentService<MemoryWorksheet> {
    let book = RosterBook::open(MemoryWorksheet::new("Students"), MemoryWorksheet::new("Logs"))
        .unwrap();
    StudentService::new(book)
}

#[test]
fn register_then_list_contains_exactly_one_new_record() {
    let service = service();
    service.register("Ana", "12", "8").unwrap();
    service.register("Bia", "13", "9,5").unwrap();
    let before = service.list().unwrap();

    let created = service.register("  Carla ", "14", "7.25").unwrap().into_value();
    let after = service.list().unwrap();

    assert_eq!(after.len(), before.len() + 1);
    let new_rows = after.iter().filter(|s| s.id == created.id).collect::<Vec<_>>();
    assert_eq!(new_rows.len(), 1);
    assert_eq!(new_rows[0].name, "carla");
    assert_eq!(new_rows[0].age, Some(14));
    assert_eq!(new_rows[0].grade, Some(7.25));
    assert!(before.iter().all(|s| s.id != created.id));
}

#[test]
fn generated_ids_are_distinct() {
    let service = service();
    for index in 0..25 {
        service.register(&format!("student {index}"), "10", "5").unwrap();
    }
    let ids = service
        .list()
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect::<HashSet<_>>();
    assert_eq!(ids.len(), 25);
}

#[test]
fn invalid_numbers_fail_without_appending() {
    let service = service();

    let age_err = service.register("ana", "twelve", "8").unwrap_err();
    assert!(matches!(
        age_err,
        ServiceError::Validation(StudentValidationError::InvalidAge(_))
    ));
    let grade_err = service.register("ana", "12", "8,5,1").unwrap_err();
    assert!(matches!(
        grade_err,
        ServiceError::Validation(StudentValidationError::InvalidGrade(_))
    ));
    let empty_err = service.register("", "12", "8").unwrap_err();
    assert!(matches!(
        empty_err,
        ServiceError::Validation(StudentValidationError::EmptyField("name"))
    ));

    assert!(service.list().unwrap().is_empty());
    // Header only: no audit rows for rejected input.
    assert_eq!(service.book().logs().get_all_values().unwrap().len(), 1);
}

#[test]
fn comma_and_period_grades_store_the_same_value() {
    let service = service();
    let comma = service.register("ana", "12", "7,5").unwrap().into_value();
    let period = service.register("bia", "12", "7.5").unwrap().into_value();
    assert_eq!(comma.grade, period.grade);
    assert_eq!(comma.grade, Some(7.5));

    let rows = service.book().students().get_all_values().unwrap();
    assert_eq!(rows[1][3], CellValue::Number(7.5));
    assert_eq!(rows[1][2], CellValue::Integer(12));
}

#[test]
fn register_writes_create_audit_row() {
    let service = service();
    let created = service.register("Ana", "12", "8").unwrap();
    assert!(!created.audit_failed());

    let logs = service.book().logs().get_all_values().unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[1][1], CellValue::text("CREATE"));
    assert_eq!(
        logs[1][2],
        CellValue::text(format!("ana ({})", created.value.id))
    );
}

struct RejectingLog;

impl Worksheet for RejectingLog {
    fn title(&self) -> &str {
        "Logs"
    }

    fn get_all_values(&self) -> RepoResult<Vec<Vec<CellValue>>> {
        Ok(vec![vec![CellValue::text("Timestamp")]])
    }

    fn append_row(&self, _cells: &[CellValue]) -> RepoResult<()> {
        Err(RepoError::Transport("log tab offline".to_string()))
    }

    fn update_row(&self, _row: usize, _cells: &[CellValue]) -> RepoResult<()> {
        Ok(())
    }

    fn delete_row(&self, _row: usize) -> RepoResult<()> {
        Ok(())
    }
}

#[test]
fn audit_failure_does_not_fail_registration() {
    let students: Box<dyn Worksheet> = Box::new(MemoryWorksheet::new("Students"));
    let logs: Box<dyn Worksheet> = Box::new(RejectingLog);
    let service = StudentService::new(RosterBook::open(students, logs).unwrap());

    let created = service.register("ana", "12", "8").unwrap();
    assert!(created.audit_failed());
    assert!(matches!(created.audit, Err(RepoError::Transport(_))));
    assert_eq!(service.list().unwrap().len(), 1);
}
