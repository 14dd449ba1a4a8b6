//! Numbered terminal menu.
//!
//! # Responsibility
//! - Read one option per line and dispatch to `StudentService`.
//! - Print results and recoverable errors; keep looping until `0` or EOF.
//!
//! # Invariants
//! - Validation and not-found errors never end the loop.
//! - Search and remove look names up exactly (not by substring).

use roster_core::{ServiceError, Student, StudentService, Worksheet};
use std::io::{self, BufRead, Write};

const MENU: &str = "
===== Student Roster =====
1 - Register student
2 - List students
3 - Search student
4 - Remove student
5 - Class average
0 - Exit";

/// Runs the menu loop until the user exits or input ends.
pub fn run_menu<W, R, O>(service: &StudentService<W>, input: &mut R, out: &mut O) -> io::Result<()>
where
    W: Worksheet,
    R: BufRead,
    O: Write,
{
    loop {
        writeln!(out, "{MENU}")?;
        let Some(choice) = prompt(input, out, "Option: ")? else {
            return Ok(());
        };

        match choice.as_str() {
            "1" => register(service, input, out)?,
            "2" => list(service, out)?,
            "3" => search(service, input, out)?,
            "4" => remove(service, input, out)?,
            "5" => average(service, out)?,
            "0" => {
                writeln!(out, "Goodbye.")?;
                return Ok(());
            }
            other => writeln!(out, "Invalid option: {other}")?,
        }
    }
}

fn register<W: Worksheet>(
    service: &StudentService<W>,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> io::Result<()> {
    let Some(name) = prompt(input, out, "Name: ")? else {
        return Ok(());
    };
    let Some(age) = prompt(input, out, "Age: ")? else {
        return Ok(());
    };
    let Some(grade) = prompt(input, out, "Grade: ")? else {
        return Ok(());
    };

    match service.register(&name, &age, &grade) {
        Ok(created) => {
            writeln!(out, "Student registered with ID {}.", created.value.id)?;
            warn_if_unaudited(out, created.audit_failed())
        }
        Err(err) => report(out, &err),
    }
}

fn list<W: Worksheet>(service: &StudentService<W>, out: &mut impl Write) -> io::Result<()> {
    // A store failure renders as an empty roster after the error line.
    let students = match service.list() {
        Ok(students) => students,
        Err(err) => {
            report(out, &err)?;
            Vec::new()
        }
    };
    print_students(out, &students, "No students registered.")
}

fn search<W: Worksheet>(
    service: &StudentService<W>,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> io::Result<()> {
    let Some(name) = prompt(input, out, "Name to search: ")? else {
        return Ok(());
    };
    match service.find_by_name(&name) {
        Ok(found) => print_students(out, &found, "Student not found."),
        Err(err) => report(out, &err),
    }
}

fn remove<W: Worksheet>(
    service: &StudentService<W>,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> io::Result<()> {
    let Some(key) = prompt(input, out, "ID or name to remove: ")? else {
        return Ok(());
    };
    match service.remove(&key) {
        Ok(removed) => {
            writeln!(out, "Removed {} ({}).", removed.value.name, removed.value.id)?;
            warn_if_unaudited(out, removed.audit_failed())
        }
        Err(err) => report(out, &err),
    }
}

fn average<W: Worksheet>(service: &StudentService<W>, out: &mut impl Write) -> io::Result<()> {
    match service.class_average() {
        Ok(average) => {
            writeln!(out, "Class average: {:.2}", average.value)?;
            warn_if_unaudited(out, average.audit_failed())
        }
        Err(ServiceError::NoData) => writeln!(out, "No grades to average."),
        Err(err) => report(out, &err),
    }
}

fn print_students(out: &mut impl Write, students: &[Student], empty_message: &str) -> io::Result<()> {
    if students.is_empty() {
        return writeln!(out, "{empty_message}");
    }
    writeln!(out, "{:<36} | {:<24} | {:>4} | {:>5}", "ID", "Name", "Age", "Grade")?;
    for student in students {
        writeln!(
            out,
            "{:<36} | {:<24} | {:>4} | {:>5}",
            student.id,
            student.name,
            student.age.map(|age| age.to_string()).unwrap_or_default(),
            student
                .grade
                .map(|grade| format!("{grade:.2}"))
                .unwrap_or_default(),
        )?;
    }
    Ok(())
}

fn report(out: &mut impl Write, err: &ServiceError) -> io::Result<()> {
    match err {
        ServiceError::Validation(err) => writeln!(out, "Invalid data: {err}"),
        ServiceError::NotFound(_) => writeln!(out, "Student not found."),
        ServiceError::NoData => writeln!(out, "No grades to average."),
        ServiceError::Store(err) => {
            log::error!("event=menu_action module=cli status=error error={err}");
            writeln!(out, "Error: {err}")
        }
    }
}

fn warn_if_unaudited(out: &mut impl Write, audit_failed: bool) -> io::Result<()> {
    if audit_failed {
        writeln!(out, "(audit log could not be written)")?;
    }
    Ok(())
}

/// Prints `label` and reads one trimmed line; `None` on end of input.
fn prompt(input: &mut impl BufRead, out: &mut impl Write, label: &str) -> io::Result<Option<String>> {
    write!(out, "{label}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
