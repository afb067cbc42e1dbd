use gradebook_core::db::open_db_in_memory;
use gradebook_core::{
    ErrorKind, GradeDraft, GradeRepository, GradeService, GradeUpdate, RepoError, ServiceError,
    SqliteGradeRepository, SqliteStudentRepository, StudentService,
};
use rusqlite::Connection;

fn seed_student(conn: &Connection, name: &str, email: &str) -> i64 {
    let service = StudentService::new(SqliteStudentRepository::try_new(conn).unwrap());
    service.create_student(name, email).unwrap().id
}

#[test]
fn create_get_and_list_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_student(&conn, "Alice", "alice@example.com");
    let service = GradeService::new(SqliteGradeRepository::try_new(&conn).unwrap());

    let math = service.create_grade(alice, " Math ", 85.0).unwrap();
    let art = service.create_grade(alice, "Art", 90.0).unwrap();
    assert_eq!(math.subject, "Math");
    assert_eq!(math.student_id, alice);

    let loaded = service.get_grade(math.id).unwrap().unwrap();
    assert_eq!(loaded, math);

    conn.execute(
        "UPDATE grades SET created_at = 1000 WHERE id = ?1;",
        [math.id],
    )
    .unwrap();
    conn.execute("UPDATE grades SET created_at = 2000 WHERE id = ?1;", [art.id])
        .unwrap();

    let ids: Vec<i64> = service
        .list_grades_by_student(alice)
        .unwrap()
        .into_iter()
        .map(|grade| grade.id)
        .collect();
    assert_eq!(ids, vec![art.id, math.id]);
}

#[test]
fn score_bounds_are_inclusive_and_out_of_range_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_student(&conn, "Alice", "alice@example.com");
    let service = GradeService::new(SqliteGradeRepository::try_new(&conn).unwrap());

    for score in [150.0, -10.0, 100.01, f64::NAN] {
        let err = service.create_grade(alice, "Math", score).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "score {score}");
    }
    assert!(service.list_grades_by_student(alice).unwrap().is_empty());

    service.create_grade(alice, "Math", 0.0).unwrap();
    service.create_grade(alice, "Math", 100.0).unwrap();
    assert_eq!(service.list_grades_by_student(alice).unwrap().len(), 2);
}

#[test]
fn blank_subject_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_student(&conn, "Alice", "alice@example.com");
    let service = GradeService::new(SqliteGradeRepository::try_new(&conn).unwrap());

    let err = service.create_grade(alice, "  ", 50.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn grade_for_missing_student_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGradeRepository::try_new(&conn).unwrap();

    let draft = GradeDraft::new(99, "Math", 80.0).unwrap();
    assert!(matches!(
        repo.create_grade(&draft).unwrap_err(),
        RepoError::StudentNotFound(99)
    ));

    let service = GradeService::new(repo);
    assert!(matches!(
        service.create_grade(99, "Math", 80.0).unwrap_err(),
        ServiceError::StudentNotFound(99)
    ));
    assert!(matches!(
        service.list_grades_by_student(99).unwrap_err(),
        ServiceError::StudentNotFound(99)
    ));
}

#[test]
fn partial_update_keeps_unset_fields() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_student(&conn, "Alice", "alice@example.com");
    let service = GradeService::new(SqliteGradeRepository::try_new(&conn).unwrap());
    let grade = service.create_grade(alice, "Math", 70.0).unwrap();

    let rescored = service
        .update_grade(
            grade.id,
            &GradeUpdate {
                score: Some(95.5),
                ..GradeUpdate::default()
            },
        )
        .unwrap();
    assert_eq!(rescored.subject, "Math");
    assert_eq!(rescored.score, 95.5);
    assert_eq!(rescored.student_id, alice);

    let renamed = service
        .update_grade(
            grade.id,
            &GradeUpdate {
                subject: Some("Algebra".to_string()),
                ..GradeUpdate::default()
            },
        )
        .unwrap();
    assert_eq!(renamed.subject, "Algebra");
    assert_eq!(renamed.score, 95.5);

    let err = service
        .update_grade(
            grade.id,
            &GradeUpdate {
                score: Some(101.0),
                ..GradeUpdate::default()
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(service.get_grade(grade.id).unwrap().unwrap().score, 95.5);
}

#[test]
fn update_missing_grade_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = GradeService::new(SqliteGradeRepository::try_new(&conn).unwrap());

    let err = service
        .update_grade(7, &GradeUpdate::default())
        .unwrap_err();
    assert!(matches!(err, ServiceError::GradeNotFound(7)));
}

#[test]
fn delete_grade_only_removes_that_grade() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_student(&conn, "Alice", "alice@example.com");
    let students = StudentService::new(SqliteStudentRepository::try_new(&conn).unwrap());
    let service = GradeService::new(SqliteGradeRepository::try_new(&conn).unwrap());

    let low = service.create_grade(alice, "Math", 60.0).unwrap();
    service.create_grade(alice, "Art", 90.0).unwrap();
    assert_eq!(students.get_student_grades(alice).unwrap().average(), 75.0);

    service.delete_grade(low.id).unwrap();
    let remaining = students.get_student_grades(alice).unwrap();
    assert_eq!(remaining.grade_count(), 1);
    assert_eq!(remaining.average(), 90.0);
    assert_eq!(remaining.student.name, "Alice");

    assert!(matches!(
        service.delete_grade(low.id).unwrap_err(),
        ServiceError::GradeNotFound(id) if id == low.id
    ));
}

#[test]
fn joined_listing_orders_by_student_name_then_time() {
    let conn = open_db_in_memory().unwrap();
    let bob = seed_student(&conn, "Bob", "bob@example.com");
    let alice = seed_student(&conn, "Alice", "alice@example.com");
    let repo = SqliteGradeRepository::try_new(&conn).unwrap();

    let bob_math = repo
        .create_grade(&GradeDraft::new(bob, "Math", 85.0).unwrap())
        .unwrap();
    let alice_late = repo
        .create_grade(&GradeDraft::new(alice, "Art", 90.0).unwrap())
        .unwrap();
    let alice_early = repo
        .create_grade(&GradeDraft::new(alice, "Math", 95.0).unwrap())
        .unwrap();
    conn.execute(
        "UPDATE grades SET created_at = 5000 WHERE id = ?1;",
        [alice_late.id],
    )
    .unwrap();
    conn.execute(
        "UPDATE grades SET created_at = 1000 WHERE id = ?1;",
        [alice_early.id],
    )
    .unwrap();

    let rows = repo.list_grades_with_students().unwrap();
    let order: Vec<(String, i64)> = rows
        .into_iter()
        .map(|row| (row.student_name, row.grade.id))
        .collect();
    assert_eq!(
        order,
        vec![
            ("Alice".to_string(), alice_early.id),
            ("Alice".to_string(), alice_late.id),
            ("Bob".to_string(), bob_math.id),
        ]
    );
}
