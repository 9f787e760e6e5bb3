use advwell::repository::{CompanyListQuery, CompanyReader};

mod common;

#[test]
fn test_creates_and_migrates_db() {
    let test_db = common::TestDb::new("test_creates_and_migrates_db.db");
    let conn = test_db.pool().get();
    assert!(conn.is_ok());

    let (total, companies) = test_db.repo().list_companies(CompanyListQuery::new()).unwrap();
    assert_eq!(total, 0);
    assert!(companies.is_empty());
}
