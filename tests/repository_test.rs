use crudbase::config::DatabaseConfig;
use crudbase::db::init_db;
use crudbase::domain::{NewUser, User, UserChanges};
use crudbase::{Condition, Pagination, Repository, SortOrder, StoreError};
use std::time::Duration;
use tempfile::TempDir;

async fn setup_test_repo() -> (Repository<User>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&DatabaseConfig::sqlite_file(&db_path))
        .await
        .expect("init_db failed");
    (Repository::new(pool), temp_dir)
}

fn new_user(email: &str) -> NewUser {
    NewUser::new(email, "hash", "salt")
}

async fn seed_users(repo: &Repository<User>, n: usize) -> Vec<User> {
    let batch: Vec<NewUser> = (0..n).map(|i| new_user(&format!("user{:02}@example.com", i))).collect();
    repo.create_many(&batch).await.expect("create_many failed")
}

#[tokio::test]
async fn test_create_then_find_by_id() {
    let (repo, _temp) = setup_test_repo().await;

    let created = repo
        .create(&new_user("a@b.com").with_name("Ada", "Lovelace"))
        .await
        .unwrap();

    let found = repo.find_by_id(&created.id).await.unwrap().expect("row missing");
    assert_eq!(found, created);
    assert_eq!(found.first_name.as_deref(), Some("Ada"));
}

#[tokio::test]
async fn test_find_by_id_missing_is_none() {
    let (repo, _temp) = setup_test_repo().await;
    assert!(repo.find_by_id("does-not-exist").await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_sets_field_and_advances_updated_at() {
    let (repo, _temp) = setup_test_repo().await;

    let created = repo.create(&new_user("a@b.com")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;

    let changes = UserChanges {
        first_name: Some(Some("Grace".to_string())),
        is_verified: Some(true),
        ..Default::default()
    };
    let updated = repo
        .update(&created.id, &changes)
        .await
        .unwrap()
        .expect("row missing");
    assert_eq!(updated.first_name.as_deref(), Some("Grace"));

    let found = repo.find_by_id(&created.id).await.unwrap().unwrap();
    assert_eq!(found.first_name.as_deref(), Some("Grace"));
    assert!(found.is_verified);
    assert!(found.updated_at > created.updated_at);
    assert_eq!(found.created_at, created.created_at);
    assert_eq!(found.email, created.email);
}

#[tokio::test]
async fn test_update_can_clear_nullable_column() {
    let (repo, _temp) = setup_test_repo().await;

    let created = repo
        .create(&new_user("a@b.com").with_name("Ada", "Lovelace"))
        .await
        .unwrap();

    let changes = UserChanges {
        last_name: Some(None),
        ..Default::default()
    };
    let updated = repo.update(&created.id, &changes).await.unwrap().unwrap();
    assert_eq!(updated.first_name.as_deref(), Some("Ada"));
    assert!(updated.last_name.is_none());
}

#[tokio::test]
async fn test_delete_then_exists_is_false() {
    let (repo, _temp) = setup_test_repo().await;

    let created = repo.create(&new_user("a@b.com")).await.unwrap();
    assert!(repo.exists(&created.id).await.unwrap());

    let deleted = repo.delete(&created.id).await.unwrap().expect("row missing");
    assert_eq!(deleted.id, created.id);
    assert!(!repo.exists(&created.id).await.unwrap());

    let again = repo.delete(&created.id).await.unwrap();
    assert!(again.is_none());
}

#[tokio::test]
async fn test_second_page_returns_rows_eleven_to_twenty() {
    let (repo, _temp) = setup_test_repo().await;
    seed_users(&repo, 25).await;

    let pagination = Pagination::new(2, 10).sorted_by("email", SortOrder::Asc);
    let page = repo.find_all(Some(&pagination)).await.unwrap();

    let emails: Vec<_> = page.iter().map(|u| u.email.as_str()).collect();
    let expected: Vec<_> = (10..20).map(|i| format!("user{:02}@example.com", i)).collect();
    assert_eq!(emails, expected);
}

#[tokio::test]
async fn test_descending_sort_and_short_last_page() {
    let (repo, _temp) = setup_test_repo().await;
    seed_users(&repo, 25).await;

    let pagination = Pagination::new(3, 10).sorted_by("email", SortOrder::Desc);
    let page = repo.find_all(Some(&pagination)).await.unwrap();

    let emails: Vec<_> = page.iter().map(|u| u.email.as_str()).collect();
    let expected: Vec<_> = (0..5).rev().map(|i| format!("user{:02}@example.com", i)).collect();
    assert_eq!(emails, expected);
}

#[tokio::test]
async fn test_count_matches_unpaginated_find_all() {
    let (repo, _temp) = setup_test_repo().await;
    seed_users(&repo, 13).await;

    let all = repo.find_all(None).await.unwrap();
    assert_eq!(repo.count().await.unwrap(), all.len() as u64);
    assert_eq!(all.len(), 13);

    // Defaults: page 1, limit 10.
    let first = repo.find_all(Some(&Pagination::default())).await.unwrap();
    assert_eq!(first.len(), 10);
}

#[tokio::test]
async fn test_find_page_reports_totals() {
    let (repo, _temp) = setup_test_repo().await;
    seed_users(&repo, 23).await;

    let page = repo
        .find_page(&[], &Pagination::new(3, 10).sorted_by("email", SortOrder::Asc))
        .await
        .unwrap();
    assert_eq!(page.total, 23);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.content.len(), 3);
    assert_eq!(page.page, 3);
}

#[tokio::test]
async fn test_invalid_pagination_rejected() {
    let (repo, _temp) = setup_test_repo().await;

    let err = repo
        .find_all(Some(&Pagination::new(0, 10)))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidPagination(_)));

    let err = repo
        .find_all(Some(&Pagination::new(1, 10).sorted_by("password", SortOrder::Asc)))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidField { .. }));
}

#[tokio::test]
async fn test_create_many_preserves_order_with_unique_ids() {
    let (repo, _temp) = setup_test_repo().await;

    let input = vec![new_user("a@x.com"), new_user("b@x.com"), new_user("c@x.com")];
    let created = repo.create_many(&input).await.unwrap();

    assert_eq!(created.len(), 3);
    let emails: Vec<_> = created.iter().map(|u| u.email.as_str()).collect();
    assert_eq!(emails, vec!["a@x.com", "b@x.com", "c@x.com"]);

    let mut ids: Vec<_> = created.iter().map(|u| u.id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 3);
}

#[tokio::test]
async fn test_create_many_is_all_or_nothing() {
    let (repo, _temp) = setup_test_repo().await;

    let input = vec![new_user("a@x.com"), new_user("b@x.com"), new_user("a@x.com")];
    let err = repo.create_many(&input).await.unwrap_err();
    assert!(err.is_constraint_violation());
    assert_eq!(repo.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_duplicate_email_is_constraint_violation() {
    let (repo, _temp) = setup_test_repo().await;

    repo.create(&new_user("a@b.com")).await.unwrap();
    let err = repo.create(&new_user("a@b.com")).await.unwrap_err();

    assert!(
        matches!(err, StoreError::ConstraintViolation(_)),
        "unexpected error: {:?}",
        err
    );
    assert_eq!(repo.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_find_by_and_find_one_by() {
    let (repo, _temp) = setup_test_repo().await;

    repo.create(&new_user("a@x.com").with_name("Sam", "One"))
        .await
        .unwrap();
    repo.create(&new_user("b@x.com").with_name("Sam", "Two"))
        .await
        .unwrap();
    repo.create(&new_user("c@x.com").with_name("Alex", "Three"))
        .await
        .unwrap();

    let sams = repo.find_by("first_name", "Sam").await.unwrap();
    assert_eq!(sams.len(), 2);
    assert!(sams.iter().all(|u| u.first_name.as_deref() == Some("Sam")));

    let alex = repo.find_one_by("first_name", "Alex").await.unwrap().unwrap();
    assert_eq!(alex.email, "c@x.com");

    assert!(repo.find_one_by("first_name", "Kim").await.unwrap().is_none());
    assert!(repo.find_by("first_name", "Kim").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_find_where_conditions() {
    let (repo, _temp) = setup_test_repo().await;

    repo.create(&new_user("alice@example.com").with_name("Alice", "A"))
        .await
        .unwrap();
    repo.create(&new_user("BOB@Example.com").with_name("Bob", "B"))
        .await
        .unwrap();
    repo.create(&new_user("carol@other.org")).await.unwrap();

    let in_list = repo
        .find_where(
            &[Condition::in_list("first_name", ["Alice", "Bob"])],
            None,
        )
        .await
        .unwrap();
    assert_eq!(in_list.len(), 2);

    let unnamed = repo
        .find_where(&[Condition::is_null("first_name")], None)
        .await
        .unwrap();
    assert_eq!(unnamed.len(), 1);
    assert_eq!(unnamed[0].email, "carol@other.org");

    let example = repo
        .find_where(&[Condition::ilike("email", "example.COM")], None)
        .await
        .unwrap();
    assert_eq!(example.len(), 2);

    let not_bob = repo
        .find_where(
            &[
                Condition::ilike("email", "example"),
                Condition::ne("first_name", "Bob"),
            ],
            None,
        )
        .await
        .unwrap();
    assert_eq!(not_bob.len(), 1);
    assert_eq!(not_bob[0].email, "alice@example.com");

    assert_eq!(
        repo.count_where(&[Condition::is_not_null("first_name")])
            .await
            .unwrap(),
        2
    );
}

#[tokio::test]
async fn test_like_respects_case_and_ilike_does_not() {
    let (repo, _temp) = setup_test_repo().await;

    repo.create(&new_user("upper@x.com").with_name("Alice", "A"))
        .await
        .unwrap();
    repo.create(&new_user("lower@x.com").with_name("alice", "a"))
        .await
        .unwrap();

    let exact = repo
        .find_where(&[Condition::like("first_name", "Ali")], None)
        .await
        .unwrap();
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].email, "upper@x.com");

    let folded = repo
        .find_where(&[Condition::ilike("first_name", "Ali")], None)
        .await
        .unwrap();
    assert_eq!(folded.len(), 2);

    // Wildcard characters are literal.
    assert!(repo
        .find_where(&[Condition::like("first_name", "A%")], None)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_out_of_range_page_is_rejected() {
    let (repo, _temp) = setup_test_repo().await;
    seed_users(&repo, 1).await;

    let err = repo
        .find_all(Some(&Pagination::new(u32::MAX, u32::MAX)))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidPagination(_)));

    let err = repo
        .find_page(&[], &Pagination::new(u32::MAX, u32::MAX))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidPagination(_)));

    // A far but valid page is simply empty.
    let far = repo
        .find_all(Some(&Pagination::new(u32::MAX, 1)))
        .await
        .unwrap();
    assert!(far.is_empty());
}

#[tokio::test]
async fn test_between_and_not_in() {
    let (repo, _temp) = setup_test_repo().await;
    seed_users(&repo, 6).await;

    let middle = repo
        .find_where(
            &[Condition::between("email", "user02@example.com", "user04@example.com")],
            Some(&Pagination::new(1, 10).sorted_by("email", SortOrder::Asc)),
        )
        .await
        .unwrap();
    let emails: Vec<_> = middle.iter().map(|u| u.email.as_str()).collect();
    assert_eq!(
        emails,
        vec!["user02@example.com", "user03@example.com", "user04@example.com"]
    );

    let rest = repo
        .count_where(&[Condition::not_in(
            "email",
            ["user00@example.com", "user05@example.com"],
        )])
        .await
        .unwrap();
    assert_eq!(rest, 4);
}

#[tokio::test]
async fn test_delete_where_removes_matching_rows() {
    let (repo, _temp) = setup_test_repo().await;
    seed_users(&repo, 5).await;

    let removed = repo
        .delete_where(&[Condition::in_list(
            "email",
            ["user00@example.com", "user01@example.com", "nobody@example.com"],
        )])
        .await
        .unwrap();
    assert_eq!(removed, 2);
    assert_eq!(repo.count().await.unwrap(), 3);
}

#[tokio::test]
async fn test_concurrent_creates() {
    let (repo, _temp) = setup_test_repo().await;

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..10 {
        let repo = repo.clone();
        tasks.spawn(async move { repo.create(&new_user(&format!("c{}@x.com", i))).await });
    }
    while let Some(result) = tasks.join_next().await {
        result.expect("task panicked").expect("create failed");
    }

    assert_eq!(repo.count().await.unwrap(), 10);
}
