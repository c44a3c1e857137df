//! Derived finders end to end: `#[derive(Entity)]`, `repository!` and an
//! in-memory store that evaluates compiled predicates.

use fake::faker::internet::en::{FreeEmail, Username};
use fake::Fake;
use lifequery::query::error::BindErrorKind;
use lifequery::query::parser::ParseError;
use lifequery::query::signature::{ReturnKind, SignatureError};
use lifequery::{
    args, Arg, CallError, CompiledQuery, Entity, EntityStore, QueryContext, Repository, Signature,
};
use sea_query::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Entity, Debug, Clone, PartialEq)]
#[table_name = "users"]
pub struct User {
    #[primary_key]
    pub id: i64,
    pub user_name: String,
    pub email: String,
    pub status: String,
}

lifequery::repository! {
    pub struct UserRepository<User> {
        fn FindByUserName(user_name: String) -> User;
        fn FindByUserNameAndEmail(user_name: String, email: String) -> User;
        fn FindAllByStatusAndEmailAndUserName(status: String, email: String, user_name: String) -> Vec<User>;
        fn FindAllByStatusInOrderByIdDesc(statuses: Vec<String>) -> Vec<User>;
        fn FindAllByEmailIsNotNullOrderByIdDesc() -> Vec<User>;
    }
}

lifequery::repository! {
    pub struct MisspelledRepository<User> {
        fn FindByUsername(user_name: String) -> User;
    }
}

/// Evaluates `(a = ? AND b IN (?)) OR (...)` over an in-memory table
#[derive(Default)]
struct MemoryStore {
    rows: Vec<User>,
    calls: AtomicUsize,
}

impl MemoryStore {
    fn with_rows(rows: Vec<User>) -> Self {
        Self {
            rows,
            calls: AtomicUsize::new(0),
        }
    }

    fn matching(&self, query: &CompiledQuery, args: &[Arg]) -> Vec<User> {
        let mut rows: Vec<User> = self
            .rows
            .iter()
            .filter(|user| matches(user, &query.predicate, args))
            .cloned()
            .collect();
        if query.order_by == "id DESC" {
            rows.sort_by(|a, b| b.id.cmp(&a.id));
        }
        rows
    }
}

fn column(user: &User, name: &str) -> Value {
    match name {
        "id" => user.id.into(),
        "user_name" => user.user_name.as_str().into(),
        "email" => user.email.as_str().into(),
        "status" => user.status.as_str().into(),
        other => panic!("unexpected column {other}"),
    }
}

fn matches(user: &User, predicate: &str, args: &[Arg]) -> bool {
    let mut args = args.iter();
    let mut any = false;
    for group in predicate.split(" OR ") {
        let group = group.trim_start_matches('(').trim_end_matches(')');
        let mut all = true;
        for term in group.split(" AND ") {
            let value = column(user, term.split(' ').next().unwrap_or_default());
            if term.ends_with(" IS NOT NULL") {
                continue;
            }
            let ok = match args.next() {
                Some(Arg::Value(arg)) if term.ends_with(" = ?") => *arg == value,
                Some(Arg::List(list)) if term.ends_with(" IN (?") => list.contains(&value),
                other => panic!("unsupported term {term} with {other:?}"),
            };
            all &= ok;
        }
        any |= all;
    }
    any
}

impl EntityStore<User> for MemoryStore {
    fn execute_single(
        &self,
        ctx: &QueryContext,
        query: &CompiledQuery,
        args: &[Arg],
    ) -> Result<User, CallError> {
        ctx.check()?;
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.matching(query, args);
        rows.sort_by_key(|user| user.id);
        rows.into_iter().next().ok_or(CallError::NotFound)
    }

    fn execute_many(
        &self,
        ctx: &QueryContext,
        query: &CompiledQuery,
        args: &[Arg],
    ) -> Result<Vec<User>, CallError> {
        ctx.check()?;
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.matching(query, args))
    }
}

fn user(id: i64, user_name: &str, email: &str, status: &str) -> User {
    User {
        id,
        user_name: user_name.to_string(),
        email: email.to_string(),
        status: status.to_string(),
    }
}

fn fixtures() -> Vec<User> {
    vec![
        user(1, "ada", "ada@example.com", "active"),
        user(2, "grace", "grace@example.com", "active"),
        user(3, "linus", "linus@example.com", "banned"),
        user(4, "ada", "ada@work.example", "pending"),
    ]
}

#[test]
fn test_single_finder_returns_first_match() {
    let users = UserRepository::new(MemoryStore::with_rows(fixtures())).unwrap();
    let ctx = QueryContext::background();

    let ada = users.FindByUserName(&ctx, "ada".to_string()).unwrap();
    assert_eq!(ada.id, 1);

    let ada = users
        .FindByUserNameAndEmail(&ctx, "ada".to_string(), "ada@work.example".to_string())
        .unwrap();
    assert_eq!(ada.id, 4);
}

#[test]
fn test_single_miss_is_not_found() {
    let users = UserRepository::new(MemoryStore::with_rows(fixtures())).unwrap();
    let ctx = QueryContext::background();

    let err = users.FindByUserName(&ctx, "nobody".to_string()).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_plural_miss_is_empty() {
    let users = UserRepository::new(MemoryStore::with_rows(fixtures())).unwrap();
    let ctx = QueryContext::background();

    let found = users
        .FindAllByStatusAndEmailAndUserName(
            &ctx,
            "active".to_string(),
            "ada@work.example".to_string(),
            "ada".to_string(),
        )
        .unwrap();
    assert!(found.is_empty());

    let found = users
        .FindAllByStatusAndEmailAndUserName(
            &ctx,
            "pending".to_string(),
            "ada@work.example".to_string(),
            "ada".to_string(),
        )
        .unwrap();
    assert_eq!(found, vec![fixtures()[3].clone()]);
}

#[test]
fn test_in_with_ordering() {
    let users = UserRepository::new(MemoryStore::with_rows(fixtures())).unwrap();
    let ctx = QueryContext::background();

    let found = users
        .FindAllByStatusInOrderByIdDesc(&ctx, vec!["active".to_string(), "banned".to_string()])
        .unwrap();
    let ids: Vec<i64> = found.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![3, 2, 1]);

    let found = users.FindAllByStatusInOrderByIdDesc(&ctx, Vec::new()).unwrap();
    assert!(found.is_empty());
}

#[test]
fn test_zero_argument_finder() {
    let users = UserRepository::new(MemoryStore::with_rows(fixtures())).unwrap();
    let ctx = QueryContext::background();

    let found = users.FindAllByEmailIsNotNullOrderByIdDesc(&ctx).unwrap();
    let ids: Vec<i64> = found.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![4, 3, 2, 1]);

    let finder = users
        .repository()
        .invocable("FindAllByEmailIsNotNullOrderByIdDesc")
        .unwrap();
    assert_eq!(finder.query().arity(), 0);
    assert_eq!(finder.query().predicate, "(email IS NOT NULL)");

    assert!(matches!(
        users
            .repository()
            .find_many("FindAllByEmailIsNotNullOrderByIdDesc", &ctx, &args!["extra"]),
        Err(CallError::Arity {
            expected: 0,
            actual: 1
        })
    ));
}

#[test]
fn test_argument_count_is_enforced_per_call() {
    let store = Arc::new(MemoryStore::with_rows(fixtures()));
    let variadic = Signature::new()
        .context()
        .variadic()
        .returns(ReturnKind::Single)
        .error();
    let users = Repository::<User, MemoryStore>::builder(Arc::clone(&store))
        .finder("FindByUserName", variadic)
        .finder("FindByUserNameAndEmail", Signature::single(2))
        .finder("FindAllByStatusAndEmailAndUserName", Signature::many(3))
        .build()
        .unwrap();
    let ctx = QueryContext::background();

    for (finder, expected) in [
        ("FindByUserName", 1),
        ("FindByUserNameAndEmail", 2),
        ("FindAllByStatusAndEmailAndUserName", 3),
    ] {
        let too_many: Vec<Arg> = (0..=expected).map(|_| Arg::Value("x".into())).collect();
        match users.invoke(finder, &ctx, &too_many) {
            Err(CallError::Arity {
                expected: e,
                actual,
            }) => {
                assert_eq!(e, expected, "{finder}");
                assert_eq!(actual, expected + 1, "{finder}");
            }
            other => panic!("{finder}: expected arity error, got {other:?}"),
        }
    }
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);

    let ada = users.find_one("FindByUserName", &ctx, &args!["ada"]).unwrap();
    assert_eq!(ada.id, 1);
}

#[test]
fn test_wrong_accessor_and_unknown_finder() {
    let users = Repository::<User, _>::builder(MemoryStore::with_rows(fixtures()))
        .finder("FindByUserName", Signature::single(1))
        .build()
        .unwrap();
    let ctx = QueryContext::background();

    assert!(matches!(
        users.find_many("FindByUserName", &ctx, &args!["ada"]),
        Err(CallError::Multiplicity { .. })
    ));
    assert!(matches!(
        users.find_one("FindByEmail", &ctx, &args!["ada"]),
        Err(CallError::UnknownFinder(name)) if name == "FindByEmail"
    ));
}

#[test]
fn test_cancellation_and_deadline() {
    let store = Arc::new(MemoryStore::with_rows(fixtures()));
    let users = UserRepository::<MemoryStore>::new(Arc::clone(&store)).unwrap();

    let root = QueryContext::background();
    let ctx = root.child();
    root.cancel();
    assert!(matches!(
        users.FindByUserName(&ctx, "ada".to_string()),
        Err(CallError::Cancelled)
    ));

    let expired = QueryContext::background().with_deadline(Instant::now());
    assert!(matches!(
        users.FindByUserName(&expired, "ada".to_string()),
        Err(CallError::DeadlineExceeded)
    ));

    let generous = QueryContext::background().with_timeout(Duration::from_secs(60));
    assert!(users.FindByUserName(&generous, "ada".to_string()).is_ok());
    assert_eq!(store.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_bad_declarations_fail_the_build() {
    let err = MisspelledRepository::new(MemoryStore::default()).err().unwrap();
    assert_eq!(err.finder, "FindByUsername");
    assert!(matches!(
        err.kind,
        BindErrorKind::Parse(ParseError::UnknownColumn { ref column, .. }) if column == "username"
    ));

    let err = Repository::<User, _>::builder(MemoryStore::default())
        .finder("FindAllByStatus", Signature::single(1))
        .build()
        .err()
        .unwrap();
    assert!(matches!(
        err.kind,
        BindErrorKind::Signature(SignatureError::MultiplicityMismatch { .. })
    ));

    let err = Repository::<User, _>::builder(MemoryStore::default())
        .finder("FindByStatus", Signature::single(1))
        .finder("FindByStatus", Signature::single(1))
        .build()
        .err()
        .unwrap();
    assert_eq!(err.kind, BindErrorKind::Duplicate);
}

#[test]
fn test_concurrent_callers_share_one_finder() {
    let rows: Vec<User> = (0..64)
        .map(|i| {
            let name = format!("{}-{i}", Username().fake::<String>());
            user(i, &name, &FreeEmail().fake::<String>(), "active")
        })
        .collect();
    let users = Arc::new(UserRepository::new(MemoryStore::with_rows(rows.clone())).unwrap());

    let handles: Vec<_> = rows
        .into_iter()
        .map(|expected| {
            let users = Arc::clone(&users);
            may::go!(move || {
                let ctx = QueryContext::background();
                let found = users
                    .FindByUserName(&ctx, expected.user_name.clone())
                    .unwrap();
                assert_eq!(found, expected);
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
