//! Relation counts on records loaded through a select.

use lifeguard_support::relation::{count_from_row, CountTarget};
use lifeguard_support::test_helpers::MockExecutor;
use lifeguard_support::value::Attributes;
use lifeguard_support::{LifeEntity, SelectQuery};
use sea_query::Value;
use std::sync::Arc;

struct Post;

impl LifeEntity for Post {
    fn table_name(&self) -> &str {
        "posts"
    }
}

struct Comment;

impl LifeEntity for Comment {
    fn table_name(&self) -> &str {
        "comments"
    }
}

fn attrs(pairs: &[(&str, Value)]) -> Attributes {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[test]
fn each_record_keeps_its_own_cache() {
    let executor = MockExecutor::new()
        .with_rows(vec![
            attrs(&[("id", Value::Int(Some(1)))]),
            attrs(&[("id", Value::Int(Some(2)))]),
        ])
        .with_rows(vec![attrs(&[
            ("post_id", Value::Int(Some(1))),
            ("count", Value::BigInt(Some(4))),
        ])])
        .with_rows(Vec::new());

    let mut records = SelectQuery::new(Arc::new(Post)).all(&executor).unwrap();
    let target = CountTarget::new(Arc::new(Comment));

    assert_eq!(records[0].relation_count(&executor, "comments", &target).unwrap(), 4);
    assert_eq!(records[1].relation_count(&executor, "comments", &target).unwrap(), 0);
    // Both answers are cached now
    assert_eq!(records[0].relation_count(&executor, "comments", &target).unwrap(), 4);
    assert_eq!(records[1].relation_count(&executor, "comments", &target).unwrap(), 0);
    assert_eq!(executor.statement_count(), 3);

    let statements = executor.statements();
    assert_eq!(statements[1].values.0[0], Value::Int(Some(1)));
    assert_eq!(statements[2].values.0[0], Value::Int(Some(2)));
}

#[test]
fn filtered_counts_get_separate_slots() {
    let executor = MockExecutor::new()
        .with_rows(vec![attrs(&[("count", Value::BigInt(Some(2)))])])
        .with_rows(vec![attrs(&[("count", Value::BigInt(Some(5)))])]);

    let mut post = SelectQuery::new(Arc::new(Post))
        .all(&MockExecutor::new().with_rows(vec![attrs(&[("id", Value::Int(Some(9)))])]))
        .unwrap()
        .remove(0);
    let target = CountTarget::new(Arc::new(Comment));

    let mut approved = "comments".to_string();
    let mut pending = "comments".to_string();
    let approved_count = post
        .relation_count_where(&executor, &mut approved, "approved", true, &target)
        .unwrap();
    let pending_count = post
        .relation_count_where(&executor, &mut pending, "approved", false, &target)
        .unwrap();

    assert_eq!(approved, "commentsapproved_1");
    assert_eq!(pending, "commentsapproved_");
    assert_eq!((approved_count, pending_count), (2, 5));
    assert_eq!(post.count_cache().len(), 2);

    let row = post
        .relation_count_object(&executor, "commentsapproved_1", &target)
        .unwrap();
    assert_eq!(count_from_row(row), 2);
    assert_eq!(executor.statement_count(), 2);
}
