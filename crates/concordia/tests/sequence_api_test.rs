//! Integration tests for the public sequence API.

use concordia::{
    CollectionChange, KeyEquivalence, Notification, PropertyName, SequenceConfig, SequenceError,
    SynchronizedSequence, UniqueSynchronizedSequence,
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct User {
    id: u32,
    name: &'static str,
}

#[test]
fn test_unique_scenario_through_channel() {
    let seq = UniqueSynchronizedSequence::from_source([1, 2, 3]);
    let (_sub, rx) = seq.subscribe_channel().unwrap();

    assert!(!seq.add(3).unwrap());
    assert_eq!(seq.len().unwrap(), 3);
    assert!(rx.try_recv().is_err());

    assert!(seq.add(4).unwrap());
    assert_eq!(seq.len().unwrap(), 4);
    let events: Vec<_> = rx.try_iter().collect();
    assert_eq!(
        events,
        vec![
            Notification::Property(PropertyName::Count),
            Notification::Property(PropertyName::Items),
            Notification::Change(CollectionChange::Add {
                items: vec![4],
                index: 3
            }),
        ]
    );

    seq.move_item(3, 0).unwrap();
    assert_eq!(seq.get(0).unwrap(), 4);
    assert_eq!(seq.len().unwrap(), 4);
}

#[test]
fn test_config_from_toml() {
    let config = SequenceConfig::from_toml_str(
        r#"
        label = "users"
        initial_capacity = 32
        feed_capacity = 2
        "#,
    )
    .unwrap();

    let seq: SynchronizedSequence<u32> = SynchronizedSequence::with_config(config);
    assert_eq!(seq.config().label, "users");
    assert!(seq.capacity().unwrap() >= 32);

    let (_sub, rx) = seq.subscribe_channel().unwrap();
    seq.add(1).unwrap();

    // Count, Item[] fit; the Add is dropped for this subscriber only.
    assert_eq!(rx.len(), 2);
    assert_eq!(seq.len().unwrap(), 1);
}

#[test]
fn test_invalid_config_is_rejected() {
    assert!(SequenceConfig::from_toml_str("feed_capacity = 0").is_err());
    assert!(SequenceConfig::from_toml_str("label = [").is_err());
}

#[test]
fn test_users_keyed_by_id() {
    let users = UniqueSynchronizedSequence::from_source_with_equivalence(
        [
            User { id: 1, name: "ada" },
            User { id: 2, name: "grace" },
            User { id: 1, name: "ada again" },
        ],
        KeyEquivalence::new(|user: &User| user.id),
    );

    assert_eq!(users.len().unwrap(), 2);
    assert!(!users.add(User { id: 2, name: "imposter" }).unwrap());
    assert!(users.contains(&User { id: 1, name: "anyone" }).unwrap());

    assert!(users.set(0, User { id: 1, name: "ada lovelace" }).unwrap());
    assert!(!users.set(0, User { id: 2, name: "clash" }).unwrap());
    assert_eq!(users.get(0).unwrap().name, "ada lovelace");
}

#[test]
fn test_dispose_three_times() {
    let seq = UniqueSynchronizedSequence::from_source(["a", "b"]);
    seq.dispose();
    seq.dispose();
    seq.dispose();

    assert!(seq.is_disposed());
    assert_eq!(seq.remove_at(0), Err(SequenceError::Disposed));
}

#[test]
fn test_remove_at_out_of_range() {
    let seq = SynchronizedSequence::from_source([1, 2, 3]);
    assert_eq!(
        seq.remove_at(999),
        Err(SequenceError::IndexOutOfRange { index: 999, len: 3 })
    );
    assert_eq!(seq.to_vec().unwrap(), vec![1, 2, 3]);
}
