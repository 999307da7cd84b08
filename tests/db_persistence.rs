#[cfg(test)]
mod tests {
    use inkrelay::db::connection;
    use inkrelay::db::service::DbService;
    use inkrelay::db::User;
    use std::sync::{Arc, Mutex};
    use uuid::Uuid;

    fn get_test_db() -> duckdb::Connection {
        let conn = duckdb::Connection::open_in_memory().unwrap();
        connection::init_schema(&conn).unwrap();
        conn
    }

    fn seed_user(conn: &duckdb::Connection, name: &str) -> User {
        DbService::create_user(conn, &format!("sub-{name}"), name, None, None).unwrap()
    }

    #[test]
    fn test_user_lifecycle() {
        let conn = get_test_db();

        let user = DbService::create_user(
            &conn,
            "firebase-uid-1",
            "inga",
            Some("Inga Writer"),
            Some("https://cdn.example/avatar.png"),
        )
        .unwrap();
        assert_eq!(user.username, "inga");
        assert_eq!(user.display_name.as_deref(), Some("Inga Writer"));
        assert!(!user.is_online);

        let by_subject = DbService::find_user_by_subject(&conn, "firebase-uid-1")
            .unwrap()
            .unwrap();
        assert_eq!(by_subject.id, user.id);

        let missing = DbService::find_user_by_subject(&conn, "no-such-subject").unwrap();
        assert!(missing.is_none());

        DbService::set_presence(&conn, user.id, true).unwrap();
        let online = DbService::get_user(&conn, user.id).unwrap().unwrap();
        assert!(online.is_online);

        DbService::set_presence(&conn, user.id, false).unwrap();
        let offline = DbService::get_user(&conn, user.id).unwrap().unwrap();
        assert!(!offline.is_online);
    }

    #[test]
    fn test_message_lifecycle() {
        let conn = get_test_db();
        let alice = seed_user(&conn, "alice");
        let bob = seed_user(&conn, "bob");

        let m1 = DbService::insert_message(&conn, &alice, bob.id, "first").unwrap();
        let m2 = DbService::insert_message(&conn, &bob, alice.id, "second").unwrap();
        let m3 = DbService::insert_message(&conn, &alice, bob.id, "third").unwrap();

        assert_eq!(m1.sender_id, alice.id);
        assert_eq!(m1.receiver_id, bob.id);
        assert_eq!(m1.sender.username, "alice");
        assert!(!m1.is_read);

        // Both directions of the pair come back chronologically
        let history = DbService::conversation(&conn, alice.id, bob.id, 50, 0).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].id, m1.id);
        assert_eq!(history[1].id, m2.id);
        assert_eq!(history[2].id, m3.id);

        let total = DbService::conversation_total(&conn, alice.id, bob.id).unwrap();
        assert_eq!(total, 3);

        assert_eq!(DbService::unread_count(&conn, bob.id).unwrap(), 2);
        assert_eq!(DbService::unread_count(&conn, alice.id).unwrap(), 1);
    }

    #[test]
    fn test_mark_read_scoped_to_receiver_inbox() {
        let conn = get_test_db();
        let alice = seed_user(&conn, "alice");
        let bob = seed_user(&conn, "bob");
        let carol = seed_user(&conn, "carol");

        let to_bob = DbService::insert_message(&conn, &alice, bob.id, "for bob").unwrap();
        let to_carol = DbService::insert_message(&conn, &alice, carol.id, "for carol").unwrap();

        // Bob tries to flip both his own message and Carol's
        let flipped = DbService::mark_read(&conn, bob.id, &[to_bob.id, to_carol.id]).unwrap();
        assert_eq!(flipped, vec![(to_bob.id, alice.id)]);

        assert_eq!(DbService::unread_count(&conn, bob.id).unwrap(), 0);
        assert_eq!(DbService::unread_count(&conn, carol.id).unwrap(), 1);

        // Re-reading already-read messages flips nothing
        let again = DbService::mark_read(&conn, bob.id, &[to_bob.id]).unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let conn = get_test_db();
        let bob = seed_user(&conn, "bob");

        let flipped = DbService::mark_read(&conn, bob.id, &[9999]).unwrap();
        assert!(flipped.is_empty());

        let nobody = Uuid::new_v4();
        let history = DbService::conversation(&conn, bob.id, nobody, 50, 0).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn test_pool_is_shareable() {
        let conn = get_test_db();
        let pool = Arc::new(Mutex::new(conn));
        let cloned = pool.clone();
        let guard = cloned.lock().unwrap();
        let user = seed_user(&guard, "dora");
        assert_eq!(user.username, "dora");
    }
}
