#[cfg(test)]
mod tests {
    use inkrelay::db::{connection, service::DbService, DbPool, User};
    use inkrelay::realtime::events::ServerEvent;
    use inkrelay::realtime::{MessagingChannel, PresenceTracker, RealtimeError, SessionRegistry};
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc::{self, UnboundedReceiver};
    use uuid::Uuid;

    fn test_pool() -> DbPool {
        let conn = duckdb::Connection::open_in_memory().unwrap();
        connection::init_schema(&conn).unwrap();
        Arc::new(Mutex::new(conn))
    }

    fn seed_user(pool: &DbPool, name: &str) -> User {
        let conn = pool.lock().unwrap();
        DbService::create_user(&conn, &format!("sub-{name}"), name, None, None).unwrap()
    }

    fn session() -> (Uuid, mpsc::UnboundedSender<ServerEvent>, UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Uuid::new_v4(), tx, rx)
    }

    fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn registry_tracks_multi_device_presence() {
        let registry = SessionRegistry::new();
        let user = Uuid::new_v4();
        let (c1, tx1, _rx1) = session();
        let (c2, tx2, _rx2) = session();

        assert!(!registry.is_online(user));
        assert!(registry.register(user, c1, tx1));
        assert!(!registry.register(user, c2, tx2));
        assert!(registry.is_online(user));
        assert_eq!(registry.session_count(user), 2);

        assert!(!registry.unregister(user, c1));
        assert!(registry.is_online(user));
        assert!(registry.unregister(user, c2));
        assert!(!registry.is_online(user));
        assert_eq!(registry.session_count(user), 0);
    }

    #[test]
    fn registry_fans_out_to_every_session_of_a_user() {
        let registry = SessionRegistry::new();
        let user = Uuid::new_v4();
        let (c1, tx1, mut rx1) = session();
        let (c2, tx2, mut rx2) = session();
        registry.register(user, c1, tx1);
        registry.register(user, c2, tx2);

        let delivered =
            registry.send_to_user(user, ServerEvent::TypingStop { user_id: user });
        assert_eq!(delivered, 2);
        assert_eq!(drain(&mut rx1).len(), 1);
        assert_eq!(drain(&mut rx2).len(), 1);

        assert_eq!(
            registry.send_to_user(Uuid::new_v4(), ServerEvent::TypingStop { user_id: user }),
            0
        );
    }

    #[test]
    fn presence_mirrors_registry_transitions_into_store() {
        let pool = test_pool();
        let registry = Arc::new(SessionRegistry::new());
        let presence = PresenceTracker::new(registry.clone(), pool.clone());

        let alice = seed_user(&pool, "alice");
        let bob = seed_user(&pool, "bob");

        // Bob is connected and should observe Alice's transitions
        let (bob_conn, bob_tx, mut bob_rx) = session();
        presence.connected(&bob, bob_conn, bob_tx);
        drain(&mut bob_rx);

        let (a1, a1_tx, _a1_rx) = session();
        let (a2, a2_tx, _a2_rx) = session();
        presence.connected(&alice, a1, a1_tx);
        presence.connected(&alice, a2, a2_tx);

        let online_events = drain(&mut bob_rx);
        assert!(online_events.iter().all(|e| matches!(
            e,
            ServerEvent::UserOnline { user_id, .. } if *user_id == alice.id
        )));

        {
            let conn = pool.lock().unwrap();
            assert!(DbService::get_user(&conn, alice.id).unwrap().unwrap().is_online);
        }

        // First disconnect leaves the user online (one device remains)
        presence.disconnected(&alice, a1);
        assert!(presence.is_online(alice.id));
        assert!(drain(&mut bob_rx).is_empty());
        {
            let conn = pool.lock().unwrap();
            assert!(DbService::get_user(&conn, alice.id).unwrap().unwrap().is_online);
        }

        // Last disconnect flips the flag and announces offline
        presence.disconnected(&alice, a2);
        assert!(!presence.is_online(alice.id));
        let offline_events = drain(&mut bob_rx);
        assert_eq!(offline_events.len(), 1);
        assert!(matches!(
            offline_events[0],
            ServerEvent::UserOffline { user_id } if user_id == alice.id
        ));
        {
            let conn = pool.lock().unwrap();
            assert!(!DbService::get_user(&conn, alice.id).unwrap().unwrap().is_online);
        }
    }

    #[test]
    fn send_rejects_empty_content_and_nil_receiver() {
        let pool = test_pool();
        let registry = Arc::new(SessionRegistry::new());
        let channel = MessagingChannel::new(registry, pool.clone());
        let alice = seed_user(&pool, "alice");
        let bob = seed_user(&pool, "bob");

        let err = channel.send(&alice, bob.id, "   ").unwrap_err();
        assert!(matches!(err, RealtimeError::Validation(_)));

        let err = channel.send(&alice, Uuid::nil(), "hello").unwrap_err();
        assert!(matches!(err, RealtimeError::Validation(_)));

        let conn = pool.lock().unwrap();
        assert_eq!(DbService::unread_count(&conn, bob.id).unwrap(), 0);
    }

    #[test]
    fn send_persists_before_delivery_and_acks_offline_receivers() {
        let pool = test_pool();
        let registry = Arc::new(SessionRegistry::new());
        let channel = MessagingChannel::new(registry.clone(), pool.clone());
        let alice = seed_user(&pool, "alice");
        let bob = seed_user(&pool, "bob");

        // Bob has no sessions: store-and-forward still succeeds
        let message = channel.send(&alice, bob.id, "  hello bob  ").unwrap();
        assert_eq!(message.content, "hello bob");
        {
            let conn = pool.lock().unwrap();
            assert_eq!(DbService::unread_count(&conn, bob.id).unwrap(), 1);
        }

        // Bob comes online: the receive event carries the already-persisted row
        let (bob_conn, bob_tx, mut bob_rx) = session();
        registry.register(bob.id, bob_conn, bob_tx);

        let sent = channel.send(&alice, bob.id, "second").unwrap();
        let events = drain(&mut bob_rx);
        assert_eq!(events.len(), 1);
        match &events[0] {
            ServerEvent::MessageReceive(received) => {
                assert_eq!(received.id, sent.id);
                assert_eq!(received.content, "second");
                let conn = pool.lock().unwrap();
                let history =
                    DbService::conversation(&conn, alice.id, bob.id, 50, 0).unwrap();
                assert!(history.iter().any(|m| m.id == received.id));
            }
            other => panic!("expected message:receive, got {other:?}"),
        }
    }

    #[test]
    fn delivery_order_matches_send_order_per_pair() {
        let pool = test_pool();
        let registry = Arc::new(SessionRegistry::new());
        let channel = MessagingChannel::new(registry.clone(), pool.clone());
        let alice = seed_user(&pool, "alice");
        let bob = seed_user(&pool, "bob");

        let (bob_conn, bob_tx, mut bob_rx) = session();
        registry.register(bob.id, bob_conn, bob_tx);

        for content in ["one", "two", "three"] {
            channel.send(&alice, bob.id, content).unwrap();
        }

        let received: Vec<String> = drain(&mut bob_rx)
            .into_iter()
            .map(|e| match e {
                ServerEvent::MessageReceive(m) => m.content,
                other => panic!("expected message:receive, got {other:?}"),
            })
            .collect();
        assert_eq!(received, vec!["one", "two", "three"]);
    }

    #[test]
    fn mark_read_echoes_receipts_to_original_senders_only() {
        let pool = test_pool();
        let registry = Arc::new(SessionRegistry::new());
        let channel = MessagingChannel::new(registry.clone(), pool.clone());
        let alice = seed_user(&pool, "alice");
        let bob = seed_user(&pool, "bob");
        let carol = seed_user(&pool, "carol");

        let to_bob = channel.send(&alice, bob.id, "for bob").unwrap();
        let to_carol = channel.send(&alice, carol.id, "for carol").unwrap();

        // Alice is online on two devices; both should see the receipt
        let (a1, a1_tx, mut a1_rx) = session();
        let (a2, a2_tx, mut a2_rx) = session();
        registry.register(alice.id, a1, a1_tx);
        registry.register(alice.id, a2, a2_tx);

        // Bob marks both ids; Carol's message must be untouched
        channel.mark_read(bob.id, &[to_bob.id, to_carol.id]).unwrap();

        for rx in [&mut a1_rx, &mut a2_rx] {
            let events = drain(rx);
            assert_eq!(events.len(), 1);
            match &events[0] {
                ServerEvent::MessageRead {
                    message_ids,
                    read_by,
                } => {
                    assert_eq!(message_ids, &vec![to_bob.id]);
                    assert_eq!(*read_by, bob.id);
                }
                other => panic!("expected message:read, got {other:?}"),
            }
        }

        let conn = pool.lock().unwrap();
        assert_eq!(DbService::unread_count(&conn, bob.id).unwrap(), 0);
        assert_eq!(DbService::unread_count(&conn, carol.id).unwrap(), 1);
    }

    #[test]
    fn typing_indicators_are_dropped_for_offline_recipients() {
        let pool = test_pool();
        let registry = Arc::new(SessionRegistry::new());
        let channel = MessagingChannel::new(registry.clone(), pool.clone());
        let alice = seed_user(&pool, "alice");
        let bob = seed_user(&pool, "bob");

        // No session for Bob: silently dropped
        channel.typing_start(&alice, bob.id);
        channel.typing_stop(&alice, bob.id);

        let (bob_conn, bob_tx, mut bob_rx) = session();
        registry.register(bob.id, bob_conn, bob_tx);

        channel.typing_start(&alice, bob.id);
        channel.typing_stop(&alice, bob.id);

        let events = drain(&mut bob_rx);
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            ServerEvent::TypingStart { user_id, username }
                if *user_id == alice.id && username == "alice"
        ));
        assert!(matches!(
            &events[1],
            ServerEvent::TypingStop { user_id } if *user_id == alice.id
        ));
    }
}
