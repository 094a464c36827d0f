use media_relay_bot::search::ResultItem;
use media_relay_bot::session::{CallbackAction, CallbackToken, NotFound, SessionResultStore};
use proptest::prelude::*;
use std::time::Duration;

fn store() -> SessionResultStore<String, ResultItem> {
    SessionResultStore::new(1_000, Duration::from_secs(600))
}

fn titled(title: &str) -> ResultItem {
    ResultItem {
        title: title.to_string(),
        artist: String::new(),
        preview_url: None,
        link: format!("https://example.com/{title}"),
    }
}

fn item_strategy() -> impl Strategy<Value = ResultItem> {
    (
        "[a-zA-Z0-9 ]{0,20}",
        "[a-zA-Z ]{0,12}",
        proptest::option::of("https://cdn\\.example/[a-z0-9]{1,8}\\.mp3"),
        "https://example\\.com/track/[0-9]{1,6}",
    )
        .prop_map(|(title, artist, preview_url, link)| ResultItem {
            title,
            artist,
            preview_url,
            link,
        })
}

#[test]
fn chat_scenario() {
    let store = store();
    store.put("chat1".to_string(), vec![titled("A"), titled("B")]);

    assert_eq!(store.resolve(&"chat1".to_string(), 1), Ok(titled("B")));
    assert!(matches!(
        store.resolve(&"chat1".to_string(), 5),
        Err(NotFound::IndexOutOfRange { index: 5, len: 2 })
    ));
    assert_eq!(
        store.resolve(&"chat2".to_string(), 0),
        Err(NotFound::EmptySession)
    );
}

#[test]
fn button_payload_resolves_through_store() -> Result<(), Box<dyn std::error::Error>> {
    let store = store();
    let key = "chat1".to_string();
    let generation = store.put(key.clone(), vec![titled("A"), titled("B")]);

    let data = CallbackAction::pick(1, generation).encode();
    let CallbackAction::Pick(token) = data.parse::<CallbackAction>()? else {
        panic!("expected a pick action");
    };
    assert_eq!(store.resolve_token(&key, token), Ok(titled("B")));

    // A newer search makes the old button stale
    store.put(key.clone(), vec![titled("X"), titled("Y")]);
    assert!(matches!(
        store.resolve_token(&key, token),
        Err(NotFound::StaleToken { .. })
    ));
    Ok(())
}

proptest! {
    /// Every stored item is returned at its own index.
    #[test]
    fn resolves_every_index(key in "[a-z0-9]{1,8}", items in prop::collection::vec(item_strategy(), 0..20)) {
        let store = store();
        store.put(key.clone(), items.clone());

        for (i, item) in items.iter().enumerate() {
            prop_assert_eq!(store.resolve(&key, i), Ok(item.clone()));
        }
    }

    /// Indices at or past the end never resolve.
    #[test]
    fn rejects_out_of_range(
        items in prop::collection::vec(item_strategy(), 0..10),
        extra in 0usize..1_000,
    ) {
        let store = store();
        let key = "chat".to_string();
        store.put(key.clone(), items.clone());

        let index = items.len() + extra;
        prop_assert_eq!(
            store.resolve(&key, index),
            Err(NotFound::IndexOutOfRange { index, len: items.len() })
        );
    }

    /// Sessions without a prior put resolve nothing.
    #[test]
    fn unknown_session_is_empty(key in "[a-z0-9]{1,8}", index in any::<usize>()) {
        let store = store();
        store.put(format!("other-{key}"), vec![titled("A")]);

        prop_assert_eq!(store.resolve(&key, index), Err(NotFound::EmptySession));
    }

    /// A second put fully replaces the first.
    #[test]
    fn latest_put_wins(
        first in prop::collection::vec(item_strategy(), 0..10),
        second in prop::collection::vec(item_strategy(), 0..10),
    ) {
        let store = store();
        let key = "chat".to_string();
        let old = store.put(key.clone(), first.clone());
        let new = store.put(key.clone(), second.clone());

        for i in 0..first.len().max(second.len()) {
            match second.get(i) {
                Some(item) => {
                    prop_assert_eq!(store.resolve(&key, i), Ok(item.clone()));
                }
                None => {
                    prop_assert!(store.resolve(&key, i).is_err());
                }
            }
            prop_assert!(store.resolve_token(&key, CallbackToken::new(i, Some(old))).is_err());
        }
        if !second.is_empty() {
            prop_assert_eq!(
                store.resolve_token(&key, CallbackToken::new(0, Some(new))),
                Ok(second[0].clone())
            );
        }
    }

    /// Any non-numeric or signed index is rejected by the payload parser.
    #[test]
    fn rejects_malformed_pick_payloads(index in "-[0-9]{1,5}|[a-z]{1,5}|[0-9]{1,3}[a-z]") {
        let data = format!("pick:{index}");
        prop_assert!(data.parse::<CallbackAction>().is_err());
    }
}
