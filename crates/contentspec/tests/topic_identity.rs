use contentspec::{SpecTopic, TopicIdentity};
use proptest::prelude::*;

fn flags(topic: &SpecTopic) -> [bool; 5] {
    [
        topic.is_new_topic(),
        topic.is_existing_topic(),
        topic.is_cloned_topic(),
        topic.is_duplicate_topic(),
        topic.is_cloned_duplicate_topic(),
    ]
}

#[test]
fn each_known_shape_has_exactly_one_identity() {
    for id in ["N", "N3", "12", "C12", "X12", "XC12"] {
        let topic = SpecTopic::new(id);
        let matches = flags(&topic).iter().filter(|flag| **flag).count();
        assert_eq!(matches, 1, "{id} matched {matches} identities");
    }
}

proptest! {
    #[test]
    fn identities_never_overlap(prefix in prop::sample::select(vec!["", "N", "C", "X", "XC", "Q"]), digits in "[0-9]{0,6}") {
        let id = format!("{prefix}{digits}");
        let topic = SpecTopic::new(&id);
        let matches = flags(&topic).iter().filter(|flag| **flag).count();
        prop_assert!(matches <= 1);
        prop_assert_eq!(matches == 0, matches!(topic.identity(), TopicIdentity::Unrecognized));
    }

    #[test]
    fn database_id_tracks_the_existing_pattern(number in 0i32..1_000_000) {
        let mut topic = SpecTopic::new(format!("C{number}"));
        prop_assert_eq!(topic.db_id(), None);
        topic.set_id(&number.to_string());
        prop_assert_eq!(topic.db_id(), Some(number));
    }
}
