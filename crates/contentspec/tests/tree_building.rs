use contentspec::{
    ContentSpec, ContentSpecError, InMemoryTopicProvider, LevelType, MetadataKey, NodeId,
    ParentRef, RelationshipType, ServerEntities, ServerSettings, SpecTopic, checksum_of,
    generate_checksum, id_of, remove_checksum_and_id, verify_checksum,
};

fn tea_spec() -> (ContentSpec, NodeId, NodeId) {
    let mut spec = ContentSpec::new();
    spec.set_title(Some("Tea"));
    spec.set_product(Some("Nu-Tea"));

    let chapter = spec.new_chapter("Tea");
    spec.append_child(spec.base_level(), chapter).unwrap();
    let topic = spec.new_topic(SpecTopic::new("N").with_title("Tea").with_type("Concept"));
    spec.append_child(chapter, topic).unwrap();
    (spec, chapter, topic)
}

#[test]
fn tea_scenario_renders_and_numbers() {
    let (spec, chapter, topic) = tea_spec();

    assert_eq!(spec.spec_topics().len(), 1);
    assert_eq!(spec.step(chapter), Some(1));
    assert_eq!(spec.step(topic), Some(2));

    let rendered = spec.render(false);
    let lines: Vec<&str> = rendered.lines().collect();
    let heading = lines
        .iter()
        .position(|line| *line == "Chapter: Tea")
        .expect("chapter heading missing");
    assert_eq!(lines[heading + 1], "  Tea [N, Concept]");
    assert_eq!(
        rendered,
        "Title = Tea\nProduct = Nu-Tea\nChapter: Tea\n  Tea [N, Concept]\n"
    );
}

#[test]
fn moving_nodes_between_levels_leaves_no_stale_membership() {
    let (mut spec, chapter, topic) = tea_spec();
    let appendix = spec.new_appendix("Extras");
    spec.append_child(spec.base_level(), appendix).unwrap();

    spec.append_child(appendix, topic).unwrap();
    assert!(spec.child_nodes(chapter).is_empty());
    assert_eq!(spec.child_nodes(appendix), &[topic]);
    assert_eq!(spec.parent(topic), Some(ParentRef::Node(appendix)));

    spec.append_child(appendix, chapter).unwrap();
    assert_eq!(spec.child_nodes(spec.base_level()), &[appendix]);
    assert_eq!(spec.child_levels(appendix), vec![chapter]);
    assert_eq!(spec.level(chapter).unwrap().level_type(), LevelType::Chapter);

    assert!(spec.remove_child(appendix, topic).unwrap());
    let occurrences = spec
        .child_nodes(appendix)
        .iter()
        .filter(|node| **node == topic)
        .count();
    assert_eq!(occurrences, 0);
    assert_eq!(spec.parent(topic), None);
}

#[test]
fn metadata_setter_twice_keeps_one_line_in_place() {
    let (mut spec, _, _) = tea_spec();
    spec.set_product(Some("Foo"));
    spec.set_product(Some("Foo"));

    let product_lines: Vec<NodeId> = spec
        .top_level_nodes()
        .iter()
        .copied()
        .filter(|node| Some(*node) == spec.metadata_node(&MetadataKey::Product))
        .collect();
    assert_eq!(product_lines.len(), 1);
    assert_eq!(spec.top_level_nodes()[1], product_lines[0]);
    assert_eq!(spec.product(), Some("Foo"));

    spec.set_product(None);
    assert_eq!(spec.top_level_nodes().len(), 1);
    assert!(!spec.render(false).contains("Product"));
}

#[test]
fn checksum_survives_strip_and_recompute() {
    let (mut spec, _, _) = tea_spec();
    spec.set_id(Some(1234));

    let rendered = spec.render(true);
    let embedded = checksum_of(&rendered).expect("checksum line");
    let body = remove_checksum_and_id(&rendered);
    assert_eq!(generate_checksum(id_of(&rendered).unwrap(), &body), embedded);
    assert_eq!(verify_checksum(&rendered), Some(true));

    let without = spec.render(false);
    assert!(without.starts_with("ID = 1234\n"));
    assert_eq!(remove_checksum_and_id(&without), body);
}

#[test]
fn closest_search_terminates_with_cyclic_level_relationships() {
    let mut spec = ContentSpec::new();
    let base = spec.base_level();
    let a = spec.new_chapter("A");
    let b = spec.new_chapter("B");
    spec.append_child(base, a).unwrap();
    spec.append_child(base, b).unwrap();
    spec.attributes_mut(a).unwrap().set_target_id(Some("T-a"));
    spec.attributes_mut(b).unwrap().set_target_id(Some("T-b"));
    spec.add_relationship_to_target(a, b, RelationshipType::ReferTo, None)
        .unwrap();
    spec.add_relationship_to_target(b, a, RelationshipType::ReferTo, None)
        .unwrap();

    let mut cursor = a;
    for depth in 0..6 {
        let section = spec.new_section(&format!("Depth {depth}"));
        spec.append_child(cursor, section).unwrap();
        cursor = section;
    }
    let deep_topic = spec.new_topic(SpecTopic::new("N1"));
    spec.append_child(cursor, deep_topic).unwrap();

    assert_eq!(spec.closest_topic(deep_topic, "nowhere", true), None);
    assert_eq!(spec.closest_spec_node_by_target_id(deep_topic, "T-b", true), Some(b));
    assert_eq!(spec.closest_topic_by_db_id(deep_topic, 1, true), None);
}

#[test]
fn process_links_two_task_topics() {
    let mut spec = ContentSpec::new();
    let process = spec.new_process("Brewing");
    spec.append_child(spec.base_level(), process).unwrap();
    let first = spec.new_topic(SpecTopic::new("N1").with_title("Boil").with_type("Task"));
    let second = spec.new_topic(SpecTopic::new("N2").with_title("Steep").with_type("Task"));
    spec.append_child(process, first).unwrap();
    spec.append_child(process, second).unwrap();

    let settings = ServerSettings {
        entities: ServerEntities {
            task_tag_id: Some(4),
            fixed_url_property_tag_id: None,
        },
    };
    let provider = InMemoryTopicProvider::new();
    assert!(spec.process_topics(process, &provider, &settings).unwrap());

    let next: Vec<NodeId> = spec
        .next_relationships(first)
        .iter()
        .map(|r| r.secondary())
        .collect();
    let previous: Vec<NodeId> = spec
        .previous_relationships(second)
        .iter()
        .map(|r| r.secondary())
        .collect();
    assert_eq!(next, vec![second]);
    assert_eq!(previous, vec![first]);
    assert!(spec.topic(first).unwrap().target_id().is_some());
    assert!(spec.topic(second).unwrap().target_id().is_some());
}

#[test]
fn structural_misuse_is_reported() {
    let (mut spec, chapter, topic) = tea_spec();
    let err = spec.append_child(topic, chapter).unwrap_err();
    assert!(matches!(err, ContentSpecError::NotALevel(_)));

    let key_value = spec.metadata_node(&MetadataKey::Title).unwrap();
    let err = spec.append_child(chapter, key_value).unwrap_err();
    assert!(matches!(err, ContentSpecError::Structure(_)));
}
