//! Integration tests for the replication engine

use fieldset_replicator::{
    populate, rewrite, AddOutcome, Container, ContainerConfig, ContainerError, Overrides,
};
use pretty_assertions::assert_eq;
use serde_json::json;

const NESTED_MENU: &str = r#"<fieldset>
  <input name="Menus[1].SubMenus[2].Title" value="">
  <input name="Menus[1].SubMenus[2].Items[3].URL" value="">
</fieldset>"#;

fn add(container: &mut Container) -> AddOutcome {
    container.add(None, &Overrides::new()).expect("Should add")
}

#[test]
fn test_placeholder_position_matches_depth() {
    let chain = "A[10].B[20].C[30].D[40]";
    let tokens = ["10", "20", "30", "40"];
    for depth in 0..tokens.len() {
        let rewritten = rewrite(chain, depth).expect("Should rewrite");
        let mut expected = String::new();
        for (level, (name, token)) in ["A", "B", "C", "D"].iter().zip(tokens).enumerate() {
            if level > 0 {
                expected.push('.');
            }
            let index = if level == depth { "{{index}}" } else { token };
            expected.push_str(&format!("{}[{}]", name, index));
        }
        assert_eq!(rewritten, expected, "depth {}", depth);
    }
}

#[test]
fn test_spec_scenario_depth_one() {
    let mut container = Container::new(ContainerConfig::new().with_depth(1));
    let template = container
        .capture(None, "Menus[1].SubMenus[2].Items[3].URL")
        .expect("Should capture");
    assert_eq!(template.rewritten, "Menus[1].SubMenus[{{index}}].Items[3].URL");
    assert_eq!(template.seed_index, 2);

    let first = add(&mut container);
    assert_eq!(first.instance().map(|i| i.index), Some(7));
}

#[test]
fn test_capacity_two() {
    let mut container = Container::new(ContainerConfig::new().with_max_items(2));
    container.capture(None, "Links[0].URL").unwrap();

    assert!(!add(&mut container).is_rejected());
    assert!(!add(&mut container).is_rejected());
    assert!(add(&mut container).is_rejected());
    assert_eq!(container.current_count(), 2);
}

#[test]
fn test_populate_scenario() {
    let mut container = Container::new(ContainerConfig::new());
    let seed = container
        .capture(None, r#"<input name="Rows[4].a">"#)
        .unwrap()
        .seed_index;

    let records = vec![json!({"a": 1}), json!({"a": 2}), json!({"a": 3})];
    let instances = populate(&mut container, &records).unwrap();

    let indices: Vec<_> = instances.iter().map(|i| i.index).collect();
    assert_eq!(indices, vec![seed + 5, seed + 6, seed + 7]);
    let values: Vec<_> = instances
        .iter()
        .map(|i| i.values["a"].clone())
        .collect();
    assert_eq!(values, vec!["1", "2", "3"]);
}

#[test]
fn test_add_remove_undo_keeps_count() {
    let mut container = Container::new(ContainerConfig::new().with_sortable(true));
    container.capture(None, NESTED_MENU).unwrap();
    add(&mut container);
    let item = add(&mut container).instance().cloned().unwrap();
    let before = container.current_count();

    let extra = add(&mut container).instance().cloned().unwrap();
    container.remove(extra.id).unwrap();
    container.undo(extra.id).unwrap();
    assert_eq!(container.current_count(), before + 1);

    container.remove(item.id).unwrap();
    container.undo(item.id).unwrap();
    assert_eq!(container.current_count(), before + 1);

    let orders: Vec<_> = container.active_instances().map(|i| i.order).collect();
    assert_eq!(orders, vec![Some(0), Some(1), Some(2)]);
}

#[test]
fn test_index_strictly_increasing_across_undo() {
    let mut container = Container::new(ContainerConfig::new());
    container.capture(None, "Tags[0].Name").unwrap();

    let mut seen = Vec::new();
    for round in 0..5 {
        let item = add(&mut container).instance().cloned().unwrap();
        seen.push(item.index);
        if round % 2 == 0 {
            container.remove(item.id).unwrap();
            container.undo(item.id).unwrap();
        } else {
            container.remove(item.id).unwrap();
        }
    }
    assert!(seen.windows(2).all(|w| w[0] < w[1]), "indices: {:?}", seen);
}

#[test]
fn test_reorder_four_items() {
    let mut container = Container::new(ContainerConfig::new().with_sortable(true));
    container.capture(None, "Slides[0].Image").unwrap();
    let ids: Vec<_> = (0..4)
        .map(|_| add(&mut container).instance().unwrap().id)
        .collect();

    let last = container
        .active_instances()
        .find(|i| i.order == Some(3))
        .map(|i| i.id)
        .unwrap();
    container.reorder(last, 0).unwrap();

    let orders: Vec<_> = container
        .active_instances()
        .map(|i| i.order.unwrap())
        .collect();
    assert_eq!(orders, vec![0, 1, 2, 3]);
    let ids_after: Vec<_> = container.active_instances().map(|i| i.id).collect();
    assert_eq!(ids_after, vec![ids[3], ids[0], ids[1], ids[2]]);
}

#[test]
fn test_nested_containers() {
    // Outer container owns the SubMenus index
    let mut outer = Container::new(ContainerConfig::new().with_depth(1));
    outer.capture(None, NESTED_MENU).unwrap();
    let sub = add(&mut outer).instance().cloned().unwrap();
    assert_eq!(sub.index, 7);
    assert!(sub.markup.contains(r#"name="Menus[1].SubMenus[7].Title""#));
    assert!(sub.markup.contains(r#"name="Menus[1].SubMenus[7].Items[3].URL""#));

    // Inner container is initialized against the materialized instance
    let item_prototype = r#"<input name="Menus[1].SubMenus[7].Items[3].URL" value="">"#;
    let mut inner = Container::new(outer.child_config());
    let template = inner.capture(None, item_prototype).unwrap();
    assert_eq!(
        template.rewritten,
        r#"<input name="Menus[1].SubMenus[7].Items[{{index}}].URL" value="">"#
    );

    let item = add(&mut inner).instance().cloned().unwrap();
    assert_eq!(
        item.markup,
        r#"<input name="Menus[1].SubMenus[7].Items[8].URL" value="">"#
    );
    let entries = inner.instances_for_submission();
    assert_eq!(entries[0].path.as_deref(), Some("Menus[1].SubMenus[7].Items[8]"));
}

#[test]
fn test_add_with_kind_override() {
    let mut container = Container::new(ContainerConfig::new());
    container
        .capture(
            Some("block"),
            r#"<div><input type="hidden" name="Blocks[0].Kind" value=""><textarea name="Blocks[0].Body"></textarea></div>"#,
        )
        .unwrap();

    let overrides: Overrides = [("Kind".to_string(), "quote".to_string())].into();
    let outcome = container.add(Some("block"), &overrides).unwrap();
    let markup = &outcome.instance().unwrap().markup;
    insta::assert_snapshot!(
        markup,
        @r#"<div><input type="hidden" name="Blocks[5].Kind" value="quote"><textarea name="Blocks[5].Body"></textarea></div>"#
    );
}

#[test]
fn test_undo_capacity_error_leaves_state() {
    let mut container = Container::new(ContainerConfig::new().with_max_items(1));
    container.capture(None, "Links[0].URL").unwrap();
    let first = add(&mut container).instance().cloned().unwrap();
    container.remove(first.id).unwrap();
    let second = add(&mut container).instance().cloned().unwrap();

    let before: Vec<_> = container.instances().to_vec();
    assert_eq!(
        container.undo(first.id),
        Err(ContainerError::CapacityExceeded { max: 1 })
    );
    assert_eq!(container.instances(), before.as_slice());
    assert!(container.instance(second.id).unwrap().is_active());
}

#[test]
fn test_malformed_template_degrades() {
    let mut container = Container::new(ContainerConfig::new());
    let template = container.capture(None, r#"<input name="Items[]">"#).unwrap();
    assert!(!template.has_index());
    assert_eq!(template.seed_index, 0);

    let item = add(&mut container).instance().cloned().unwrap();
    assert_eq!(item.index, 5);
    assert_eq!(item.markup, r#"<input name="Items[]">"#);
}

#[test]
fn test_inconsistent_chain_is_configuration_error() {
    let mut container = Container::new(ContainerConfig::new());
    let result = container.capture(
        None,
        r#"<input name="Menus[0].Title"><input name="Links[0].URL">"#,
    );
    assert!(matches!(result, Err(ContainerError::Template(_))));
}

#[test]
fn test_late_result_after_removal_is_dropped() {
    let mut container = Container::new(ContainerConfig::new());
    container
        .capture(None, r#"<input name="Menus[0].Title" value="">"#)
        .unwrap();
    let item = add(&mut container).instance().cloned().unwrap();
    container.remove(item.id).unwrap();

    let late: Overrides = [("Title".to_string(), "Fetched".to_string())].into();
    assert_eq!(container.apply_late_overrides(item.id, &late), None);
    assert_eq!(
        container.instance(item.id).map(|i| i.markup.as_str()),
        Some(r#"<input name="Menus[5].Title" value="">"#)
    );
}

#[test]
fn test_named_templates_never_share_an_index() {
    let mut container = Container::new(ContainerConfig::new());
    container
        .capture(Some("text"), r#"<textarea name="Rules[0].Text"></textarea>"#)
        .unwrap();
    container
        .capture(Some("image"), r#"<input type="file" name="Rules[0].Image">"#)
        .unwrap();

    let text = container.add(Some("text"), &Overrides::new()).unwrap();
    let image = container.add(Some("image"), &Overrides::new()).unwrap();
    let text = text.instance().unwrap();
    let image = image.instance().unwrap();
    assert_ne!(text.index, image.index);

    let entries = container.instances_for_submission();
    let paths: Vec<_> = entries.iter().map(|e| e.path.clone()).collect();
    assert_eq!(paths.len(), 2);
    assert_ne!(paths[0], paths[1]);
}

#[test]
fn test_seed_near_index_limit_degrades() {
    let mut container = Container::new(ContainerConfig::new());
    let template = container
        .capture(None, r#"<input name="A[18446744073709551614].x">"#)
        .expect("Should capture without aborting");
    assert!(!template.has_index());
    assert_eq!(template.diagnostics.len(), 1);
    assert_eq!(add(&mut container).instance().map(|i| i.index), Some(5));
}

#[test]
fn test_legend_with_index_text() {
    let mut container = Container::new(ContainerConfig::new());
    container
        .capture(
            None,
            r#"<fieldset><legend>Step [1]</legend><input name="Opts[0].V"></fieldset>"#,
        )
        .expect("Should capture");
    let item = add(&mut container).instance().cloned().unwrap();
    assert_eq!(
        item.markup,
        r#"<fieldset><legend>Step [1]</legend><input name="Opts[5].V"></fieldset>"#
    );
}
