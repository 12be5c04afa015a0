use shelfmap_core::{build_topology, CellGroup, OrganizationalUnit, StorageGroup, TopologyNode};
use uuid::Uuid;

fn unit(name: &str) -> OrganizationalUnit {
    OrganizationalUnit {
        id: Uuid::new_v4(),
        name: name.to_string(),
        alias: name.to_ascii_uppercase(),
        address: None,
    }
}

fn group(unit_id: Uuid, parent_id: Option<Uuid>, name: &str) -> StorageGroup {
    StorageGroup {
        id: Uuid::new_v4(),
        unit_id,
        parent_id,
        name: name.to_string(),
        alias: String::new(),
    }
}

fn cells(unit_id: Uuid, storage_group_id: Option<Uuid>, name: &str) -> CellGroup {
    CellGroup {
        id: Uuid::new_v4(),
        unit_id,
        storage_group_id,
        name: name.to_string(),
        alias: String::new(),
        cell_count: 12,
    }
}

fn child_names(nodes: &[TopologyNode]) -> Vec<&str> {
    nodes.iter().map(TopologyNode::name).collect()
}

#[test]
fn nests_storage_groups_under_their_unit() {
    let moscow = unit("Moscow");
    let floor = group(moscow.id, None, "Floor1");
    let aisle = group(moscow.id, Some(floor.id), "AisleA");

    let trees = build_topology(&[moscow.clone()], &[floor.clone(), aisle.clone()], &[]);

    assert_eq!(trees.len(), 1);
    assert_eq!(trees[0].unit, moscow);
    assert_eq!(child_names(&trees[0].children), vec!["Floor1"]);
    let floor_node = &trees[0].children[0];
    assert_eq!(floor_node.id(), floor.id);
    assert_eq!(child_names(floor_node.children()), vec!["AisleA"]);
    assert!(floor_node.children()[0].children().is_empty());
}

#[test]
fn empty_collections_yield_bare_units() {
    let trees = build_topology(&[unit("A"), unit("B")], &[], &[]);
    assert_eq!(trees.len(), 2);
    assert!(trees.iter().all(|tree| tree.children.is_empty()));
    assert!(build_topology(&[], &[], &[]).is_empty());
}

#[test]
fn children_keep_source_order_groups_before_cells() {
    let site = unit("Kazan");
    let zeta = group(site.id, None, "Zeta");
    let alpha = group(site.id, None, "Alpha");
    let loose = cells(site.id, None, "Dock cells");
    let racks = cells(site.id, Some(zeta.id), "Racks");
    let bins = cells(site.id, Some(zeta.id), "Bins");
    let inner = group(site.id, Some(zeta.id), "Inner");

    let trees = build_topology(
        &[site],
        &[zeta, alpha, inner],
        &[loose, racks, bins],
    );

    assert_eq!(
        child_names(&trees[0].children),
        vec!["Zeta", "Alpha", "Dock cells"]
    );
    let zeta_node = &trees[0].children[0];
    assert_eq!(child_names(zeta_node.children()), vec!["Inner", "Racks", "Bins"]);
    assert!(zeta_node.children()[1].is_cell_group());
}

#[test]
fn dangling_parent_drops_group_and_descendants() {
    let site = unit("Moscow");
    let kept = group(site.id, None, "Floor1");
    let orphan = group(site.id, Some(Uuid::new_v4()), "Orphan");
    let orphan_child = group(site.id, Some(orphan.id), "OrphanChild");
    let orphan_cells = cells(site.id, Some(orphan.id), "OrphanCells");

    let trees = build_topology(
        &[site],
        &[kept, orphan.clone(), orphan_child.clone()],
        &[orphan_cells.clone()],
    );

    assert_eq!(child_names(&trees[0].children), vec!["Floor1"]);
    assert!(trees[0].find(orphan.id).is_none());
    assert!(trees[0].find(orphan_child.id).is_none());
    assert!(trees[0].find(orphan_cells.id).is_none());
    assert_eq!(trees[0].node_count(), 1);
}

#[test]
fn cross_unit_parent_is_not_attached() {
    let first = unit("First");
    let second = unit("Second");
    let foreign_parent = group(second.id, None, "ForeignParent");
    let confused = group(first.id, Some(foreign_parent.id), "Confused");

    let trees = build_topology(
        &[first, second],
        &[foreign_parent, confused.clone()],
        &[],
    );

    assert!(trees[0].children.is_empty());
    assert_eq!(child_names(&trees[1].children), vec!["ForeignParent"]);
    assert!(trees[1].find(confused.id).is_none());
}

#[test]
fn parent_cycle_terminates_without_emitting_cycle_members() {
    let site = unit("Loop");
    let mut a = group(site.id, None, "A");
    let b = group(site.id, Some(a.id), "B");
    a.parent_id = Some(b.id);

    let trees = build_topology(&[site], &[a, b], &[]);
    assert!(trees[0].children.is_empty());
}

#[test]
fn build_is_deterministic() {
    let site = unit("Moscow");
    let floor = group(site.id, None, "Floor1");
    let aisle_a = group(site.id, Some(floor.id), "AisleA");
    let aisle_b = group(site.id, Some(floor.id), "AisleB");
    let bins = cells(site.id, Some(aisle_b.id), "Bins");
    let units = vec![site];
    let groups = vec![floor, aisle_a, aisle_b];
    let cell_groups = vec![bins];

    let first = build_topology(&units, &groups, &cell_groups);
    let second = build_topology(&units, &groups, &cell_groups);
    assert_eq!(first, second);
}

#[test]
fn path_to_lists_names_from_unit_down() {
    let site = unit("Moscow");
    let floor = group(site.id, None, "Floor1");
    let aisle = group(site.id, Some(floor.id), "AisleA");
    let bins = cells(site.id, Some(aisle.id), "Bins");

    let trees = build_topology(&[site.clone()], &[floor, aisle], &[bins.clone()]);

    assert_eq!(
        trees[0].path_to(bins.id).unwrap(),
        vec!["Moscow", "Floor1", "AisleA", "Bins"]
    );
    assert_eq!(trees[0].path_to(site.id).unwrap(), vec!["Moscow"]);
    assert!(trees[0].path_to(Uuid::new_v4()).is_none());
}

#[test]
fn tree_serializes_with_kind_tags() {
    let site = unit("Moscow");
    let floor = group(site.id, None, "Floor1");
    let bins = cells(site.id, Some(floor.id), "Bins");

    let trees = build_topology(&[site], &[floor], &[bins]);
    let json = serde_json::to_value(&trees).unwrap();

    assert_eq!(json[0]["unit"]["name"], "Moscow");
    assert_eq!(json[0]["children"][0]["kind"], "storage_group");
    assert_eq!(json[0]["children"][0]["children"][0]["kind"], "cell_group");
    assert_eq!(json[0]["children"][0]["children"][0]["group"]["cell_count"], 12);
}
