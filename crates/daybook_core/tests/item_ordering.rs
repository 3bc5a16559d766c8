use chrono::{DateTime, Duration, TimeZone, Utc};
use daybook_core::{group_by_tag, sort_items, AnyItem, Item, Note, Tag, Task};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

fn tag(name: &str) -> Tag {
    Tag {
        id: name.to_string(),
        name: name.to_string(),
    }
}

fn item(title: &str, created_at: DateTime<Utc>, tag: Option<Tag>) -> Item {
    let mut item = Item::new(title);
    item.created_at = Some(created_at);
    item.tag = tag;
    item
}

fn task_entry(title: &str, created_at: DateTime<Utc>, item_tag: Option<Tag>) -> AnyItem {
    AnyItem::Task(Task {
        item: item(title, created_at, item_tag),
        ..Task::new(title)
    })
}

fn note_entry(title: &str, created_at: DateTime<Utc>, item_tag: Option<Tag>) -> AnyItem {
    AnyItem::Note(Note {
        item: item(title, created_at, item_tag),
    })
}

#[test]
fn tagged_item_never_orders_after_untagged() {
    let now = base_time();
    let tagged = item("tagged", now, Some(tag("work")));
    let untagged = item("untagged", now, None);

    assert!(!tagged.after(&untagged));
    assert!(untagged.after(&tagged));
}

#[test]
fn later_created_orders_first_within_same_tag_presence() {
    let earlier = item("old", base_time() - Duration::hours(1), None);
    let later = item("new", base_time(), None);

    assert!(earlier.after(&later));
    assert!(!later.after(&earlier));

    let earlier_tagged = item("old", base_time() - Duration::hours(1), Some(tag("a")));
    let later_tagged = item("new", base_time(), Some(tag("b")));
    assert!(earlier_tagged.after(&later_tagged));
    assert!(!later_tagged.after(&earlier_tagged));
}

#[test]
fn equal_timestamps_compare_as_not_after_both_ways() {
    let now = base_time();
    let a = item("a", now, None);
    let b = item("b", now, None);
    assert!(!a.after(&b));
    assert!(!b.after(&a));
}

#[test]
fn missing_timestamp_orders_last_within_its_bucket() {
    let dated = item("dated", base_time(), None);
    let mut undated = Item::new("undated");
    undated.created_at = None;

    assert!(undated.after(&dated));
    assert!(!dated.after(&undated));
}

#[test]
fn sort_puts_tagged_first_then_most_recent() {
    let t0 = base_time();
    let mut items = vec![
        note_entry("old untagged", t0 - Duration::hours(3), None),
        task_entry("new untagged", t0, None),
        note_entry("old tagged", t0 - Duration::hours(2), Some(tag("work"))),
        task_entry("new tagged", t0 - Duration::hours(1), Some(tag("home"))),
    ];

    sort_items(&mut items);

    let titles: Vec<&str> = items.iter().map(|entry| entry.title()).collect();
    assert_eq!(
        titles,
        vec!["new tagged", "old tagged", "new untagged", "old untagged"]
    );
}

#[test]
fn sort_is_stable_for_equal_keys() {
    let now = base_time();
    let mut items = vec![
        task_entry("first", now, None),
        note_entry("second", now, None),
        task_entry("third", now, None),
    ];

    sort_items(&mut items);

    let titles: Vec<&str> = items.iter().map(|entry| entry.title()).collect();
    assert_eq!(titles, vec!["first", "second", "third"]);
}

#[test]
fn grouping_preserves_first_encounter_order_of_tags() {
    let t0 = base_time();
    let items = vec![
        task_entry("one", t0, Some(tag("beta"))),
        note_entry("two", t0, Some(tag("alpha"))),
        task_entry("three", t0, Some(tag("beta"))),
    ];

    let groups = group_by_tag(items);

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].tag.as_ref().map(|t| t.name.as_str()), Some("beta"));
    assert_eq!(groups[0].items.len(), 2);
    assert_eq!(
        groups[1].tag.as_ref().map(|t| t.name.as_str()),
        Some("alpha")
    );
}

#[test]
fn grouping_surfaces_untagged_bucket_first_regardless_of_position() {
    let t0 = base_time();
    let items = vec![
        task_entry("tagged early", t0, Some(tag("work"))),
        note_entry("loose", t0, None),
        task_entry("tagged late", t0, Some(tag("home"))),
    ];

    let groups = group_by_tag(items);

    assert_eq!(groups.len(), 3);
    assert!(groups[0].tag.is_none());
    assert_eq!(groups[0].items.len(), 1);
    assert_eq!(groups[0].items[0].title(), "loose");
    assert_eq!(groups[1].tag.as_ref().map(|t| t.name.as_str()), Some("work"));
    assert_eq!(groups[2].tag.as_ref().map(|t| t.name.as_str()), Some("home"));
}

#[test]
fn grouping_empty_input_yields_no_buckets() {
    assert!(group_by_tag(Vec::new()).is_empty());
}
