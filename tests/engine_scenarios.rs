//! End-to-end checks of the engine boundary: lenient text in, ranked titles out

use media_catalog::catalog::{
    deduplicate, derive_id, normalize_record, normalize_title, recommend, Catalog, ImportOptions,
    ImportSource,
};
use media_catalog::{parse_lenient_records, Media, MediaType, RawValue};
use serde_json::json;

#[test]
fn import_then_recommend_sequel() {
    let text = "{id:1,title:\"Foo\",type:movie,poster:\"p.jpg\",year:2020},\n{id:2,title:\"Foo 2\",type:movie,poster:\"p2.jpg\",year:2021}";

    let mut catalog = Catalog::new();
    let report = catalog.import(ImportSource::Text(text.to_string()), ImportOptions::default());
    assert_eq!(report.success, 2);

    let ids: Vec<&str> = catalog.all().iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2"]);

    let related = catalog.recommendations("1", &Default::default());
    assert_eq!(related.len(), 1);
    assert_eq!(related[0].id, "2");
    assert_eq!(related[0].poster, "p2.jpg");
}

#[test]
fn three_hand_concatenated_objects() {
    let text = r#"
        // pasted from the scraper
        {id: 'a', title: 'First', type: 'series',},
        {id: 'b', title: 'Second', type: 'series'},
        {id: 'c', title: 'Third', type: 'series'},
    "#;

    let parsed = parse_lenient_records(text);
    let ids: Vec<String> = parsed
        .records
        .iter()
        .filter_map(|r| r.value("id").and_then(RawValue::as_text))
        .collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[test]
fn derived_ids_are_stable() {
    let raw = RawValue::from(json!({"title": "My Show!"}));
    let first = normalize_record(&raw).unwrap();
    let second = normalize_record(&raw).unwrap();

    assert_eq!(first.id, "my-show");
    assert_eq!(first.id, second.id);
    assert_eq!(derive_id("My Show!"), "my-show");
}

#[test]
fn normalized_titles_are_fixed_points() {
    for title in ["Foo Season 2 (2020)", "الموسم الثالث", "OVA: Special 3", "x"] {
        let once = normalize_title(title);
        assert_eq!(normalize_title(&once), once);
    }
}

#[test]
fn dedup_keeps_first_seen() {
    let records = vec![
        Media::new("1", "Bleach", MediaType::Anime),
        Media::new("2", "Bleach Season 2", MediaType::Anime),
        Media::new("3", "Monster", MediaType::Anime),
    ];
    let ids: Vec<String> = deduplicate(records).into_iter().map(|m| m.id).collect();
    assert_eq!(ids, vec!["1", "3"]);
}

#[test]
fn similar_titles_suppress_other_tiers() {
    let mut catalog = vec![Media::new("t", "Kingdom", MediaType::AsianSeries)];
    catalog.push(Media::new("k2", "Kingdom Season 2", MediaType::AsianSeries));
    for i in 0..5 {
        let mut other = Media::new(format!("o{i}"), format!("Unrelated {i}"), MediaType::AsianSeries);
        other.rating = Some("9.9".to_string());
        catalog.push(other);
    }

    let related = recommend("t", &catalog);
    assert_eq!(related.len(), 1);
    assert_eq!(related[0].id, "k2");
}

#[test]
fn unknown_target_yields_nothing() {
    let catalog = vec![Media::new("1", "Foo", MediaType::Movie)];
    assert!(recommend("404", &catalog).is_empty());
}
