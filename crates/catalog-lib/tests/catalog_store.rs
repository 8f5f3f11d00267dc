use std::collections::HashSet;

use catalog_lib::{Catalog, Category};

#[test]
fn services_catalog_has_expected_shape() {
    let catalog = Catalog::load().expect("static tables are valid");
    assert_eq!(catalog.services.len(), 10);
    assert_eq!(catalog.services.collection(), "services");

    let categories = catalog.services.categories();
    let unique: HashSet<_> = categories.iter().collect();
    assert_eq!(unique.len(), categories.len(), "categories must be distinct");
}

#[test]
fn category_partition_matches_every_valid_category() {
    let catalog = Catalog::load().unwrap();
    for category in Category::ALL {
        for spelling in [
            category.as_str().to_string(),
            category.as_str().to_uppercase(),
        ] {
            let entries = catalog.services.by_category_name(&spelling);
            assert!(entries.iter().all(|e| e.category == *category));
        }
    }
}

#[test]
fn partitions_cover_the_whole_collection() {
    let catalog = Catalog::load().unwrap();
    let total: usize = Category::ALL
        .iter()
        .map(|c| catalog.services.by_category(*c).len())
        .sum();
    assert_eq!(total, catalog.services.len());
}

#[test]
fn unknown_category_is_empty_not_an_error() {
    let catalog = Catalog::load().unwrap();
    assert!(catalog.services.by_category_name("astrology").is_empty());
    assert!(catalog.software.by_category_name("").is_empty());
}

#[test]
fn repeated_loads_are_identical() {
    let first: Vec<_> = Catalog::load()
        .unwrap()
        .services
        .entries()
        .iter()
        .map(|e| (e.id, e.category))
        .collect();
    let second: Vec<_> = Catalog::load()
        .unwrap()
        .services
        .entries()
        .iter()
        .map(|e| (e.id, e.category))
        .collect();
    assert_eq!(first, second);
}
