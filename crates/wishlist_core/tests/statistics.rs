use wishlist_core::{
    Category, CategoryCount, FilterCounts, KeyValuePresentRepository, MemoryKeyValueStore,
    NewPresent, Present, WishlistStats, WishlistStore,
};

fn present(id: &str, category: Category, price: f64, given: bool) -> Present {
    let draft = NewPresent::new(format!("gift {id}"), "", category, price);
    let mut present = Present::create(id.to_string(), &draft, 1).unwrap();
    if given {
        present.mark_given("", 2);
    }
    present
}

#[test]
fn empty_collection_has_zero_progress() {
    let stats = WishlistStats::from_presents(&[]);
    assert_eq!(stats.total, 0);
    assert_eq!(stats.given, 0);
    assert_eq!(stats.pending, 0);
    assert_eq!(stats.progress, 0.0);
    assert!(!stats.progress.is_nan());
    assert_eq!(stats.progress_label(), "0");
    assert_eq!(stats.total_value, 0.0);
    assert!(stats.category_counts.is_empty());
}

#[test]
fn counts_progress_and_values_reconcile() {
    let presents = vec![
        present("a", Category::Toys, 199.90, true),
        present("b", Category::Books, 40.0, false),
        present("c", Category::Toys, 10.10, false),
    ];
    let stats = WishlistStats::from_presents(&presents);

    assert_eq!(stats.total, 3);
    assert_eq!(stats.given, 1);
    assert_eq!(stats.pending, 2);
    assert!((stats.progress - 100.0 / 3.0).abs() < 1e-9);
    assert_eq!(stats.progress_label(), "33.3");

    let none_given = WishlistStats::from_presents(&presents[1..]);
    assert_eq!(none_given.progress_label(), "0.0");
    assert!((stats.total_value - 250.0).abs() < 1e-9);
    assert!((stats.spent_value - 199.90).abs() < 1e-9);
    assert_eq!(stats.remaining_value, stats.total_value - stats.spent_value);
}

#[test]
fn category_counts_keep_first_seen_order_and_sort_stably() {
    let presents = vec![
        present("a", Category::Books, 0.0, false),
        present("b", Category::Toys, 0.0, false),
        present("c", Category::Home, 0.0, false),
        present("d", Category::Toys, 0.0, false),
        present("e", Category::Home, 0.0, true),
        present("f", Category::Sports, 0.0, false),
    ];
    let stats = WishlistStats::from_presents(&presents);

    let first_seen: Vec<Category> = stats
        .category_counts
        .iter()
        .map(|entry| entry.category)
        .collect();
    assert_eq!(
        first_seen,
        vec![
            Category::Books,
            Category::Toys,
            Category::Home,
            Category::Sports
        ]
    );

    assert_eq!(
        stats.categories_by_count(),
        vec![
            CategoryCount {
                category: Category::Toys,
                count: 2
            },
            CategoryCount {
                category: Category::Home,
                count: 2
            },
            CategoryCount {
                category: Category::Books,
                count: 1
            },
            CategoryCount {
                category: Category::Sports,
                count: 1
            },
        ]
    );
    assert_eq!(stats.category_count(Category::Home), 2);
    assert_eq!(stats.category_count(Category::Food), 0);
}

#[test]
fn filter_counts_match_statistics() {
    let presents = vec![
        present("a", Category::Toys, 1.0, true),
        present("b", Category::Toys, 1.0, false),
    ];
    assert_eq!(
        FilterCounts::from_presents(&presents),
        FilterCounts {
            all: 2,
            pending: 1,
            given: 1
        }
    );
}

#[test]
fn store_values_reconcile_through_adds_and_marks() {
    let mut store = WishlistStore::open(KeyValuePresentRepository::new(
        MemoryKeyValueStore::new(),
    ));
    let prices = [19.99, 0.0, 250.5, 3.33, 72.1];
    let mut ids = Vec::new();
    for (index, price) in prices.iter().enumerate() {
        let draft = NewPresent::new(format!("gift {index}"), "", Category::Other, *price);
        ids.push(store.add(&draft).unwrap().id);

        let stats = store.statistics();
        assert_eq!(stats.remaining_value, stats.total_value - stats.spent_value);
    }
    store.mark_given(&ids[0], "");
    store.mark_given(&ids[2], "");

    let stats = store.statistics();
    assert_eq!(stats.remaining_value, stats.total_value - stats.spent_value);
    assert!((stats.spent_value - (19.99 + 250.5)).abs() < 1e-9);
    assert_eq!(stats.progress, 40.0);
    assert_eq!(store.filter_counts().given, 2);
}
