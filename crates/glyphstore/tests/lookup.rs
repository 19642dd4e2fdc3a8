// this_file: crates/glyphstore/tests/lookup.rs

//! Lookup behaviour of the composite font store: caching, search order,
//! name matching, nesting and the shared resources nested stores inherit.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use glyphstore::{BitmapGlyph, BitmapGlyphSource, FontStore};
use glyphstore_core::{
    CacheStorage, CharacterGlyph, ComposableStore, GlyphSource, StoreConfig, TextureAtlas,
    TextureRegion, TextureSource, TextureStore, TextureUpload, TexturedCharacterGlyph,
    TexturedGlyphLookup,
};
use proptest::prelude::*;

fn bitmap_font(name: &str, chars: &str) -> Arc<BitmapGlyphSource> {
    let glyphs = chars.chars().map(|c| {
        BitmapGlyph::new(
            CharacterGlyph::new(c, 1.0, 2.0, 12.0, 16.0),
            TextureUpload::new(3, 4, vec![128; 12]).unwrap(),
        )
    });
    Arc::new(BitmapGlyphSource::new(name, glyphs))
}

fn root_store() -> Arc<FontStore> {
    Arc::new(FontStore::new(StoreConfig::default()).unwrap())
}

fn nested_store() -> Arc<FontStore> {
    Arc::new(FontStore::builder().without_atlas().build().unwrap())
}

/// Polls until every glyph source in the tree rooted at `stores` has settled
async fn settle(stores: &[&Arc<FontStore>]) {
    let sources: Vec<Arc<dyn GlyphSource>> = stores
        .iter()
        .flat_map(|store| store.glyph_sources())
        .collect();

    tokio::time::timeout(Duration::from_secs(5), async {
        while !sources.iter().all(|source| source.state().is_settled()) {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("fonts should finish loading");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_get_twice_when_cached_then_returns_same_entry() {
    let store = root_store();
    store.add_source(bitmap_font("Foo", "A"));
    settle(&[&store]).await;

    let first = store.get(Some("Foo"), 'A').unwrap();
    let second = store.get(Some("Foo"), 'A').unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    assert!(store.get(Some("Foo"), 'Q').is_none());
    assert!(store.get(Some("Foo"), 'Q').is_none());
    assert_eq!(store.cached_lookups(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_named_lookup_when_font_has_glyph_then_texture_key_is_font_slash_char() {
    let store = root_store();
    store.add_source(bitmap_font("Foo", "A"));
    settle(&[&store]).await;

    let glyph = store.get(Some("Foo"), 'A').expect("Foo has A");

    assert_eq!(glyph.texture_key(), "Foo/A");
    assert_eq!(glyph.character(), 'A');
    assert!((glyph.scale() - 0.01).abs() < 1e-6);
    assert!((glyph.x_advance() - 0.12).abs() < 1e-6);

    let region = glyph.texture().expect("bitmap glyphs are textured");
    assert_eq!((region.width, region.height), (3, 4));
    assert_eq!(store.atlas().unwrap().page_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_wildcard_lookup_then_own_sources_before_nested_in_attachment_order() {
    let root = root_store();
    let first = nested_store();
    let second = nested_store();

    root.add_source(bitmap_font("Root", "C"));
    first.add_source(bitmap_font("First", "AC"));
    second.add_source(bitmap_font("Second", "AB"));
    root.add_store(first.clone());
    root.add_store(second.clone());
    settle(&[&root, &first, &second]).await;

    assert_eq!(root.get(None, 'C').unwrap().texture_key(), "Root/C");
    assert_eq!(root.get(None, 'A').unwrap().texture_key(), "First/A");
    assert_eq!(root.get(None, 'B').unwrap().texture_key(), "Second/B");
    assert!(root.get(None, 'D').is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_suffix_match_when_two_fonts_share_suffix_then_first_attached_wins() {
    let store = root_store();
    store.add_source(bitmap_font("Fonts/Foo", "A"));
    store.add_source(bitmap_font("Other/Foo", "A"));
    settle(&[&store]).await;

    assert_eq!(store.get(Some("Foo"), 'A').unwrap().texture_key(), "Fonts/Foo/A");
    assert_eq!(
        store.get(Some("Other/Foo"), 'A').unwrap().texture_key(),
        "Other/Foo/A"
    );
    assert_eq!(store.get(Some(""), 'A').unwrap().texture_key(), "Fonts/Foo/A");
    // Matching is by suffix, not prefix or substring
    assert!(store.get(Some("Fonts"), 'A').is_none());
    assert!(store.get(Some("foo"), 'A').is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cached_miss_when_matching_source_added_later_then_still_missing() {
    let store = root_store();
    assert!(store.get(Some("Foo"), 'Z').is_none());

    store.add_source(bitmap_font("Foo", "Z"));
    settle(&[&store]).await;

    // The miss was memoized; the store does not invalidate it
    assert!(store.get(Some("Foo"), 'Z').is_none());
    // A key never asked before sees the new source
    assert_eq!(store.get(None, 'Z').unwrap().texture_key(), "Foo/Z");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_removed_source_when_previously_resolved_then_cache_still_answers() {
    let store = root_store();
    let font: Arc<dyn TextureSource> = bitmap_font("Foo", "AB");
    store.add_source(font.clone());
    settle(&[&store]).await;

    let before = store.get(Some("Foo"), 'A').unwrap();
    store.remove_source(&font);

    assert!(store.glyph_sources().is_empty());
    assert_eq!(store.textures().source_count(), 0);
    assert!(Arc::ptr_eq(&before, &store.get(Some("Foo"), 'A').unwrap()));
    assert!(store.get(Some("Foo"), 'B').is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_removed_nested_store_then_its_own_cache_survives() {
    let root = root_store();
    let child = nested_store();
    child.add_source(bitmap_font("Child", "A"));
    let child_as_store: Arc<dyn ComposableStore> = child.clone();
    root.add_store(child_as_store.clone());
    settle(&[&child]).await;

    assert!(root.get(None, 'A').is_some());
    root.remove_store(&child_as_store);

    assert_eq!(root.nested_count(), 0);
    assert!(root.get(Some("Child"), 'A').is_none());
    assert_eq!(child.cached_lookups(), 1);
    assert!(child.get(None, 'A').is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_nested_store_inherits_atlas_and_storage_only_when_unset() {
    let storage = CacheStorage::new("/tmp/glyphstore-parent");
    let parent = Arc::new(
        FontStore::builder()
            .cache_storage(storage.clone())
            .build()
            .unwrap(),
    );

    let bare = nested_store();
    parent.add_store(bare.clone());
    assert!(Arc::ptr_eq(&bare.atlas().unwrap(), &parent.atlas().unwrap()));
    assert_eq!(bare.cache_storage(), Some(storage.clone()));

    let own_atlas = Arc::new(TextureAtlas::new(256, 1));
    let own_storage = CacheStorage::new("/tmp/glyphstore-child");
    let configured = Arc::new(
        FontStore::builder()
            .atlas(own_atlas.clone())
            .cache_storage(own_storage.clone())
            .build()
            .unwrap(),
    );
    parent.add_store(configured.clone());
    assert!(Arc::ptr_eq(&configured.atlas().unwrap(), &own_atlas));
    assert_eq!(configured.cache_storage(), Some(own_storage));

    // Inheritance happened once; a second parent changes nothing
    let other_parent = root_store();
    other_parent.add_store(bare.clone());
    assert!(Arc::ptr_eq(&bare.atlas().unwrap(), &parent.atlas().unwrap()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_nested_glyphs_pack_into_the_shared_atlas() {
    let root = root_store();
    let child = nested_store();
    root.add_store(child.clone());
    child.add_source(bitmap_font("Child", "AB"));
    settle(&[&child]).await;

    let a = root.get(None, 'A').unwrap();
    let b = root.get(None, 'B').unwrap();

    assert_eq!(a.texture().unwrap().texture, b.texture().unwrap().texture);
    assert_eq!(root.atlas().unwrap().page_count(), 1);
}

/// Answers every lookup with one fixed glyph
struct FixedLookup(Arc<TexturedCharacterGlyph>);

impl TexturedGlyphLookup for FixedLookup {
    fn get(&self, _font_name: Option<&str>, character: char) -> Option<Arc<TexturedCharacterGlyph>> {
        (character == self.0.character()).then(|| self.0.clone())
    }
}

impl ComposableStore for FixedLookup {
    fn get_texture(&self, _name: &str) -> Option<TextureRegion> {
        None
    }

    fn as_glyph_lookup(self: Arc<Self>) -> Option<Arc<dyn TexturedGlyphLookup>> {
        Some(self)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_lookup_only_store_joins_search_without_inheritance() {
    let glyph = Arc::new(TexturedCharacterGlyph::new(
        CharacterGlyph::new('x', 0.0, 0.0, 5.0, 5.0),
        "Fixed/x",
        None,
        1.0,
    ));
    let root = root_store();
    root.add_store(Arc::new(FixedLookup(glyph.clone())));
    root.add_store(Arc::new(TextureStore::default()));

    assert_eq!(root.nested_count(), 1);
    assert_eq!(root.textures().store_count(), 2);
    assert!(Arc::ptr_eq(&root.get(Some("anything"), 'x').unwrap(), &glyph));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_get_async_when_resolved_then_shares_cached_entry() {
    let store = root_store();
    store.add_source(bitmap_font("Foo", "A"));
    settle(&[&store]).await;

    let background = store
        .get_async(Some("Foo".to_string()), 'A')
        .await
        .unwrap()
        .unwrap();
    let foreground = store.get(Some("Foo"), 'A').unwrap();

    assert!(Arc::ptr_eq(&background, &foreground));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_lookups_on_one_key_then_all_share_one_arc() {
    let store = root_store();
    store.add_source(bitmap_font("Foo", "W"));
    settle(&[&store]).await;
    assert_eq!(store.cached_lookups(), 0);

    let start = Arc::new(tokio::sync::Barrier::new(32));
    let mut handles = Vec::new();
    for i in 0..32 {
        let store = Arc::clone(&store);
        let start = Arc::clone(&start);
        handles.push(tokio::spawn(async move {
            start.wait().await;
            if i % 2 == 0 {
                store.get_async(Some("Foo".to_string()), 'W').await.unwrap()
            } else {
                tokio::task::spawn_blocking(move || store.get(Some("Foo"), 'W'))
                    .await
                    .unwrap()
            }
        }));
    }

    let mut glyphs = Vec::new();
    for handle in handles {
        glyphs.push(handle.await.unwrap().expect("Foo has W"));
    }

    let first = &glyphs[0];
    assert!(glyphs.iter().all(|glyph| Arc::ptr_eq(glyph, first)));
    assert!(Arc::ptr_eq(first, &store.get(Some("Foo"), 'W').unwrap()));
    assert_eq!(store.cached_lookups(), 1);
}

#[test]
fn test_store_without_runtime_is_an_error() {
    assert!(FontStore::new(StoreConfig::default()).is_err());
}

/// A loaded two-font tree shared by the property tests
fn shared_tree() -> &'static (tokio::runtime::Runtime, Arc<FontStore>) {
    static TREE: OnceLock<(tokio::runtime::Runtime, Arc<FontStore>)> = OnceLock::new();
    TREE.get_or_init(|| {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let root = Arc::new(
            FontStore::builder()
                .runtime(runtime.handle().clone())
                .build()
                .unwrap(),
        );
        let child = Arc::new(
            FontStore::builder()
                .without_atlas()
                .runtime(runtime.handle().clone())
                .build()
                .unwrap(),
        );
        root.add_source(bitmap_font("Fonts/Sans", "ABC"));
        child.add_source(bitmap_font("Fonts/Serif", "CDE"));
        root.add_store(child.clone());

        runtime.block_on(settle(&[&root, &child]));
        (runtime, root)
    })
}

proptest! {
    #[test]
    fn prop_get_is_idempotent(
        font in prop::option::of(prop::sample::select(vec!["", "Sans", "Serif", "Fonts/Sans", "Mono"])),
        character in prop::char::range('A', 'G'),
    ) {
        let (_, store) = shared_tree();

        let first = store.get(font, character);
        let second = store.get(font, character);

        match (first, second) {
            (Some(a), Some(b)) => prop_assert!(Arc::ptr_eq(&a, &b)),
            (None, None) => {},
            (a, b) => prop_assert!(false, "lookups disagree: {:?} vs {:?}", a, b),
        }
    }
}
