// tests/path_filter.rs

use std::path::Path;

use buildwatch::watch::PathFilter;
use buildwatch_test_utils::builders::WatchConfigBuilder;
use proptest::prelude::*;

const ARTIFACT: &str = "/srv/demo/app";

#[test]
fn path_with_watched_extension_is_relevant() {
    let filter = PathFilter::new([".go"], ARTIFACT);
    assert!(!filter.is_ignorable(Path::new("/srv/demo/main.go")));
    assert!(!filter.is_ignorable(Path::new("/srv/demo/internal/db/db.go")));
}

#[test]
fn path_with_other_extension_is_ignorable() {
    let filter = PathFilter::new([".go"], ARTIFACT);
    assert!(filter.is_ignorable(Path::new("/srv/demo/README.md")));
    assert!(filter.is_ignorable(Path::new("/srv/demo/main.go.swp")));
}

#[test]
fn any_of_several_extensions_matches() {
    let filter = PathFilter::new([".go", ".tmpl"], ARTIFACT);
    assert!(!filter.is_ignorable(Path::new("/srv/demo/views/index.tmpl")));
    assert!(!filter.is_ignorable(Path::new("/srv/demo/main.go")));
    assert!(filter.is_ignorable(Path::new("/srv/demo/style.css")));
}

#[test]
fn extensions_are_plain_suffixes() {
    let filter = PathFilter::new(["_test.go"], ARTIFACT);
    assert!(!filter.is_ignorable(Path::new("/srv/demo/main_test.go")));
    assert!(filter.is_ignorable(Path::new("/srv/demo/main.go")));
}

#[test]
fn wildcard_watches_everything() {
    let filter = PathFilter::new(["*"], ARTIFACT);
    assert!(!filter.is_ignorable(Path::new("/srv/demo/README.md")));
    assert!(!filter.is_ignorable(Path::new("/srv/demo/Makefile")));
}

#[test]
fn artifact_is_ignored_under_wildcard() {
    let filter = PathFilter::new(["*"], ARTIFACT);
    assert!(filter.is_ignorable(Path::new(ARTIFACT)));
}

#[test]
fn artifact_is_ignored_even_when_its_extension_is_watched() {
    let filter = PathFilter::new([".exe"], "/srv/demo/app.exe");
    assert!(filter.is_ignorable(Path::new("/srv/demo/app.exe")));
    assert!(!filter.is_ignorable(Path::new("/srv/demo/tools/other.exe")));
}

#[test]
fn filter_from_config_uses_extensions_and_artifact() {
    let cfg = WatchConfigBuilder::new()
        .extensions(&[".rs", ".toml"])
        .artifact("/srv/demo/target/debug/demo")
        .build();

    let filter = PathFilter::from_config(&cfg);

    assert_eq!(filter.artifact(), Path::new("/srv/demo/target/debug/demo"));
    assert!(!filter.is_ignorable(Path::new("/srv/demo/Cargo.toml")));
    assert!(filter.is_ignorable(Path::new("/srv/demo/target/debug/demo")));
}

proptest! {
    #[test]
    fn wildcard_never_ignores_a_non_artifact_path(path in "(/[a-z0-9_.]{1,12}){1,5}") {
        prop_assume!(Path::new(&path) != Path::new(ARTIFACT));
        let filter = PathFilter::new(["*", ".go"], ARTIFACT);
        prop_assert!(!filter.is_ignorable(Path::new(&path)));
    }

    #[test]
    fn artifact_is_always_ignorable(exts in prop::collection::vec("\\.[a-z]{1,4}|\\*", 0..4)) {
        let filter = PathFilter::new(exts, ARTIFACT);
        prop_assert!(filter.is_ignorable(Path::new(ARTIFACT)));
    }

    #[test]
    fn suffix_decides_relevance(stem in "/[a-z]{1,8}/[a-z]{1,8}", ext in "\\.[a-z]{1,4}") {
        let filter = PathFilter::new([ext.clone()], ARTIFACT);

        let relevant = format!("{stem}{ext}");
        prop_assert!(!filter.is_ignorable(Path::new(&relevant)));

        // Editor backup files end in `~`, which no extension here can match.
        let backup = format!("{stem}{ext}~");
        prop_assert!(filter.is_ignorable(Path::new(&backup)));
    }
}
