//! Fallback resolution against in-memory upstream, mirror and listing doubles.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use debsnap_fetch::TransferErrorKind;
use debsnap_resolve::core::{NamingConvention, Role};
use debsnap_resolve::{
    ContentRecord, Error, FileInfo, Inspector, ListingError, ListingSource, MirrorConfig, MirrorDirectoryCache,
    Orchestrator, PackageQuery, ProbeFailure, Resolution, ResolutionResult, ResultCache, SnapshotResolver,
    SnapshotService, UpstreamError, UpstreamPayload,
};

const TTL: Duration = Duration::from_secs(3600);
const MIRROR: &str = "https://mirror.test/debian";
const BACKUP: &str = "https://backup.test/debian";

#[derive(Default)]
struct FakeUpstream {
    payload: Option<UpstreamPayload>,
    calls: AtomicUsize,
}

impl SnapshotService for FakeUpstream {
    async fn lookup(&self, _query: &PackageQuery) -> Result<UpstreamPayload, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.payload.clone().ok_or(UpstreamError::NotFound)
    }
}

enum Served {
    File(&'static str),
    Exhausted,
}

/// Serves files by URL; everything else is a 404.
#[derive(Default)]
struct FakeMirror {
    files: Mutex<HashMap<String, Served>>,
    probed: Mutex<Vec<String>>,
}

impl FakeMirror {
    fn with(mut self, url: &str, served: Served) -> Self {
        self.files.get_mut().unwrap().insert(url.to_string(), served);
        self
    }

    fn calls(&self) -> usize {
        self.probed.lock().unwrap().len()
    }
}

impl Inspector for FakeMirror {
    async fn inspect(&self, url: &str, filename: &str) -> FileInfo {
        self.probed.lock().unwrap().push(url.to_string());
        match self.files.lock().unwrap().get(url) {
            Some(Served::File(hash)) => FileInfo::found(
                200,
                filename,
                url,
                ContentRecord {
                    hash: hash.to_string(),
                    first_seen: "20230102T030405Z".to_string(),
                    size: 1024,
                },
            ),
            Some(Served::Exhausted) => {
                FileInfo::absent(503, filename, url, ProbeFailure::Transfer(TransferErrorKind::Exhausted))
            }
            None => FileInfo::absent(404, filename, url, ProbeFailure::Transfer(TransferErrorKind::NotFound)),
        }
    }
}

struct FakeListing(Result<Vec<String>, ()>);

impl ListingSource for FakeListing {
    async fn fetch(&self) -> Result<Vec<String>, ListingError> {
        self.0.clone().map_err(|()| ListingError::Empty)
    }
}

type TestOrchestrator = Orchestrator<Arc<FakeUpstream>, Arc<FakeMirror>, FakeListing>;

fn orchestrator(upstream: &Arc<FakeUpstream>, mirror: &Arc<FakeMirror>) -> TestOrchestrator {
    Orchestrator::new(
        Arc::clone(upstream),
        Arc::clone(mirror),
        vec![MirrorConfig::new(MIRROR, "debian")],
        NamingConvention::default(),
    )
}

fn file(path: &str) -> String {
    format!("{MIRROR}/{path}")
}

fn envelope(resolution: &Resolution) -> &ResolutionResult {
    resolution.envelope().expect("resolution should carry an envelope")
}

fn assert_hash_index_consistent(result: &ResolutionResult) {
    for entry in result.entries() {
        assert!(result.fileinfo().contains_key(&entry.hash), "orphan result hash {}", entry.hash);
    }
    for hash in result.fileinfo().keys() {
        assert!(result.entries().iter().any(|e| &e.hash == hash), "orphan fileinfo key {hash}");
    }
}

fn full_libfoo() -> FakeMirror {
    FakeMirror::default()
        .with(&file("pool/main/libf/libfoo/libfoo_1.2-1.dsc"), Served::File("d5c"))
        .with(&file("pool/main/libf/libfoo/libfoo_1.2.orig.tar.gz"), Served::File("0r1"))
        .with(&file("pool/main/libf/libfoo/libfoo_1.2-1.debian.tar.xz"), Served::File("deb"))
        .with(&file("pool/main/libf/libfoo/libfoo_1.2-1.tar.xz"), Served::File("nat"))
}

#[tokio::test]
async fn upstream_hit_is_returned_verbatim() {
    let payload = UpstreamPayload {
        status: 200,
        body: r#"{"package": "foo", "result": []}"#.to_string(),
    };
    let upstream = Arc::new(FakeUpstream {
        payload: Some(payload.clone()),
        ..Default::default()
    });
    let mirror = Arc::new(FakeMirror::default());

    let resolution = orchestrator(&upstream, &mirror)
        .resolve(&PackageQuery::source("foo", "1.2-1").unwrap())
        .await
        .unwrap();

    assert_eq!(resolution, Resolution::Upstream(payload));
    assert_eq!(mirror.calls(), 0);
}

#[tokio::test]
async fn lib_package_resolves_three_files() {
    let upstream = Arc::new(FakeUpstream::default());
    let mirror = Arc::new(full_libfoo());

    let resolution = orchestrator(&upstream, &mirror)
        .resolve(&PackageQuery::source("libfoo", "1.2-1").unwrap())
        .await
        .unwrap();

    assert!(matches!(resolution, Resolution::Complete(_)));
    let result = envelope(&resolution);
    assert_eq!(result.entries().len(), 3);
    assert_eq!(result.roles().collect::<Vec<_>>(), [Role::Dsc, Role::Orig, Role::Debian]);
    assert_eq!(result.fileinfo()["d5c"][0].path, "/pool/main/libf/libfoo");
    assert_eq!(result.fileinfo()["0r1"][0].name, "libfoo_1.2.orig.tar.gz");
    assert!(!result.fileinfo().contains_key("nat"));
    assert_hash_index_consistent(result);

    // The native tarball is never probed once the split is present.
    assert!(!mirror.probed.lock().unwrap().iter().any(|url| url.ends_with("libfoo_1.2-1.tar.xz")));
}

#[tokio::test]
async fn plain_package_uses_single_letter_prefix() {
    let upstream = Arc::new(FakeUpstream::default());
    let mirror = Arc::new(
        FakeMirror::default()
            .with(&file("pool/main/f/foo/foo_1.2-1.dsc"), Served::File("a1"))
            .with(&file("pool/main/f/foo/foo_1.2.orig.tar.bz2"), Served::File("a2"))
            .with(&file("pool/main/f/foo/foo_1.2-1.debian.tar.xz"), Served::File("a3")),
    );

    let resolution = orchestrator(&upstream, &mirror)
        .resolve(&PackageQuery::source("foo", "1.2-1").unwrap())
        .await
        .unwrap();

    let result = envelope(&resolution);
    assert!(result.fileinfo().values().flatten().all(|loc| loc.path == "/pool/main/f/foo"));
    assert_eq!(result.fileinfo()["a2"][0].name, "foo_1.2.orig.tar.bz2");
    assert_hash_index_consistent(result);
}

#[tokio::test]
async fn native_package_is_partial_complete() {
    let upstream = Arc::new(FakeUpstream::default());
    let mirror = Arc::new(
        FakeMirror::default()
            .with(&file("pool/main/f/foo/foo_1.0.dsc"), Served::File("b1"))
            .with(&file("pool/main/f/foo/foo_1.0.tar.xz"), Served::File("b2")),
    );

    let resolution = orchestrator(&upstream, &mirror)
        .resolve(&PackageQuery::source("foo", "1.0").unwrap())
        .await
        .unwrap();

    assert!(matches!(resolution, Resolution::PartialComplete(_)));
    let result = envelope(&resolution);
    assert_eq!(result.roles().collect::<Vec<_>>(), [Role::Dsc, Role::Native]);
    assert_hash_index_consistent(result);
}

#[tokio::test]
async fn dsc_alone_is_not_found() {
    let upstream = Arc::new(FakeUpstream::default());
    let mirror = Arc::new(FakeMirror::default().with(&file("pool/main/f/foo/foo_1.0-1.dsc"), Served::File("c1")));

    let resolution = orchestrator(&upstream, &mirror)
        .resolve(&PackageQuery::source("foo", "1.0-1").unwrap())
        .await
        .unwrap();

    assert_eq!(resolution, Resolution::NotFound);
}

#[tokio::test]
async fn orig_without_debian_is_not_found() {
    let upstream = Arc::new(FakeUpstream::default());
    let mirror = Arc::new(
        FakeMirror::default()
            .with(&file("pool/main/f/foo/foo_1.0-1.dsc"), Served::File("c1"))
            .with(&file("pool/main/f/foo/foo_1.0.orig.tar.xz"), Served::File("c2")),
    );

    let resolution = orchestrator(&upstream, &mirror)
        .resolve(&PackageQuery::source("foo", "1.0-1").unwrap())
        .await
        .unwrap();

    assert_eq!(resolution, Resolution::NotFound);
}

#[tokio::test]
async fn exhausted_mandatory_role_is_an_error() {
    let upstream = Arc::new(FakeUpstream::default());
    let mirror = Arc::new(
        FakeMirror::default()
            .with(&file("pool/main/f/foo/foo_1.0-1.dsc"), Served::Exhausted)
            .with(&file("pool/main/f/foo/foo_1.0.orig.tar.gz"), Served::File("e1"))
            .with(&file("pool/main/f/foo/foo_1.0-1.debian.tar.xz"), Served::File("e2")),
    );

    let error = orchestrator(&upstream, &mirror)
        .resolve(&PackageQuery::source("foo", "1.0-1").unwrap())
        .await
        .unwrap_err();

    match error {
        Error::ExhaustedRetries { url } => assert_eq!(url, file("pool/main/f/foo/foo_1.0-1.dsc")),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn later_mirror_answers_when_first_lacks_files() {
    let upstream = Arc::new(FakeUpstream::default());
    let mirror = Arc::new(
        FakeMirror::default()
            .with(&format!("{BACKUP}/pool/main/f/foo/foo_1.0.dsc"), Served::File("f1"))
            .with(&format!("{BACKUP}/pool/main/f/foo/foo_1.0.tar.xz"), Served::File("f2")),
    );
    let orchestrator: TestOrchestrator = Orchestrator::new(
        Arc::clone(&upstream),
        Arc::clone(&mirror),
        vec![MirrorConfig::new(MIRROR, "debian"), MirrorConfig::new(BACKUP, "backup")],
        NamingConvention::default(),
    );

    let resolution = orchestrator
        .resolve(&PackageQuery::source("foo", "1.0").unwrap())
        .await
        .unwrap();

    assert_eq!(envelope(&resolution).fileinfo()["f1"][0].archive_name, "backup");
}

#[tokio::test]
async fn binary_architectures_reported_in_fixed_order() {
    let upstream = Arc::new(FakeUpstream::default());
    let mirror = Arc::new(
        FakeMirror::default()
            .with(&file("pool/main/f/foo/foo_2.0-1_all.deb"), Served::File("z9"))
            .with(&file("pool/main/f/foo/foo_2.0-1_amd64.deb"), Served::File("a0")),
    );

    let resolution = orchestrator(&upstream, &mirror)
        .resolve(&PackageQuery::binary("foo", "2.0-1").unwrap())
        .await
        .unwrap();

    let result = envelope(&resolution);
    let arches: Vec<_> = result.entries().iter().map(|e| e.architecture.as_deref()).collect();
    assert_eq!(arches, [Some("amd64"), Some("all")]);
    assert_hash_index_consistent(result);
}

#[tokio::test]
async fn binary_found_through_listing_uses_listed_directory() {
    let upstream = Arc::new(FakeUpstream::default());
    let mirror = Arc::new(
        FakeMirror::default().with(&file("pool/main/f/foo-src/foo-utils_1.0_all.deb"), Served::File("l1")),
    );
    let listing = FakeListing(Ok(vec!["pool/main/f/foo-src/foo-utils_1.0_all.deb".to_string()]));

    let resolution = orchestrator(&upstream, &mirror)
        .with_listing(MirrorDirectoryCache::new(listing, Duration::from_secs(300)))
        .resolve(&PackageQuery::binary("foo-utils", "1.0").unwrap())
        .await
        .unwrap();

    let result = envelope(&resolution);
    assert_eq!(result.entries().len(), 1);
    assert_eq!(result.entries()[0].architecture.as_deref(), Some("all"));
    assert_eq!(result.fileinfo()["l1"][0].path, "/pool/main/f/foo-src");
    // amd64 is absent from the listing and never probed.
    assert_eq!(mirror.calls(), 1);
}

#[tokio::test]
async fn failed_listing_falls_back_to_direct_probe() {
    let upstream = Arc::new(FakeUpstream::default());
    let mirror = Arc::new(FakeMirror::default().with(&file("pool/main/f/foo/foo_1.0_amd64.deb"), Served::File("p1")));

    let resolution = orchestrator(&upstream, &mirror)
        .with_listing(MirrorDirectoryCache::new(FakeListing(Err(())), Duration::from_secs(300)))
        .resolve(&PackageQuery::binary("foo", "1.0").unwrap())
        .await
        .unwrap();

    assert_eq!(envelope(&resolution).fileinfo()["p1"][0].path, "/pool/main/f/foo");
}

#[tokio::test]
async fn repeated_queries_within_ttl_resolve_once() {
    let upstream = Arc::new(FakeUpstream::default());
    let mirror = Arc::new(full_libfoo());
    let resolver = SnapshotResolver::new(orchestrator(&upstream, &mirror), ResultCache::new(64), TTL);

    let first = resolver.resolve_source("libfoo", "1.2-1").await.unwrap();
    let probes = mirror.calls();
    let second = resolver.resolve_source("libfoo", "1.2-1").await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(upstream.calls.load(Ordering::SeqCst), 1);
    assert_eq!(mirror.calls(), probes);
}

#[tokio::test]
async fn not_found_is_cached_too() {
    let upstream = Arc::new(FakeUpstream::default());
    let mirror = Arc::new(FakeMirror::default());
    let resolver = SnapshotResolver::new(orchestrator(&upstream, &mirror), ResultCache::new(64), TTL);

    assert!(resolver.resolve_binary("foo", "1.0").await.unwrap().is_not_found());
    assert!(resolver.resolve_binary("foo", "1.0").await.unwrap().is_not_found());
    assert_eq!(upstream.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn invalid_query_never_probes() {
    let upstream = Arc::new(FakeUpstream::default());
    let mirror = Arc::new(FakeMirror::default());
    let resolver = SnapshotResolver::new(orchestrator(&upstream, &mirror), ResultCache::new(64), TTL);

    let error = resolver.resolve_source("foo", "../../etc/passwd").await.unwrap_err();

    assert!(matches!(error, Error::InvalidQuery(_)));
    assert_eq!(upstream.calls.load(Ordering::SeqCst), 0);
    assert_eq!(mirror.calls(), 0);
}
