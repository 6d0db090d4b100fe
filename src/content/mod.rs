mod blog;
mod cache;
mod post;
mod snapshot;
mod source;

pub use self::{
    blog::{Blog, CacheTag},
    cache::TtlCache,
    post::{Post, PostStatus, published_sorted},
    snapshot::Snapshot,
    source::{DocumentStore, LiveSource, PostSource, SnapshotSource},
};

#[cfg(test)]
pub(crate) use self::source::tests::{FakeStore, sample_posts};
