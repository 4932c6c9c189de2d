mod cached;

pub use cached::CachedRepository;
