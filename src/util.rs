use std::hash::{BuildHasher, Hash, Hasher};

pub fn hash<B, U>(hash_builder: &B, item: &U) -> u64
where
    B: BuildHasher,
    U: Hash + ?Sized,
{
    let mut hasher = hash_builder.build_hasher();
    item.hash(&mut hasher);
    hasher.finish()
}
