use std::{
    hash::{DefaultHasher, Hash, Hasher},
    path::{Path, PathBuf},
};

pub fn get_root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("reelsub")
}

/// Get the cache directory for a given source video
pub fn get_cache_dir(source: &Path) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    source.to_string_lossy().hash(&mut hasher);
    let source_hash = hasher.finish();

    get_root_cache_dir().join(source_hash.to_string())
}

/// Get the path for a cached transcript file
pub fn get_transcript_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join("transcript.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_dir_is_stable_per_source() {
        let a = get_cache_dir(Path::new("/videos/reel.mp4"));
        let b = get_cache_dir(Path::new("/videos/reel.mp4"));
        let other = get_cache_dir(Path::new("/videos/other.mp4"));
        assert_eq!(a, b);
        assert_ne!(a, other);
        assert!(a.starts_with(get_root_cache_dir()));
    }
}
