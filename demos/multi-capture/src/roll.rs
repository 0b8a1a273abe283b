use std::path::PathBuf;

use camera_capture_core::StoredAsset;

/// The user's captures in display order, one entry per thumbnail.
///
/// Owned by the UI thread. Entries are removed from the roll before the asset
/// is deleted from disk, so the roll never points at a deleted file.
#[derive(Debug, Default)]
pub struct CaptureRoll {
    items: Vec<StoredAsset>,
}

impl CaptureRoll {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, asset: StoredAsset) {
        self.items.push(asset);
    }

    /// Take the item at `index` out of the roll. `None` if out of range.
    pub fn remove(&mut self, index: usize) -> Option<StoredAsset> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    /// Drag the item at `from` to position `to`, shifting the ones in between.
    /// Returns false, leaving the roll untouched, if either index is out of range.
    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        if from >= self.items.len() || to >= self.items.len() {
            return false;
        }
        let item = self.items.remove(from);
        self.items.insert(to, item);
        true
    }

    /// File locations in display order, what the screen hands back to its caller.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.items.iter().map(|asset| asset.path.clone()).collect()
    }

    pub fn items(&self) -> &[StoredAsset] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    fn asset(name: &str) -> StoredAsset {
        StoredAsset {
            path: PathBuf::from("/cache").join(name),
            file_name: name.into(),
            byte_len: 1,
            checksum: String::new(),
            created_at: Local::now(),
        }
    }

    fn names(roll: &CaptureRoll) -> Vec<&str> {
        roll.items().iter().map(|a| a.file_name.as_str()).collect()
    }

    fn roll_of(names: &[&str]) -> CaptureRoll {
        let mut roll = CaptureRoll::new();
        for name in names {
            roll.push(asset(name));
        }
        roll
    }

    #[test]
    fn move_shifts_items_between() {
        let mut roll = roll_of(&["a", "b", "c", "d"]);
        assert!(roll.move_item(0, 2));
        assert_eq!(names(&roll), vec!["b", "c", "a", "d"]);
        assert!(roll.move_item(3, 0));
        assert_eq!(names(&roll), vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn out_of_range_edits_are_ignored() {
        let mut roll = roll_of(&["a", "b"]);
        assert!(!roll.move_item(0, 2));
        assert!(roll.remove(5).is_none());
        assert_eq!(names(&roll), vec!["a", "b"]);
    }

    #[test]
    fn paths_follow_display_order() {
        let mut roll = roll_of(&["a", "b", "c"]);
        let removed = roll.remove(1).unwrap();
        assert_eq!(removed.file_name, "b");
        assert_eq!(roll.paths(), vec![PathBuf::from("/cache/a"), PathBuf::from("/cache/c")]);
        assert_eq!(roll.len(), 2);
    }
}
