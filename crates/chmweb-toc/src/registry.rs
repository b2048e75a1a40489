//! Archive Registry, spec §3 "Archive Registry": archive-stem (case-folded)
//! -> output subdirectory, with lookup by full filename (`.chm`/`.chi`/`.chw`
//! suffix stripped case-insensitively) and reverse lookup by root-relative
//! path prefix.

use indexmap::IndexMap;

use chmweb_types::RootPath;

use crate::error::TocError;

const STRIPPED_SUFFIXES: [&str; 3] = [".chm", ".chi", ".chw"];

#[derive(Debug, Default)]
pub struct ArchiveRegistry {
    /// case-folded stem -> (original-case stem, subdirectory)
    entries: IndexMap<String, (String, String)>,
}

impl ArchiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `stem` (original case preserved for display) at `subdir`.
    /// Fatal on a duplicate stem or a duplicate subdirectory — spec §7 /
    /// SPEC_FULL.md §B.
    pub fn register(&mut self, stem: &str, subdir: &str) -> Result<(), TocError> {
        let folded = fold(stem);
        if let Some((existing, existing_subdir)) = self.entries.get(&folded) {
            if existing_subdir == subdir {
                return Ok(());
            }
            return Err(TocError::DuplicateStem(existing.clone()));
        }
        if let Some((other_stem, _)) = self
            .entries
            .values()
            .find(|(_, existing_subdir)| existing_subdir == subdir)
        {
            return Err(TocError::DuplicateSubdir {
                existing: other_stem.clone(),
                incoming: stem.to_string(),
                subdir: subdir.to_string(),
            });
        }
        self.entries
            .insert(folded, (stem.to_string(), subdir.to_string()));
        Ok(())
    }

    /// Looks up by a bare stem or by a filename carrying a `.chm`/`.chi`/
    /// `.chw` suffix, case-insensitively in both cases.
    pub fn subdir_by_stem(&self, name: &str) -> Option<&str> {
        let stripped = STRIPPED_SUFFIXES
            .iter()
            .find_map(|suffix| {
                let lower_name = name.to_ascii_lowercase();
                lower_name
                    .ends_with(suffix)
                    .then(|| &name[..name.len() - suffix.len()])
            })
            .unwrap_or(name);
        self.entries.get(&fold(stripped)).map(|(_, subdir)| subdir.as_str())
    }

    /// The archive-ordinal (1-based, insertion order) assigned to `stem`,
    /// for multi-archive (chw) topic addressing — spec §4.5.
    pub fn ordinal(&self, stem: &str) -> Option<u32> {
        self.entries
            .get_index_of(&fold(stem))
            .map(|i| i as u32 + 1)
    }

    /// Given a root-relative path, the unique archive-stem whose
    /// subdirectory is a proper prefix of it — spec §3 "Archive Registry".
    pub fn reverse_lookup(&self, path: &RootPath) -> Option<&str> {
        self.entries
            .values()
            .filter(|(_, subdir)| !subdir.is_empty())
            .find(|(_, subdir)| {
                path.as_str().starts_with(subdir.as_str())
                    && path.as_str()[subdir.len()..].starts_with('/')
            })
            .map(|(stem, _)| stem.as_str())
            .or_else(|| {
                self.entries
                    .values()
                    .find(|(_, subdir)| subdir.is_empty())
                    .map(|(stem, _)| stem.as_str())
            })
    }

    pub fn stems(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|(stem, _)| stem.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

fn fold(s: &str) -> String {
    s.chars().flat_map(char::to_lowercase).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive_for_stem_and_suffix() {
        let mut reg = ArchiveRegistry::new();
        reg.register("Manual", "manual").unwrap();
        assert_eq!(reg.subdir_by_stem("MANUAL"), Some("manual"));
        assert_eq!(reg.subdir_by_stem("manual.CHM"), Some("manual"));
        assert_eq!(reg.subdir_by_stem("manual.chi"), Some("manual"));
    }

    #[test]
    fn duplicate_stem_is_rejected() {
        let mut reg = ArchiveRegistry::new();
        reg.register("manual", "m1").unwrap();
        assert!(reg.register("Manual", "m2").is_err());
    }

    #[test]
    fn duplicate_subdir_is_rejected() {
        let mut reg = ArchiveRegistry::new();
        reg.register("a", "shared").unwrap();
        assert!(reg.register("b", "shared").is_err());
    }

    #[test]
    fn reverse_lookup_finds_proper_prefix() {
        let mut reg = ArchiveRegistry::new();
        reg.register("other", "other").unwrap();
        let path = RootPath::new("other/foo/bar.htm".to_string());
        assert_eq!(reg.reverse_lookup(&path), Some("other"));
    }

    #[test]
    fn reverse_lookup_falls_back_to_empty_subdir() {
        let mut reg = ArchiveRegistry::new();
        reg.register("root-archive", "").unwrap();
        let path = RootPath::new("html/a.htm".to_string());
        assert_eq!(reg.reverse_lookup(&path), Some("root-archive"));
    }

    #[test]
    fn ordinals_are_assigned_in_insertion_order() {
        let mut reg = ArchiveRegistry::new();
        reg.register("first", "first").unwrap();
        reg.register("second", "second").unwrap();
        assert_eq!(reg.ordinal("first"), Some(1));
        assert_eq!(reg.ordinal("second"), Some(2));
    }
}
