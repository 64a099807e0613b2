//! A set of strings kept in a single container.
//!
//! Every mutation decrypts the whole set, changes it in memory, and writes a
//! freshly encrypted container over the old one. Concurrent writers against
//! the same file must be serialised by the caller.

use std::collections::BTreeSet;
use std::io::Cursor;

use crate::error::{CryptoError, EnDecryptionError};
use crate::keystore::KeyStore;
use crate::storage::Storage;
use crate::Backpack;

type SetResult<T> = Result<T, EnDecryptionError>;

impl<K: KeyStore> Backpack<K> {
    /// Reads the set stored in `storage`; a missing file is the empty set.
    pub fn load_strings(
        &self,
        storage: &Storage,
        passphrase: Option<&str>,
    ) -> SetResult<BTreeSet<String>> {
        let Some(data) = storage.load_if_exists()? else {
            return Ok(BTreeSet::new());
        };

        let mut source = Cursor::new(data);
        let plaintext = match passphrase {
            Some(passphrase) => self.decrypt_with_passphrase(&mut source, passphrase)?,
            None => self.decrypt(&mut source)?,
        };

        serde_json::from_slice(&plaintext).map_err(|e| CryptoError::from(e).into())
    }

    /// Adds each string not already present. The container is only rewritten
    /// when the set changed.
    pub fn append_strings(
        &self,
        storage: &Storage,
        strings: &[&str],
        passphrase: Option<&str>,
    ) -> SetResult<()> {
        let mut set = self.load_strings(storage, passphrase)?;

        let mut changed = false;
        for s in strings {
            changed |= set.insert((*s).to_string());
        }

        if changed {
            self.store_strings(storage, &set, passphrase)?;
        }
        Ok(())
    }

    /// Removes `string`; removing an absent string leaves the file untouched.
    pub fn remove_string(
        &self,
        storage: &Storage,
        string: &str,
        passphrase: Option<&str>,
    ) -> SetResult<()> {
        let mut set = self.load_strings(storage, passphrase)?;

        if set.remove(string) {
            self.store_strings(storage, &set, passphrase)?;
        }
        Ok(())
    }

    fn store_strings(
        &self,
        storage: &Storage,
        set: &BTreeSet<String>,
        passphrase: Option<&str>,
    ) -> SetResult<()> {
        let plaintext = zeroize::Zeroizing::new(
            serde_json::to_vec(set).map_err(CryptoError::from)?,
        );

        let mut container = Vec::new();
        match passphrase {
            Some(passphrase) => {
                self.encrypt_with_passphrase(&plaintext, &mut container, passphrase)?
            }
            None => self.encrypt(&plaintext, &mut container)?,
        };

        storage.save(&container)?;
        tracing::debug!(entries = set.len(), "stored set rewritten");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;
    use crate::test_backpack;

    #[test]
    fn append_twice_keeps_one_entry() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("set.bin"));
        let backpack = test_backpack();

        backpack.append_strings(&storage, &["x"], None).unwrap();
        backpack.append_strings(&storage, &["x"], None).unwrap();

        let set = backpack.load_strings(&storage, None).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.contains("x"));
    }

    #[test]
    fn append_many_then_remove_one() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("set.bin"));
        let backpack = test_backpack();

        backpack
            .append_strings(&storage, &["a", "b", "c"], None)
            .unwrap();
        backpack.remove_string(&storage, "b", None).unwrap();

        let set = backpack.load_strings(&storage, None).unwrap();
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[test]
    fn removing_absent_string_is_noop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("set.bin");
        let storage = Storage::new(path.clone());
        let backpack = test_backpack();

        backpack.append_strings(&storage, &["a"], None).unwrap();
        let before = fs::read(&path).unwrap();

        backpack.remove_string(&storage, "missing", None).unwrap();

        assert_eq!(fs::read(&path).unwrap(), before);
        assert_eq!(backpack.load_strings(&storage, None).unwrap().len(), 1);
    }

    #[test]
    fn missing_container_reads_empty() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("set.bin"));
        let backpack = test_backpack();

        assert!(backpack.load_strings(&storage, None).unwrap().is_empty());
        backpack.remove_string(&storage, "a", None).unwrap();
        assert!(!storage.exists());
    }

    #[test]
    fn passphrase_set_needs_passphrase() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("set.bin"));
        let backpack = test_backpack();

        backpack
            .append_strings(&storage, &["a"], Some("pw"))
            .unwrap();
        backpack
            .append_strings(&storage, &["b"], Some("pw"))
            .unwrap();

        let set = backpack.load_strings(&storage, Some("pw")).unwrap();
        assert_eq!(set.len(), 2);

        let err = backpack
            .load_strings(&storage, Some("wrong"))
            .unwrap_err();
        assert!(err.is_authentication_failure());
    }
}
