use std::path::PathBuf;

use quarry::diag;
use quarry::stream::{self, StreamError};
use quarry::values::LootTable;
use serde_json::json;

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("quarry-stream-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_warning_names_file_and_path() {
        diag::drain();
        let dir = temp_dir("nested");
        let path = dir.join("loot.json");
        stream::write_file(
            &path,
            &json!({ "Entries": [{ "ItemIds": [1] }, { "ItemIds": [2], "MinCount": "many" }] }),
        )
        .unwrap();

        let mut table = LootTable::default();
        stream::read_file(&mut table, &path).unwrap();
        assert_eq!(table.entries.len(), 2);
        assert_eq!(table.entries[1].item_ids, vec![2]);
        assert_eq!(table.entries[1].min_count, 1);

        let warnings = diag::drain();
        assert_eq!(warnings.len(), 1);
        let expected = format!("{}::Entries[1].MinCount", path.display());
        assert!(warnings[0].contains(&expected), "{}", warnings[0]);
        assert_eq!(stream::location(), "(root)");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = temp_dir("missing");
        let mut table = LootTable::default();
        let err = stream::read_file(&mut table, &dir.join("absent.json")).unwrap_err();
        assert!(matches!(err, StreamError::Io { .. }));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = temp_dir("malformed");
        let path = dir.join("bad.json");
        std::fs::write(&path, "[1, 2").unwrap();
        let err = stream::parse_file(&path).unwrap_err();
        assert!(matches!(err, StreamError::Parse { .. }));
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn written_files_keep_key_order_and_create_directories() {
        let dir = temp_dir("write");
        let path = dir.join("deep/er/table.json");
        let table = LootTable { min_rolls: 2, max_rolls: 3, ..LootTable::default() };
        stream::write_file(&path, &stream::write_object(&table)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let order: Vec<usize> = ["Entries", "RandomRollsEnabled", "MinRolls", "MaxRolls"]
            .iter()
            .map(|key| text.find(key).unwrap())
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));

        let mut loaded = LootTable::default();
        stream::read_file(&mut loaded, &path).unwrap();
        assert_eq!(loaded, table);
    }
}
