use std::fs;
use std::path::{Path, PathBuf};

/// Relative tolerance for numeric cells.
const TOLERANCE: f64 = 1e-12;

fn snapshot_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("snapshots")
}

/// Compare the CSV table `actual` with `tests/snapshots/<name>`.
///
/// Rows must match cell by cell. Numeric cells compare within a relative
/// tolerance so that `1` and `1.0`, or a last-digit rounding change, are not
/// reported. With `HALOTRACE_UPDATE_SNAPSHOTS` set, the stored file is
/// rewritten instead.
pub fn assert_csv_snapshot(name: &str, actual: &str) {
    let path = snapshot_root().join(name);
    if std::env::var_os("HALOTRACE_UPDATE_SNAPSHOTS").is_some() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create snapshot directory");
        }
        fs::write(&path, actual).expect("write snapshot");
        return;
    }

    let expected = fs::read_to_string(&path)
        .unwrap_or_else(|_| panic!("no stored table at {}", path.display()));
    assert_csv_eq(name, &expected, actual);
}

/// Compare two CSV tables cell by cell; `name` prefixes the failure message.
pub fn assert_csv_eq(name: &str, expected: &str, actual: &str) {
    let expected_rows = rows(expected);
    let actual_rows = rows(actual);

    for (line, (want, got)) in expected_rows.iter().zip(&actual_rows).enumerate() {
        let same =
            want.len() == got.len() && want.iter().zip(got).all(|(a, b)| cells_match(a, b));
        assert!(
            same,
            "{name}: line {} differs\n  stored: {}\n  actual: {}\n\
             Set HALOTRACE_UPDATE_SNAPSHOTS=1 to regenerate.",
            line + 1,
            want.join(","),
            got.join(","),
        );
    }
    assert_eq!(
        expected_rows.len(),
        actual_rows.len(),
        "{name}: row count differs"
    );
}

fn rows(table: &str) -> Vec<Vec<&str>> {
    table
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(|line| line.split(',').map(str::trim).collect())
        .collect()
}

fn cells_match(want: &str, got: &str) -> bool {
    match (want.parse::<f64>(), got.parse::<f64>()) {
        (Ok(a), Ok(b)) => a == b || (a - b).abs() <= TOLERANCE * a.abs().max(b.abs()),
        _ => want == got,
    }
}
