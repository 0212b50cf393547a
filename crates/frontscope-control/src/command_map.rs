//! Command tables and name lookup.

use crate::command::{CommandSpec, ValueRange};
use crate::types::{ParamType, RwMode};
use crate::{ControlError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::Path;

/// Device info tag of the built-in test map.
pub const TEST_MAP_INFO: &str = "test";

/// The commands a device understands, plus the info tag the device checks
/// at registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandMap {
    /// Tag handed to [`Device::init`](crate::Device::init).
    pub info: String,
    /// Commands in declaration order.
    #[serde(rename = "command", default)]
    commands: Vec<CommandSpec>,
}

fn test_info(kind: &str) -> String {
    format!(
        "This is a test command for testing multiple {kind} reads and writes. \
         Need to keep command description large to test -l option."
    )
}

impl CommandMap {
    /// Create a map and validate it.
    pub fn new(info: impl Into<String>, commands: Vec<CommandSpec>) -> Result<Self> {
        let map = Self {
            info: info.into(),
            commands,
        };
        map.validate()?;
        Ok(map)
    }

    /// Map built from a table known to be consistent.
    pub(crate) fn from_table(info: &str, commands: Vec<CommandSpec>) -> Self {
        Self {
            info: info.to_string(),
            commands,
        }
    }

    /// Map served by the simulated device.
    ///
    /// One read/write command per type with 20 values, a read-only char
    /// command, a hidden command, a three-value command for command lists and
    /// a float command restricted to `[-1, 1]` and `[10, 20]`.
    pub fn test_map() -> Self {
        use ParamType::{Char, Float, Int32, Radians, Uint8, Uint32};
        use RwMode::{ReadOnly, ReadWrite};

        let commands = vec![
            CommandSpec::new("CMD_FLOAT", 0, 0, Float, ReadWrite, 20, &test_info("float")),
            CommandSpec::new("CMD_INT32", 0, 1, Int32, ReadWrite, 20, &test_info("int32")),
            CommandSpec::new("CMD_UINT32", 0, 2, Uint32, ReadWrite, 20, &test_info("uint32")),
            CommandSpec::new("CMD_RADS", 0, 3, Radians, ReadWrite, 20, &test_info("radians")),
            CommandSpec::new("CMD_UINT8", 0, 4, Uint8, ReadWrite, 20, &test_info("uint8")),
            CommandSpec::new("CMD_CHAR", 0, 5, Char, ReadOnly, 20, &test_info("char")),
            CommandSpec::new(
                "CMD_HIDDEN",
                0,
                6,
                Uint8,
                ReadWrite,
                20,
                "This command is supposed to be hidden and not show up when using -l or -d",
            )
            .hidden(),
            CommandSpec::new(
                "CMD_SMALL",
                0,
                7,
                Int32,
                ReadWrite,
                3,
                "This is a small command for testing -e option",
            ),
            CommandSpec::new(
                "CMD_RANGED",
                0,
                8,
                Float,
                ReadWrite,
                2,
                "Float command accepting values in [-1, 1] or [10, 20], for testing range checks",
            )
            .with_ranges(vec![ValueRange::new(-1.0, 1.0), ValueRange::new(10.0, 20.0)]),
        ];
        Self::from_table(TEST_MAP_INFO, commands)
    }

    /// Parse a map from TOML text.
    pub fn from_toml(text: &str, path: &Path) -> Result<Self> {
        let mut map: Self = toml::from_str(text).map_err(|source| ControlError::MapParse {
            path: path.to_path_buf(),
            source,
        })?;
        for cmd in &mut map.commands {
            cmd.name = cmd.name.to_ascii_uppercase();
        }
        map.validate()?;
        Ok(map)
    }

    /// Load a map from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ControlError::MapRead {
            path: path.to_path_buf(),
            source,
        })?;
        let map = Self::from_toml(&text, path)?;
        tracing::debug!(path = %path.display(), commands = map.commands.len(), "loaded command map");
        Ok(map)
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Check names, ids, sizes and ranges for consistency.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        let mut ids = HashSet::new();
        for cmd in &self.commands {
            if cmd.name.is_empty() {
                return Err(ControlError::InvalidMap("empty command name".into()));
            }
            if !names.insert(cmd.name.as_str()) {
                return Err(ControlError::InvalidMap(format!(
                    "duplicate command name {}",
                    cmd.name
                )));
            }
            if cmd.cmd_id & crate::command::READ_BIT != 0 {
                return Err(ControlError::InvalidMap(format!(
                    "{}: command id {} collides with the read bit",
                    cmd.name, cmd.cmd_id
                )));
            }
            if !ids.insert((cmd.res_id, cmd.cmd_id)) {
                return Err(ControlError::InvalidMap(format!(
                    "{}: resource {} command {} is already used",
                    cmd.name, cmd.res_id, cmd.cmd_id
                )));
            }
            if cmd.num_values == 0 {
                return Err(ControlError::InvalidMap(format!(
                    "{}: num_values must be positive",
                    cmd.name
                )));
            }
            if cmd.param_type == ParamType::Char && cmd.rw != RwMode::ReadOnly {
                return Err(ControlError::InvalidMap(format!(
                    "{}: {}",
                    cmd.name,
                    ControlError::CharWrite
                )));
            }
            let empty = |r: &&ValueRange| {
                !matches!(
                    r.min.partial_cmp(&r.max),
                    Some(Ordering::Less | Ordering::Equal)
                )
            };
            if let Some(r) = cmd.ranges.iter().find(empty) {
                return Err(ControlError::InvalidMap(format!(
                    "{}: empty range {r}",
                    cmd.name
                )));
            }
        }
        Ok(())
    }

    /// All commands in declaration order.
    pub fn commands(&self) -> &[CommandSpec] {
        &self.commands
    }

    /// Commands shown by listings and dumps.
    pub fn listed(&self) -> impl Iterator<Item = &CommandSpec> {
        self.commands.iter().filter(|c| c.is_listed())
    }

    /// Case-insensitive lookup.
    pub fn find(&self, name: &str) -> Option<&CommandSpec> {
        let upper = name.to_ascii_uppercase();
        self.commands.iter().find(|c| c.name == upper)
    }

    /// Lookup that fails with the closest listed name as a suggestion.
    pub fn lookup(&self, name: &str) -> Result<&CommandSpec> {
        self.find(name).ok_or_else(|| {
            let upper = name.to_ascii_uppercase();
            ControlError::UnknownCommand {
                suggestion: self.suggest(&upper).map(str::to_string),
                name: upper,
            }
        })
    }

    /// Listed command name closest to `name` by edit distance.
    ///
    /// Ties go to the command declared first.
    pub fn suggest(&self, name: &str) -> Option<&str> {
        let upper = name.to_ascii_uppercase();
        self.listed()
            .map(|c| (edit_distance(&upper, &c.name), c.name.as_str()))
            .min_by_key(|(dist, _)| *dist)
            .map(|(_, name)| name)
    }
}

/// Edit distance counting insertions, deletions, substitutions and
/// transpositions of adjacent characters (optimal string alignment).
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (n, m) = (a.len(), b.len());
    if n == 0 {
        return m;
    }
    if m == 0 {
        return n;
    }

    let mut d = vec![vec![0usize; m + 1]; n + 1];
    for (i, row) in d.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=m {
        d[0][j] = j;
    }

    for i in 1..=n {
        for j in 1..=m {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            let mut cell = (d[i - 1][j] + 1)
                .min(d[i][j - 1] + 1)
                .min(d[i - 1][j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                cell = cell.min(d[i - 2][j - 2] + 1);
            }
            d[i][j] = cell;
        }
    }
    d[n][m]
}
