//! `<name>.yaml` worker manifests.
//!
//! ```yaml
//! command: ./bin/ticker        # resolved against the modules directory
//! args: ["--interval", "5"]
//! env:
//!   TICKER_COLOR: "1"
//! cwd: data                    # optional, also resolved against the modules directory
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ensemble_core::CommandUnit;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub command: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

impl Manifest {
    pub fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }

    /// Build the unit, resolving relative paths against `base`.
    ///
    /// A bare `command` (no separator) is left alone so it resolves through
    /// `PATH` at spawn time.
    pub fn into_unit(self, base: &Path) -> CommandUnit {
        let program = if self.command.is_relative() && self.command.components().count() > 1 {
            base.join(&self.command)
        } else {
            self.command
        };

        let mut unit = CommandUnit::new(program).args(self.args);
        unit.env = self.env;
        unit.working_dir = self.cwd.map(|cwd| {
            if cwd.is_relative() {
                base.join(cwd)
            } else {
                cwd
            }
        });
        unit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_manifest_has_defaults() {
        let manifest = Manifest::parse("command: sleep\n").expect("parse");
        assert_eq!(manifest.command, PathBuf::from("sleep"));
        assert!(manifest.args.is_empty());
        assert!(manifest.env.is_empty());
        assert!(manifest.cwd.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Manifest::parse("command: sleep\nrestart: always\n").unwrap_err();
        assert!(err.to_string().contains("restart"), "got: {err}");
    }

    #[test]
    fn missing_command_is_rejected() {
        assert!(Manifest::parse("args: [a]\n").is_err());
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let manifest = Manifest::parse("command: ./bin/tick\ncwd: data\n").expect("parse");
        let unit = manifest.into_unit(Path::new("/srv/modules"));
        assert_eq!(unit.program, PathBuf::from("/srv/modules/./bin/tick"));
        assert_eq!(unit.working_dir, Some(PathBuf::from("/srv/modules/data")));
    }

    #[test]
    fn bare_and_absolute_commands_are_kept() {
        let bare = Manifest::parse("command: python3\n").expect("parse");
        assert_eq!(bare.into_unit(Path::new("/srv")).program, PathBuf::from("python3"));

        let absolute = Manifest::parse("command: /bin/sh\n").expect("parse");
        assert_eq!(absolute.into_unit(Path::new("/srv")).program, PathBuf::from("/bin/sh"));
    }
}
