use std::path::{Path, PathBuf};
use strum::{Display, EnumString};

use crate::decoder::DecodeMode;
use crate::error::ConfigError;
use crate::operation::FilterPolicy;
use crate::tool::DEFAULT_PROGRESS_INTERVAL;

/// What to do when a source goes back in time.
///
/// The merge assumes every source is sorted by timestamp. A source that is not
/// produces locally out-of-order output.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum OrderCheck {
    /// Trust the input.
    Off,

    /// Log the first regression of each source and count all of them.
    #[default]
    Warn,

    /// Abort the run on the first regression.
    Reject,
}

/// Per-source part of the config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceOptions {
    pub policy: FilterPolicy,

    /// Number of filtered rows reduced to one random representative. `1` disables sampling.
    pub group_size: u32,

    pub decode_mode: DecodeMode,

    pub order_check: OrderCheck,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            policy: FilterPolicy::Default,
            group_size: 1,
            decode_mode: DecodeMode::Strict,
            order_check: OrderCheck::Warn,
        }
    }
}

impl SourceOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.group_size == 0 {
            return Err(ConfigError::InvalidGroupSize(0));
        }

        Ok(())
    }
}

/// Validated configuration of one merge run.
#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// Output trace file.
    pub output: PathBuf,

    /// Input trace files. The position in this list is the `source_index`.
    pub inputs: Vec<PathBuf>,

    pub source_options: SourceOptions,

    /// Rows written between two progress messages, `0` disables them.
    pub progress_interval: u64,
}

impl MergeConfig {
    /// `group_size` is signed so that a negative value from the command line is
    /// reported as an invalid group size rather than a parse failure.
    pub fn new(
        output: PathBuf,
        group_size: i64,
        policy: FilterPolicy,
        inputs: Vec<PathBuf>,
    ) -> Result<Self, ConfigError> {
        if output.as_os_str().is_empty() {
            return Err(ConfigError::MissingArgument("output_file"));
        }

        if group_size <= 0 || group_size > u32::MAX as i64 {
            return Err(ConfigError::InvalidGroupSize(group_size));
        }

        if inputs.is_empty() {
            return Err(ConfigError::MissingArgument("input_file"));
        }

        if let Some(input) = inputs.iter().find(|p| **p == output) {
            return Err(ConfigError::InvalidArgument {
                name: "output_file",
                value: format!("{} is also an input file", input.display()),
            });
        }

        Ok(Self {
            output,
            inputs,
            source_options: SourceOptions {
                policy,
                group_size: group_size as u32,
                ..SourceOptions::default()
            },
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        })
    }

    pub fn with_decode_mode(mut self, decode_mode: DecodeMode) -> Self {
        self.source_options.decode_mode = decode_mode;
        self
    }

    pub fn with_order_check(mut self, order_check: OrderCheck) -> Self {
        self.source_options.order_check = order_check;
        self
    }

    pub fn with_progress_interval(mut self, progress_interval: u64) -> Self {
        self.progress_interval = progress_interval;
        self
    }

    pub fn group_size(&self) -> u32 {
        self.source_options.group_size
    }

    pub fn policy(&self) -> FilterPolicy {
        self.source_options.policy
    }

    /// Reject an output that resolves to the same file as one of the inputs,
    /// e.g. through `..` components or a symlink. Must run before the output is
    /// created, since creating it truncates the input.
    pub fn check_output_is_not_input(&self) -> Result<(), ConfigError> {
        let output = resolve_path(&self.output);

        match self.inputs.iter().find(|p| resolve_path(p) == output) {
            Some(input) => Err(ConfigError::InvalidArgument {
                name: "output_file",
                value: format!(
                    "{} is the same file as input {}",
                    self.output.display(),
                    input.display()
                ),
            }),
            None => Ok(()),
        }
    }
}

/// Canonical form of `path`. A file that does not exist yet resolves through
/// its parent directory, a path that cannot be resolved at all is kept as is.
fn resolve_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }

    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };

            match parent.canonicalize() {
                Ok(parent) => parent.join(name),
                Err(_) => path.to_path_buf(),
            }
        }
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn inputs() -> Vec<PathBuf> {
        vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")]
    }

    #[test]
    fn test_new_config() {
        let config = MergeConfig::new(
            PathBuf::from("out.csv"),
            4,
            FilterPolicy::IncludeWrites,
            inputs(),
        )
        .unwrap()
        .with_order_check(OrderCheck::Reject)
        .with_progress_interval(0);

        assert_eq!(config.group_size(), 4);
        assert_eq!(config.policy(), FilterPolicy::IncludeWrites);
        assert_eq!(config.source_options.decode_mode, DecodeMode::Strict);
        assert_eq!(config.source_options.order_check, OrderCheck::Reject);
        assert_eq!(config.progress_interval, 0);
        assert_eq!(config.inputs.len(), 2);
    }

    #[test]
    fn test_invalid_group_size() {
        for group_size in [0, -1, u32::MAX as i64 + 1] {
            let res = MergeConfig::new(
                PathBuf::from("out.csv"),
                group_size,
                FilterPolicy::Default,
                inputs(),
            );
            assert_eq!(res.unwrap_err(), ConfigError::InvalidGroupSize(group_size));
        }
    }

    #[test]
    fn test_missing_arguments() {
        let res = MergeConfig::new(PathBuf::from("out.csv"), 1, FilterPolicy::Default, vec![]);
        assert_eq!(res.unwrap_err(), ConfigError::MissingArgument("input_file"));

        let res = MergeConfig::new(PathBuf::new(), 1, FilterPolicy::Default, inputs());
        assert_eq!(res.unwrap_err(), ConfigError::MissingArgument("output_file"));
    }

    #[test]
    fn test_output_is_input() {
        let res = MergeConfig::new(PathBuf::from("a.csv"), 1, FilterPolicy::Default, inputs());
        assert!(matches!(
            res,
            Err(ConfigError::InvalidArgument { name: "output_file", .. })
        ));
    }

    #[test]
    fn test_output_aliases_input() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::create_dir(dir.path().join("sub"))?;
        let input = dir.path().join("a.csv");
        std::fs::write(&input, "1,k,1,1,1,get,0\n")?;

        let alias = dir.path().join("sub").join("..").join("a.csv");
        let config =
            MergeConfig::new(alias, 1, FilterPolicy::Default, vec![input.clone()])?;
        assert!(matches!(
            config.check_output_is_not_input(),
            Err(ConfigError::InvalidArgument { name: "output_file", .. })
        ));

        // Output that does not exist yet, next to the input.
        let config = MergeConfig::new(
            dir.path().join("sub").join("..").join("merged.csv"),
            1,
            FilterPolicy::Default,
            vec![input],
        )?;
        assert!(config.check_output_is_not_input().is_ok());

        Ok(())
    }

    #[test]
    fn test_source_options() {
        let options = SourceOptions::default();
        assert!(options.validate().is_ok());

        let options = SourceOptions {
            group_size: 0,
            ..options
        };
        assert_eq!(options.validate(), Err(ConfigError::InvalidGroupSize(0)));

        assert_eq!(OrderCheck::from_str("reject").unwrap(), OrderCheck::Reject);
        assert_eq!(OrderCheck::default().to_string(), "warn");
    }
}
