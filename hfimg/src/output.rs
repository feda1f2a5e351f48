//! Output path resolution with format-aware extension changes.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};

/// Where converted files go.
pub struct OutputConfig {
    target_dir: Option<PathBuf>,
    target_file: Option<PathBuf>,
    extension: &'static str,
}

impl OutputConfig {
    /// `output` is a file for single inputs, or a directory when it ends in a
    /// path separator or already exists as one. With no `output`, results land
    /// next to their input.
    pub fn new(output: Option<&str>, extension: &'static str) -> Self {
        let (target_dir, target_file) = match output {
            Some(o) => {
                let path = PathBuf::from(o);
                if o.ends_with('/') || o.ends_with('\\') || path.is_dir() {
                    (Some(path), None)
                } else {
                    (None, Some(path))
                }
            }
            None => (None, None),
        };
        Self {
            target_dir,
            target_file,
            extension,
        }
    }

    /// Resolve the output path for a given input file.
    pub fn resolve(&self, input: &Path, input_count: usize) -> anyhow::Result<PathBuf> {
        let output = if let Some(ref target) = self.target_file {
            if input_count > 1 {
                bail!("-o with a file path only works for a single input file (got {input_count})");
            }
            target.clone()
        } else {
            let dir = match self.target_dir {
                Some(ref dir) => dir.as_path(),
                None => input.parent().unwrap_or(Path::new(".")),
            };
            dir.join(self.output_filename(input))
        };

        if let (Ok(ci), Ok(co)) = (input.canonicalize(), output.canonicalize()) {
            if ci == co {
                bail!("output would overwrite input: {}", input.display());
            }
        }
        Ok(output)
    }

    fn output_filename(&self, input: &Path) -> String {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        format!("{stem}.{}", self.extension)
    }

    /// Create parent directories for the output path.
    pub fn ensure_parent(output: &Path) -> anyhow::Result<()> {
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating directory: {}", parent.display()))?;
            }
        }
        Ok(())
    }
}
