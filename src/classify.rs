use crate::utils::paths;

/// How a file's changes are captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffType {
    /// Line-level diff into a patch document.
    Text,
    /// Raw copy on content mismatch.
    Binary,
}

/// The chain's verdict for one relative path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Ignore,
    Diff(DiffType),
}

/// One link in the classification chain. A provider may set either output;
/// leaving both untouched defers to the rest of the chain.
pub trait DiffTypeProvider: Send + Sync {
    fn classify(
        &self,
        relative_path: &str,
        diff_type: &mut Option<DiffType>,
        ignore: &mut Option<bool>,
    );
}

/// Ordered chain of providers. `ignore` is first-writer-wins and an ignore
/// verdict short-circuits the rest of the chain; `diff_type` is
/// last-writer-wins, so later providers may override earlier ones.
#[derive(Default)]
pub struct Classifier {
    providers: Vec<Box<dyn DiffTypeProvider>>,
}

impl Classifier {
    pub fn new() -> Self {
        Classifier {
            providers: Vec::new(),
        }
    }

    /// The stock chain: skip excluded directories, then map common
    /// extensions.
    pub fn with_defaults() -> Self {
        Self::new()
            .with(IgnoreCommonDirectories)
            .with(CommonFileTypes::new())
    }

    pub fn with(mut self, provider: impl DiffTypeProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Run the chain. `None` means no provider reached a decision, which
    /// callers treat as a configuration error for the whole run.
    pub fn classify(&self, relative_path: &str) -> Option<Classification> {
        let mut diff_type: Option<DiffType> = None;
        let mut ignore: Option<bool> = None;

        for provider in &self.providers {
            let mut provider_diff_type = diff_type;
            let mut provider_ignore = ignore;
            provider.classify(relative_path, &mut provider_diff_type, &mut provider_ignore);

            if provider_diff_type.is_some() {
                diff_type = provider_diff_type;
            }
            if ignore.is_none() {
                ignore = provider_ignore;
            }
            if ignore == Some(true) {
                return Some(Classification::Ignore);
            }
        }

        diff_type.map(Classification::Diff)
    }
}

/// Ignores anything under a version-control or build directory.
pub struct IgnoreCommonDirectories;

impl DiffTypeProvider for IgnoreCommonDirectories {
    fn classify(
        &self,
        relative_path: &str,
        _diff_type: &mut Option<DiffType>,
        ignore: &mut Option<bool>,
    ) {
        if paths::is_excluded(relative_path) {
            *ignore = Some(true);
        }
    }
}

/// Maps well-known extensions (and a few exact file names) to a diff type.
pub struct CommonFileTypes {
    text_extensions: Vec<&'static str>,
    binary_extensions: Vec<&'static str>,
    text_file_names: Vec<&'static str>,
}

impl CommonFileTypes {
    pub fn new() -> Self {
        CommonFileTypes {
            text_extensions: vec![
                "bat", "config", "cs", "csproj", "json", "md", "props", "resx", "rs", "sh",
                "targets", "toml", "txt", "xml", "yaml", "yml",
            ],
            binary_extensions: vec![
                "bin", "dat", "dll", "exe", "gif", "ico", "jpg", "pdb", "png",
            ],
            text_file_names: vec!["App.config", "Makefile"],
        }
    }
}

impl Default for CommonFileTypes {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffTypeProvider for CommonFileTypes {
    fn classify(
        &self,
        relative_path: &str,
        diff_type: &mut Option<DiffType>,
        _ignore: &mut Option<bool>,
    ) {
        let file_name = relative_path.rsplit('/').next().unwrap_or(relative_path);
        if self.text_file_names.contains(&file_name) {
            *diff_type = Some(DiffType::Text);
            return;
        }

        let extension = match file_name.rsplit_once('.') {
            Some((stem, extension)) if !stem.is_empty() => extension,
            _ => return,
        };
        if self.text_extensions.contains(&extension) {
            *diff_type = Some(DiffType::Text);
        } else if self.binary_extensions.contains(&extension) {
            *diff_type = Some(DiffType::Binary);
        }
    }
}
