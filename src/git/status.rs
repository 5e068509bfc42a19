//! Parsing for `git status --porcelain` and `git branch` output.

/// What happened to a file, from its two-letter porcelain code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Modified,
    Added,
    Deleted,
    Renamed,
    Copied,
    Unmerged,
    Untracked,
    Unknown,
}

impl StatusKind {
    pub fn from_code(code: &str) -> Self {
        if code == "??" {
            return Self::Untracked;
        }
        if code.contains('U') {
            return Self::Unmerged;
        }
        // "AM", "MM", " M": anything still modified in the worktree
        if code.ends_with('M') {
            return Self::Modified;
        }
        match code.trim_start().chars().next() {
            Some('M') => Self::Modified,
            Some('A') => Self::Added,
            Some('D') => Self::Deleted,
            Some('R') => Self::Renamed,
            Some('C') => Self::Copied,
            _ => Self::Unknown,
        }
    }
}

/// One line of porcelain status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub code: String,
    pub path: String,
}

impl StatusEntry {
    pub fn kind(&self) -> StatusKind {
        StatusKind::from_code(&self.code)
    }
}

/// Parse `git status --porcelain` output.
pub fn parse_porcelain(output: &str) -> Vec<StatusEntry> {
    output
        .lines()
        .filter(|line| line.len() > 3)
        .map(|line| StatusEntry {
            code: line.get(..2).unwrap_or_default().to_string(),
            path: line.get(3..).unwrap_or_default().to_string(),
        })
        .collect()
}

/// Which branches to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BranchScope {
    #[default]
    Local,
    Remote,
    All,
}

impl BranchScope {
    pub fn flag(self) -> Option<&'static str> {
        match self {
            Self::Local => None,
            Self::Remote => Some("-r"),
            Self::All => Some("-a"),
        }
    }
}

/// One line of `git branch` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchEntry {
    pub name: String,
    pub current: bool,
    pub remote: bool,
}

/// Parse `git branch` output listed with `scope`.
pub fn parse_branches(output: &str, scope: BranchScope) -> Vec<BranchEntry> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        // `origin/HEAD -> origin/main` is a symbolic ref, not a branch
        .filter(|line| !line.contains(" -> "))
        .map(|line| {
            let current = line.starts_with('*');
            let name = line.trim_start_matches('*').trim();
            let remote = scope == BranchScope::Remote || name.starts_with("remotes/");
            BranchEntry {
                name: name.trim_start_matches("remotes/").to_string(),
                current,
                remote,
            }
        })
        .collect()
}
